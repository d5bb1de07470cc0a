//! TOML-based configuration for Satchel.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::models::profile::Profile;
use crate::providers::LoginStore;
use crate::sync::SyncOptions;

/// Top-level Satchel configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatchelConfig {
    pub satchel: SatchelSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Core instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatchelSection {
    pub instance_name: String,
    pub data_dir: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseDriver::default_driver")]
    pub driver: DatabaseDriver,
    /// SQLite file path (used when driver = "sqlite").
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            path: Some("/var/lib/satchel/satchel.db".into()),
        }
    }
}

/// Supported database drivers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseDriver {
    Sqlite,
}

impl DatabaseDriver {
    fn default_driver() -> Self {
        Self::Sqlite
    }
}

/// Sync engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_adapter_timeout_secs")]
    pub adapter_timeout_secs: u64,
    #[serde(default = "default_endpoint_retry_limit")]
    pub endpoint_retry_limit: u32,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: default_adapter_timeout_secs(),
            endpoint_retry_limit: default_endpoint_retry_limit(),
        }
    }
}

impl SyncSection {
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            adapter_timeout: Duration::from_secs(self.adapter_timeout_secs),
            endpoint_retry_limit: self.endpoint_retry_limit,
        }
    }
}

fn default_adapter_timeout_secs() -> u64 {
    30
}

fn default_endpoint_retry_limit() -> u32 {
    1
}

/// Supported journal providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Rejestr,
    Librus,
    Mobidziennik,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Rejestr => "rejestr",
            ProviderKind::Librus => "librus",
            ProviderKind::Mobidziennik => "mobidziennik",
        }
    }
}

/// One synced account: provider credentials plus the bootstrap facts a
/// profile needs before its first successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub student_name: String,
    pub school_year_start: NaiveDate,
    pub semester2_start: NaiveDate,
    pub school_year_end: NaiveDate,
    #[serde(default = "default_current_semester")]
    pub current_semester: i32,
}

fn default_current_semester() -> i32 {
    1
}

impl AccountConfig {
    /// The opaque credential store handed to the provider's login flow.
    pub fn login_store(&self, id: i64) -> LoginStore {
        let mut data = serde_json::Map::new();
        data.insert("baseUrl".into(), self.base_url.clone().into());
        data.insert("clientId".into(), self.client_id.clone().into());
        data.insert("clientSecret".into(), self.client_secret.clone().into());
        LoginStore {
            id,
            provider: self.provider.as_str().to_string(),
            data,
        }
    }

    /// The placeholder profile used before the first successful import.
    pub fn bootstrap_profile(&self, id: i64, login_store_id: i64) -> Profile {
        Profile {
            id,
            login_store_id,
            name: self.name.clone(),
            student_name_long: self.student_name.clone(),
            student_name_short: None,
            school_year_start: self.school_year_start,
            semester2_start: self.semester2_start,
            school_year_end: self.school_year_end,
            current_semester: self.current_semester,
            empty: true,
            student_data: serde_json::Map::new(),
        }
    }
}

impl SatchelConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.satchel.instance_name.is_empty() {
            return Err(SyncError::Config(
                "satchel.instance_name must not be empty".into(),
            ));
        }

        if self.satchel.data_dir.is_empty() {
            return Err(SyncError::Config(
                "satchel.data_dir must not be empty".into(),
            ));
        }

        if self.satchel.database.path.is_none() {
            return Err(SyncError::Config(
                "satchel.database.path is required when driver is sqlite".into(),
            ));
        }

        if self.sync.adapter_timeout_secs == 0 {
            return Err(SyncError::Config(
                "sync.adapter_timeout_secs must be positive".into(),
            ));
        }

        for account in &self.accounts {
            if account.name.is_empty() {
                return Err(SyncError::Config("accounts.name must not be empty".into()));
            }
            if account.provider == ProviderKind::Rejestr {
                if account.base_url.is_empty() {
                    return Err(SyncError::Config(format!(
                        "accounts.base_url is required for account {:?}",
                        account.name
                    )));
                }
                if account.client_id.is_empty() || account.client_secret.is_empty() {
                    return Err(SyncError::Config(format!(
                        "accounts.client_id and accounts.client_secret are required for account {:?}",
                        account.name
                    )));
                }
            }
            if account.school_year_start >= account.school_year_end {
                return Err(SyncError::Config(format!(
                    "school year bounds are inverted for account {:?}",
                    account.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            satchel: SatchelSection {
                instance_name: "My Satchel".into(),
                data_dir: "/var/lib/satchel".into(),
                database: DatabaseConfig::default(),
            },
            sync: SyncSection::default(),
            accounts: Vec::new(),
        }
    }
}
