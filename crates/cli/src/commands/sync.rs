use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use satchel_core::config::{ProviderKind, SatchelConfig};
use satchel_core::db::repository::ProfileRepository;
use satchel_core::db::DatabasePool;
use satchel_core::models::sync::{EndpointStatus, SyncStatus};
use satchel_core::providers::rejestr::client::{RejestrClient, RejestrLogin};
use satchel_core::providers::rejestr;
use satchel_core::providers::LoginCoordinator;
use satchel_core::sync::{CancelFlag, SyncEngine};
use tracing::{error, info, warn};

/// Run the `sync` command: one pass per configured account.
pub async fn run(config_path: &str, dry_run: bool) -> anyhow::Result<()> {
    let config = SatchelConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    if config.accounts.is_empty() {
        warn!("No accounts configured");
        println!("No accounts configured. Add [[accounts]] entries to your config file first.");
        return Ok(());
    }

    let path = config
        .satchel
        .database
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
    let connect_str = format!("sqlite:{}?mode=rwc", path);
    let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite(&connect_str).await?;
    info!("Connected to database");

    let engine = SyncEngine::new(pool, config.sync.options());

    for (index, account) in config.accounts.iter().enumerate() {
        let profile_id = (index + 1) as i64;
        let login_store = account.login_store(profile_id);

        let (login, endpoints) = match account.provider {
            ProviderKind::Rejestr => {
                let client = Arc::new(RejestrClient::new(&account.base_url));
                let login = RejestrLogin::new(&account.base_url);
                (login, rejestr::endpoints(&client))
            }
            ref other => {
                warn!(account = %account.name, provider = ?other, "Provider not yet supported");
                println!(
                    "Skipping {}: provider {:?} is not yet supported",
                    account.name, other
                );
                continue;
            }
        };

        if dry_run {
            println!("Testing login for {} ({})...", account.name, account.base_url);
            match login.authenticate(&login_store).await {
                Ok(_) => {
                    println!("  Login test: SUCCESS");
                    info!(account = %account.name, "Dry run login test passed");
                }
                Err(e) => {
                    println!("  Login test: FAILED - {e}");
                    error!(account = %account.name, "Dry run login test failed: {e}");
                }
            }
            continue;
        }

        // The profile row survives across passes; the bootstrap placeholder
        // is only written when the account has never synced.
        let profile = match engine.repo().get_profile(profile_id).await? {
            Some(existing) => existing,
            None => {
                let bootstrap = account.bootstrap_profile(profile_id, profile_id);
                engine.repo().upsert_profile(&bootstrap).await?;
                bootstrap
            }
        };

        println!("Syncing {}...", account.name);
        let start = Instant::now();
        match engine
            .sync_profile(&profile, &login_store, &login, &endpoints, &CancelFlag::new())
            .await
        {
            Ok(run) => {
                let duration = start.elapsed();
                let label = match run.status {
                    SyncStatus::Succeeded => "completed",
                    SyncStatus::PartiallyFailed => "partially failed",
                    SyncStatus::Cancelled => "cancelled",
                    SyncStatus::Failed => "failed",
                    SyncStatus::Running => "still running",
                };
                println!("Sync {} in {:.1}s", label, duration.as_secs_f64());
                println!(
                    "  Endpoints: {} ok, {} failed",
                    run.succeeded_count(),
                    run.failed_count()
                );
                for outcome in &run.outcomes {
                    if outcome.status == EndpointStatus::Failed {
                        println!(
                            "  Failed:    {} - {}",
                            outcome.name,
                            outcome.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                if let Some(err) = &run.error_message {
                    println!("  Error:     {err}");
                }
            }
            Err(e) => {
                error!(account = %account.name, "Sync failed: {e}");
                println!("Sync failed for {}: {e}", account.name);
                return Err(e.into());
            }
        }
    }

    Ok(())
}
