use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::endpoint::EndpointId;

/// Final state of a profile sync pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Succeeded,
    PartiallyFailed,
    Cancelled,
    /// The pass never got past login.
    Failed,
}

/// Outcome of one endpoint within a pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Succeeded,
    Failed,
    /// Not executed: drained after a fatal error, cancelled, or not yet due.
    Skipped,
}

/// Per-endpoint record inside a [`SyncRun`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointOutcome {
    pub endpoint_id: EndpointId,
    pub name: String,
    pub status: EndpointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retries: u32,
}

impl EndpointOutcome {
    pub fn succeeded(endpoint_id: EndpointId, name: &str, retries: u32) -> Self {
        Self {
            endpoint_id,
            name: name.to_string(),
            status: EndpointStatus::Succeeded,
            error: None,
            retries,
        }
    }

    pub fn failed(endpoint_id: EndpointId, name: &str, error: String, retries: u32) -> Self {
        Self {
            endpoint_id,
            name: name.to_string(),
            status: EndpointStatus::Failed,
            error: Some(error),
            retries,
        }
    }

    pub fn skipped(endpoint_id: EndpointId, name: &str) -> Self {
        Self {
            endpoint_id,
            name: name.to_string(),
            status: EndpointStatus::Skipped,
            error: None,
            retries: 0,
        }
    }
}

/// A record of a single profile sync pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: i64,
    pub profile_id: i64,
    pub provider: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub outcomes: Vec<EndpointOutcome>,
}

impl SyncRun {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == EndpointStatus::Succeeded)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == EndpointStatus::Failed)
            .count()
    }
}
