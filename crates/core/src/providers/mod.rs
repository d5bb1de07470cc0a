//! Provider adapter contracts.
//!
//! One [`EndpointAdapter`] exists per (provider, endpoint) pair. Adapters
//! are handed an already-authenticated [`Session`] and return an
//! [`EndpointBatch`] value; they never write to the store themselves, which
//! is what keeps per-endpoint commits atomic.

pub mod rejestr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::dictionary::{Subject, Teacher};
use crate::models::endpoint::{EndpointId, SYNC_ALWAYS};
use crate::models::event::Event;
use crate::models::grade::Grade;
use crate::models::message::{Message, MessageRecipient};
use crate::models::metadata::Metadata;
use crate::models::profile::Profile;
use crate::models::timetable::TimetableEntry;
use crate::removal::DataRemoveModel;

/// Stored credentials for one account, opaque to the engine.
#[derive(Debug, Clone)]
pub struct LoginStore {
    pub id: i64,
    pub provider: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl LoginStore {
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// An authenticated provider session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The opaque login capability. Concrete flows (token endpoints, scraped
/// login forms) live with their provider; the engine only calls this once
/// per pass, before any endpoint adapter runs.
#[async_trait]
pub trait LoginCoordinator: Send + Sync {
    async fn authenticate(&self, store: &LoginStore) -> Result<Session>;
}

/// An entity plus the dictionary natural keys it was fetched with.
///
/// Backends without numeric teacher/subject ids hand over names; the
/// reconciler resolves (and creates) the dictionary rows and substitutes
/// the resulting ids before commit.
#[derive(Debug, Clone)]
pub struct Draft<T> {
    pub entity: T,
    pub teacher_name: Option<String>,
    pub subject_name: Option<String>,
}

impl<T> Draft<T> {
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            teacher_name: None,
            subject_name: None,
        }
    }

    pub fn with_teacher(mut self, full_name: impl Into<String>) -> Self {
        self.teacher_name = Some(full_name.into());
        self
    }

    pub fn with_subject(mut self, long_name: impl Into<String>) -> Self {
        self.subject_name = Some(long_name.into());
        self
    }
}

impl<T> From<T> for Draft<T> {
    fn from(entity: T) -> Self {
        Draft::new(entity)
    }
}

/// Everything one endpoint fetch produced, staged for reconciliation.
#[derive(Debug, Default)]
pub struct EndpointBatch {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Draft<Grade>>,
    pub events: Vec<Draft<Event>>,
    pub timetable: Vec<Draft<TimetableEntry>>,
    pub messages: Vec<Message>,
    pub recipients: Vec<MessageRecipient>,
    pub metadata: Vec<Metadata>,
    pub removals: Vec<DataRemoveModel>,
    /// Seconds until this endpoint is due again; [`SYNC_ALWAYS`] by default.
    pub next_sync: i64,
}

impl EndpointBatch {
    pub fn new() -> Self {
        Self {
            next_sync: SYNC_ALWAYS,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
            && self.subjects.is_empty()
            && self.grades.is_empty()
            && self.events.is_empty()
            && self.timetable.is_empty()
            && self.messages.is_empty()
            && self.recipients.is_empty()
            && self.metadata.is_empty()
            && self.removals.is_empty()
    }
}

/// Per-fetch context handed to adapters.
pub struct FetchContext<'a> {
    pub session: &'a Session,
    pub profile: &'a Profile,
    /// Start of the last successful pass, when one exists. Adapters may use
    /// it to narrow their queries; full-refresh endpoints ignore it.
    pub since: Option<DateTime<Utc>>,
}

/// One fetchable data category of one provider backend.
#[async_trait]
pub trait EndpointAdapter: Send + Sync {
    fn endpoint_id(&self) -> EndpointId;
    fn name(&self) -> &'static str;
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch>;
}
