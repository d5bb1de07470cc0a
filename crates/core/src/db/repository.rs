use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{
    common::{MessageType, MetadataType},
    dictionary::{Subject, Teacher},
    endpoint::{EndpointId, EndpointTimer},
    event::Event,
    grade::Grade,
    message::{Message, MessageRecipient},
    metadata::Metadata,
    profile::Profile,
    sync::{EndpointOutcome, SyncRun, SyncStatus},
    timetable::TimetableEntry,
};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;
    async fn get_profile(&self, id: i64) -> Result<Option<Profile>>;
    async fn list_profiles(&self) -> Result<Vec<Profile>>;
    /// Clears (or sets) the bootstrap placeholder flag.
    async fn set_profile_empty(&self, id: i64, empty: bool) -> Result<()>;
}

#[async_trait]
pub trait DictionaryRepository: Send + Sync {
    async fn upsert_teacher(&self, teacher: &Teacher) -> Result<()>;
    async fn get_teacher(&self, profile_id: i64, id: i64) -> Result<Option<Teacher>>;
    async fn get_teacher_by_full_name(
        &self,
        profile_id: i64,
        full_name: &str,
    ) -> Result<Option<Teacher>>;
    async fn list_teachers(&self, profile_id: i64) -> Result<Vec<Teacher>>;
    async fn upsert_subject(&self, subject: &Subject) -> Result<()>;
    async fn get_subject(&self, profile_id: i64, id: i64) -> Result<Option<Subject>>;
    async fn get_subject_by_name(
        &self,
        profile_id: i64,
        long_name: &str,
    ) -> Result<Option<Subject>>;
    async fn list_subjects(&self, profile_id: i64) -> Result<Vec<Subject>>;
}

#[async_trait]
pub trait GradeRepository: Send + Sync {
    async fn upsert_grade(&self, grade: &Grade) -> Result<()>;
    async fn get_grade(&self, profile_id: i64, id: i64) -> Result<Option<Grade>>;
    async fn list_grades(&self, profile_id: i64) -> Result<Vec<Grade>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn upsert_event(&self, event: &Event) -> Result<()>;
    async fn get_event(&self, profile_id: i64, id: i64) -> Result<Option<Event>>;
    async fn list_events(&self, profile_id: i64) -> Result<Vec<Event>>;
}

#[async_trait]
pub trait TimetableRepository: Send + Sync {
    async fn upsert_timetable_entry(&self, entry: &TimetableEntry) -> Result<()>;
    async fn list_timetable_between(
        &self,
        profile_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<TimetableEntry>>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn upsert_message(&self, message: &Message) -> Result<()>;
    async fn get_message(&self, profile_id: i64, id: i64) -> Result<Option<Message>>;
    async fn list_messages(
        &self,
        profile_id: i64,
        message_type: MessageType,
    ) -> Result<Vec<Message>>;
    async fn upsert_recipient(&self, recipient: &MessageRecipient) -> Result<()>;
    async fn list_recipients(
        &self,
        profile_id: i64,
        message_id: i64,
    ) -> Result<Vec<MessageRecipient>>;
}

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn get_metadata(
        &self,
        profile_id: i64,
        thing_type: MetadataType,
        thing_id: i64,
    ) -> Result<Option<Metadata>>;
    /// Overwrites the row as given; monotonic merging is the reconciler's
    /// concern, this is the raw store operation.
    async fn upsert_metadata(&self, metadata: &Metadata) -> Result<()>;
    /// Explicit local read-state change (user marks a thing read/unread).
    async fn set_seen(
        &self,
        profile_id: i64,
        thing_type: MetadataType,
        thing_id: i64,
        seen: bool,
    ) -> Result<()>;
    async fn count_unseen(&self, profile_id: i64, thing_type: MetadataType) -> Result<i64>;
}

#[async_trait]
pub trait EndpointTimerRepository: Send + Sync {
    /// Persist "this endpoint may not sync again before now + delay".
    async fn set_sync_next(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
        now: DateTime<Utc>,
        delay: i64,
    ) -> Result<()>;
    async fn get_timer(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
    ) -> Result<Option<EndpointTimer>>;
    /// An endpoint with no recorded timer is always due.
    async fn is_due(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}

#[async_trait]
pub trait SyncRunRepository: Send + Sync {
    async fn create_sync_run(&self, profile_id: i64, provider: &str) -> Result<SyncRun>;
    async fn finish_sync_run(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
        outcomes: &[EndpointOutcome],
    ) -> Result<()>;
    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>>;
    async fn get_latest_sync_run(&self, profile_id: i64) -> Result<Option<SyncRun>>;
}

/// Combined repository trait for all entity types.
pub trait JournalRepository:
    ProfileRepository
    + DictionaryRepository
    + GradeRepository
    + EventRepository
    + TimetableRepository
    + MessageRepository
    + MetadataRepository
    + EndpointTimerRepository
    + SyncRunRepository
{
}
