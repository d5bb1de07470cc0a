//! The merge engine.
//!
//! Takes one endpoint's staged [`EndpointBatch`] and turns it into store
//! mutations inside a single transaction: removal directives run first,
//! dictionary natural keys resolve to rows (created on first sight), then
//! entities upsert with monotonic seen/notified merging. Any failure rolls
//! the whole endpoint batch back.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::db::sqlite;
use crate::error::{Result, SyncError};
use crate::models::common::MetadataType;
use crate::models::dictionary::{Subject, Teacher};
use crate::models::metadata::Metadata;
use crate::models::profile::Profile;
use crate::providers::EndpointBatch;

/// How metadata flags fold into existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// seen/notified only move false→true; first-sight added_date wins.
    #[default]
    Monotonic,
    /// Incoming metadata overwrites as given. Used when a record is being
    /// recreated locally, e.g. the user marked it unread.
    ResetMetadata,
}

/// Row counts from one applied batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    pub removed: u64,
    pub grades: usize,
    pub events: usize,
    pub timetable: usize,
    pub messages: usize,
    pub recipients: usize,
}

impl ApplyStats {
    pub fn upserted(&self) -> usize {
        self.grades + self.events + self.timetable + self.messages + self.recipients
    }
}

pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply a batch for one profile. All-or-nothing: on error the
    /// transaction rolls back and the endpoint counts as failed.
    pub async fn apply(
        &self,
        profile: &Profile,
        batch: EndpointBatch,
        mode: MergeMode,
    ) -> Result<ApplyStats> {
        self.apply_at(profile, batch, mode, Local::now().date_naive(), Utc::now())
            .await
    }

    /// [`Reconciler::apply`] with an explicit clock, so removal windows and
    /// added_date defaults are testable.
    pub async fn apply_at(
        &self,
        profile: &Profile,
        batch: EndpointBatch,
        mode: MergeMode,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ApplyStats> {
        let EndpointBatch {
            teachers,
            subjects,
            grades,
            events,
            timetable,
            messages,
            recipients,
            metadata,
            removals,
            next_sync: _,
        } = batch;

        let mut tx = self.pool.begin().await?;
        let mut stats = ApplyStats::default();

        // Removal always runs before the upserts of the same batch, so a
        // full-refresh endpoint replaces its category without leftovers.
        for removal in &removals {
            stats.removed += removal.commit(profile.id, today, &mut tx).await?;
        }

        let mut resolver = DictionaryResolver::new(profile.id);
        for teacher in &teachers {
            resolver.seed_teacher(teacher);
            sqlite::upsert_teacher(&mut tx, teacher).await?;
        }
        for subject in &subjects {
            resolver.seed_subject(subject);
            sqlite::upsert_subject(&mut tx, subject).await?;
        }

        // Adapter-supplied metadata, keyed so each upsert below can claim
        // its row; leftovers merge at the end.
        let mut staged: HashMap<(i32, i64), Metadata> = metadata
            .into_iter()
            .map(|m| ((m.thing_type.code(), m.thing_id), m))
            .collect();

        for draft in grades {
            let mut grade = draft.entity;
            grade.profile_id = profile.id;
            if let Some(name) = &draft.teacher_name {
                grade.teacher_id = resolver.teacher_id(&mut tx, name).await?;
            }
            if let Some(name) = &draft.subject_name {
                grade.subject_id = resolver.subject_id(&mut tx, name).await?;
            }
            sqlite::upsert_grade(&mut tx, &grade).await?;
            let incoming = staged.remove(&(MetadataType::Grade.code(), grade.id));
            merge_metadata(&mut tx, profile, mode, MetadataType::Grade, grade.id, incoming, now)
                .await?;
            stats.grades += 1;
        }

        for draft in events {
            let mut event = draft.entity;
            event.profile_id = profile.id;
            if let Some(name) = &draft.teacher_name {
                event.teacher_id = resolver.teacher_id(&mut tx, name).await?;
            }
            if let Some(name) = &draft.subject_name {
                event.subject_id = resolver.subject_id(&mut tx, name).await?;
            }
            sqlite::upsert_event(&mut tx, &event).await?;
            let thing_type = event.event_type.metadata_type();
            let incoming = staged.remove(&(thing_type.code(), event.id));
            merge_metadata(&mut tx, profile, mode, thing_type, event.id, incoming, now).await?;
            stats.events += 1;
        }

        for draft in timetable {
            let mut entry = draft.entity;
            entry.profile_id = profile.id;
            if let Some(name) = &draft.teacher_name {
                entry.teacher_id = resolver.teacher_id(&mut tx, name).await?;
            }
            if let Some(name) = &draft.subject_name {
                entry.subject_id = resolver.subject_id(&mut tx, name).await?;
            }
            sqlite::upsert_timetable_entry(&mut tx, &entry).await?;
            stats.timetable += 1;
        }

        for mut message in messages {
            message.profile_id = profile.id;
            sqlite::upsert_message(&mut tx, &message).await?;
            let incoming = staged.remove(&(MetadataType::Message.code(), message.id));
            merge_metadata(
                &mut tx,
                profile,
                mode,
                MetadataType::Message,
                message.id,
                incoming,
                now,
            )
            .await?;
            stats.messages += 1;
        }

        for mut recipient in recipients {
            recipient.profile_id = profile.id;
            sqlite::upsert_recipient(&mut tx, &recipient).await?;
            stats.recipients += 1;
        }

        // Metadata rows with no entity in this batch (lesson changes,
        // read-state-only refreshes) still merge.
        for ((_, _), mut incoming) in staged {
            incoming.profile_id = profile.id;
            merge_metadata(
                &mut tx,
                profile,
                mode,
                incoming.thing_type,
                incoming.thing_id,
                Some(incoming),
                now,
            )
            .await?;
        }

        tx.commit().await?;
        debug!(
            profile_id = profile.id,
            removed = stats.removed,
            upserted = stats.upserted(),
            "Applied endpoint batch"
        );
        Ok(stats)
    }
}

/// Lazily resolves dictionary natural keys inside one batch transaction.
///
/// The cache is seeded from the batch's own dictionary rows and from the
/// store; a miss creates the row with an id derived from the name, so every
/// sync and every device agrees on the id.
struct DictionaryResolver {
    profile_id: i64,
    teachers: HashMap<String, i64>,
    subjects: HashMap<String, i64>,
}

impl DictionaryResolver {
    fn new(profile_id: i64) -> Self {
        Self {
            profile_id,
            teachers: HashMap::new(),
            subjects: HashMap::new(),
        }
    }

    fn seed_teacher(&mut self, teacher: &Teacher) {
        self.teachers.insert(teacher.full_name(), teacher.id);
    }

    fn seed_subject(&mut self, subject: &Subject) {
        self.subjects.insert(subject.long_name.clone(), subject.id);
    }

    async fn teacher_id(&mut self, conn: &mut SqliteConnection, full_name: &str) -> Result<i64> {
        if let Some(id) = self.teachers.get(full_name) {
            return Ok(*id);
        }
        let id = match sqlite::get_teacher_by_full_name(conn, self.profile_id, full_name).await? {
            Some(existing) => existing.id,
            None => {
                let teacher = Teacher::from_full_name(self.profile_id, full_name);
                sqlite::upsert_teacher(conn, &teacher).await.map_err(|e| {
                    SyncError::Reconcile(format!("failed to create teacher {full_name:?}: {e}"))
                })?;
                teacher.id
            }
        };
        self.teachers.insert(full_name.to_string(), id);
        Ok(id)
    }

    async fn subject_id(&mut self, conn: &mut SqliteConnection, long_name: &str) -> Result<i64> {
        if let Some(id) = self.subjects.get(long_name) {
            return Ok(*id);
        }
        let id = match sqlite::get_subject_by_name(conn, self.profile_id, long_name).await? {
            Some(existing) => existing.id,
            None => {
                let subject = Subject::from_name(self.profile_id, long_name);
                sqlite::upsert_subject(conn, &subject).await.map_err(|e| {
                    SyncError::Reconcile(format!("failed to create subject {long_name:?}: {e}"))
                })?;
                subject.id
            }
        };
        self.subjects.insert(long_name.to_string(), id);
        Ok(id)
    }
}

/// Fold one record's metadata into the store.
///
/// A row fetched without explicit metadata defaults to the profile's
/// bootstrap state: an empty profile imports everything pre-seen so the
/// first sync does not spawn synthetic unread badges.
async fn merge_metadata(
    conn: &mut SqliteConnection,
    profile: &Profile,
    mode: MergeMode,
    thing_type: MetadataType,
    thing_id: i64,
    incoming: Option<Metadata>,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut incoming = incoming.unwrap_or_else(|| {
        Metadata::new(
            profile.id,
            thing_type,
            thing_id,
            profile.empty,
            profile.empty,
            now,
        )
    });
    incoming.profile_id = profile.id;
    incoming.thing_type = thing_type;
    incoming.thing_id = thing_id;

    match sqlite::get_metadata(conn, profile.id, thing_type, thing_id).await? {
        Some(mut existing) if mode == MergeMode::Monotonic => {
            existing.merge(&incoming);
            sqlite::replace_metadata(conn, &existing).await
        }
        _ => sqlite::replace_metadata(conn, &incoming).await,
    }
}
