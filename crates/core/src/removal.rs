//! Declarative removal directives.
//!
//! A provider endpoint that re-fetches a whole category hands back one of
//! these alongside its fresh batch; the reconciler executes the directive
//! against committed rows *before* upserting the batch, so a full refresh
//! cannot leave stale rows behind.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::db::sqlite;
use crate::error::Result;
use crate::models::common::{EventType, GradeKind};

/// Removal predicate over timetable rows, by date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimetableRemove {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl TimetableRemove {
    pub fn from_date(date_from: NaiveDate) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: None,
        }
    }

    pub fn to_date(date_to: NaiveDate) -> Self {
        Self {
            date_from: None,
            date_to: Some(date_to),
        }
    }

    pub fn between(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
        }
    }

    async fn commit(&self, profile_id: i64, conn: &mut SqliteConnection) -> Result<u64> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => {
                sqlite::clear_timetable_between(conn, profile_id, from, to).await
            }
            (Some(from), None) => sqlite::clear_timetable_from(conn, profile_id, from).await,
            (None, Some(to)) => sqlite::clear_timetable_to(conn, profile_id, to).await,
            (None, None) => Ok(0),
        }
    }
}

/// Removal predicate over grade rows, by semester and/or kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradesRemove {
    all: bool,
    semester: Option<i32>,
    kind: Option<GradeKind>,
}

impl GradesRemove {
    pub fn all() -> Self {
        Self {
            all: true,
            semester: None,
            kind: None,
        }
    }

    pub fn all_with_type(kind: GradeKind) -> Self {
        Self {
            all: true,
            semester: None,
            kind: Some(kind),
        }
    }

    pub fn semester(semester: i32) -> Self {
        Self {
            all: false,
            semester: Some(semester),
            kind: None,
        }
    }

    pub fn semester_with_type(semester: i32, kind: GradeKind) -> Self {
        Self {
            all: false,
            semester: Some(semester),
            kind: Some(kind),
        }
    }

    async fn commit(&self, profile_id: i64, conn: &mut SqliteConnection) -> Result<u64> {
        let mut removed = 0;
        if self.all {
            removed += match self.kind {
                Some(kind) => sqlite::clear_grades_with_type(conn, profile_id, kind).await?,
                None => sqlite::clear_grades(conn, profile_id).await?,
            };
        }
        if let Some(semester) = self.semester {
            removed += match self.kind {
                Some(kind) => {
                    sqlite::clear_grades_for_semester_with_type(conn, profile_id, semester, kind)
                        .await?
                }
                None => sqlite::clear_grades_for_semester(conn, profile_id, semester).await?,
            };
        }
        Ok(removed)
    }
}

/// Removal predicate over *future* event rows. Past rows are never touched:
/// history is immutable once the date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventsRemove {
    with_type: Option<EventType>,
    except_type: Option<EventType>,
}

impl EventsRemove {
    /// Delete future rows of exactly this type.
    pub fn future_with_type(event_type: EventType) -> Self {
        Self {
            with_type: Some(event_type),
            except_type: None,
        }
    }

    /// Delete all future rows NOT of this type. Used to clear synthetic
    /// rows while preserving ones tagged with a protected type.
    pub fn future_except_type(event_type: EventType) -> Self {
        Self {
            with_type: None,
            except_type: Some(event_type),
        }
    }

    async fn commit(
        &self,
        profile_id: i64,
        today: NaiveDate,
        conn: &mut SqliteConnection,
    ) -> Result<u64> {
        let mut removed = 0;
        if let Some(t) = self.with_type {
            removed += sqlite::remove_future_events_with_type(conn, profile_id, today, t).await?;
        }
        if let Some(t) = self.except_type {
            removed += sqlite::remove_future_events_except_type(conn, profile_id, today, t).await?;
        }
        Ok(removed)
    }
}

/// A removal directive produced by a provider endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum DataRemoveModel {
    Timetable(TimetableRemove),
    Grades(GradesRemove),
    Events(EventsRemove),
}

impl DataRemoveModel {
    /// Execute the directive for one profile. Runs on the caller's
    /// connection so the reconciler can keep it inside the endpoint's
    /// transaction. Returns the number of rows deleted.
    pub async fn commit(
        &self,
        profile_id: i64,
        today: NaiveDate,
        conn: &mut SqliteConnection,
    ) -> Result<u64> {
        match self {
            DataRemoveModel::Timetable(t) => t.commit(profile_id, conn).await,
            DataRemoveModel::Grades(g) => g.commit(profile_id, conn).await,
            DataRemoveModel::Events(e) => e.commit(profile_id, today, conn).await,
        }
    }
}
