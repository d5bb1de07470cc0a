//! Rejestr: a REST+JSON journal backend.
//!
//! One adapter per endpoint; all of them share one [`RejestrClient`] per
//! account. Ordering matters — dictionaries sync before anything that
//! references teacher or subject ids.

pub mod client;
pub mod mapper;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, Utc};

use crate::error::Result;
use crate::models::endpoint::{EndpointId, DAY, SYNC_ALWAYS};
use crate::providers::{EndpointAdapter, EndpointBatch, FetchContext};
use crate::removal::{DataRemoveModel, TimetableRemove};

use self::client::RejestrClient;
use self::mapper::RejestrMapper;
use self::models::{
    Envelope, WireEvent, WireGrade, WireGradeSummary, WireLesson, WireMessage, WireSubject,
    WireTeacher,
};

pub const ENDPOINT_REJESTR_DICTIONARIES: EndpointId = 1010;
pub const ENDPOINT_REJESTR_TIMETABLE: EndpointId = 1020;
pub const ENDPOINT_REJESTR_GRADES: EndpointId = 1030;
pub const ENDPOINT_REJESTR_GRADE_SUMMARY: EndpointId = 1040;
pub const ENDPOINT_REJESTR_EVENTS: EndpointId = 1050;
pub const ENDPOINT_REJESTR_HOMEWORK: EndpointId = 1060;
pub const ENDPOINT_REJESTR_MESSAGES_INBOX: EndpointId = 1070;

/// The provider's endpoint set, in sync order.
pub fn endpoints(client: &Arc<RejestrClient>) -> Vec<Box<dyn EndpointAdapter>> {
    vec![
        Box::new(DictionariesEndpoint::new(Arc::clone(client))),
        Box::new(TimetableEndpoint::new(Arc::clone(client))),
        Box::new(GradesEndpoint::new(Arc::clone(client))),
        Box::new(GradeSummaryEndpoint::new(Arc::clone(client))),
        Box::new(EventsEndpoint::events(Arc::clone(client))),
        Box::new(EventsEndpoint::homework(Arc::clone(client))),
        Box::new(MessagesInboxEndpoint::new(Arc::clone(client))),
    ]
}

fn student_param(ctx: &FetchContext<'_>) -> (&'static str, String) {
    (
        "IdUczen",
        ctx.profile
            .student_data_str("studentId")
            .unwrap_or_default()
            .to_string(),
    )
}

pub struct DictionariesEndpoint {
    client: Arc<RejestrClient>,
}

impl DictionariesEndpoint {
    pub fn new(client: Arc<RejestrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointAdapter for DictionariesEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        ENDPOINT_REJESTR_DICTIONARIES
    }

    fn name(&self) -> &'static str {
        "dictionaries"
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        let teachers: Envelope<WireTeacher> = self
            .client
            .get(ctx.session, "/api/slowniki/nauczyciele", &[])
            .await?;
        let subjects: Envelope<WireSubject> = self
            .client
            .get(ctx.session, "/api/slowniki/przedmioty", &[])
            .await?;

        let mut batch = EndpointBatch::new();
        batch.teachers = RejestrMapper::map_teachers(ctx.profile.id, teachers.data);
        batch.subjects = RejestrMapper::map_subjects(ctx.profile.id, subjects.data);
        batch.next_sync = 4 * DAY;
        Ok(batch)
    }
}

pub struct TimetableEndpoint {
    client: Arc<RejestrClient>,
}

impl TimetableEndpoint {
    pub fn new(client: Arc<RejestrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointAdapter for TimetableEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        ENDPOINT_REJESTR_TIMETABLE
    }

    fn name(&self) -> &'static str {
        "timetable"
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        // Current and next school week; the removal clears exactly the
        // fetched window so moved lessons disappear.
        let today = Local::now().date_naive();
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let sunday = monday + Duration::days(13);

        let lessons: Envelope<WireLesson> = self
            .client
            .get(
                ctx.session,
                "/api/plan-lekcji",
                &[
                    ("DataPoczatkowa", monday.format("%Y-%m-%d").to_string()),
                    ("DataKoncowa", sunday.format("%Y-%m-%d").to_string()),
                    student_param(ctx),
                ],
            )
            .await?;

        let mut batch = EndpointBatch::new();
        batch.timetable = RejestrMapper::map_timetable(ctx.profile.id, lessons.data);
        batch
            .removals
            .push(DataRemoveModel::Timetable(TimetableRemove::between(
                monday, sunday,
            )));
        batch.next_sync = SYNC_ALWAYS;
        Ok(batch)
    }
}

pub struct GradesEndpoint {
    client: Arc<RejestrClient>,
}

impl GradesEndpoint {
    pub fn new(client: Arc<RejestrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointAdapter for GradesEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        ENDPOINT_REJESTR_GRADES
    }

    fn name(&self) -> &'static str {
        "grades"
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        let grades: Envelope<WireGrade> = self
            .client
            .get(
                ctx.session,
                "/api/oceny",
                &[
                    ("IdOkres", ctx.profile.current_semester.to_string()),
                    student_param(ctx),
                ],
            )
            .await?;

        let (grades, metadata, removals) =
            RejestrMapper::map_grades(ctx.profile, grades.data, Utc::now());
        let mut batch = EndpointBatch::new();
        batch.grades = grades;
        batch.metadata = metadata;
        batch.removals = removals;
        batch.next_sync = SYNC_ALWAYS;
        Ok(batch)
    }
}

pub struct GradeSummaryEndpoint {
    client: Arc<RejestrClient>,
}

impl GradeSummaryEndpoint {
    pub fn new(client: Arc<RejestrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointAdapter for GradeSummaryEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        ENDPOINT_REJESTR_GRADE_SUMMARY
    }

    fn name(&self) -> &'static str {
        "grade-summary"
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        let summary: Envelope<WireGradeSummary> = self
            .client
            .get(
                ctx.session,
                "/api/oceny/podsumowanie",
                &[
                    ("IdOkres", ctx.profile.current_semester.to_string()),
                    student_param(ctx),
                ],
            )
            .await?;

        let (grades, metadata, removals) =
            RejestrMapper::map_grade_summary(ctx.profile, summary.data, Utc::now());
        let mut batch = EndpointBatch::new();
        batch.grades = grades;
        batch.metadata = metadata;
        batch.removals = removals;
        batch.next_sync = DAY;
        Ok(batch)
    }
}

pub struct EventsEndpoint {
    client: Arc<RejestrClient>,
    homework: bool,
}

impl EventsEndpoint {
    pub fn events(client: Arc<RejestrClient>) -> Self {
        Self {
            client,
            homework: false,
        }
    }

    pub fn homework(client: Arc<RejestrClient>) -> Self {
        Self {
            client,
            homework: true,
        }
    }
}

#[async_trait]
impl EndpointAdapter for EventsEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        if self.homework {
            ENDPOINT_REJESTR_HOMEWORK
        } else {
            ENDPOINT_REJESTR_EVENTS
        }
    }

    fn name(&self) -> &'static str {
        if self.homework {
            "homework"
        } else {
            "events"
        }
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        // An empty profile backfills the whole semester; afterwards one
        // month of history is enough, the rest is already local.
        let semester = ctx.profile.current_semester;
        let today = Local::now().date_naive();
        let start = if ctx.profile.empty {
            ctx.profile.semester_start(semester)
        } else {
            today - Duration::days(30)
        };
        let end = ctx.profile.semester_end(semester);

        let path = if self.homework {
            "/api/zadania-domowe"
        } else {
            "/api/sprawdziany"
        };
        let events: Envelope<WireEvent> = self
            .client
            .get(
                ctx.session,
                path,
                &[
                    ("DataPoczatkowa", start.format("%Y-%m-%d").to_string()),
                    ("DataKoncowa", end.format("%Y-%m-%d").to_string()),
                    student_param(ctx),
                ],
            )
            .await?;

        let (events, metadata, removals) =
            RejestrMapper::map_events(ctx.profile, self.homework, events.data, Utc::now());
        let mut batch = EndpointBatch::new();
        batch.events = events;
        batch.metadata = metadata;
        batch.removals = removals;
        batch.next_sync = SYNC_ALWAYS;
        Ok(batch)
    }
}

pub struct MessagesInboxEndpoint {
    client: Arc<RejestrClient>,
}

impl MessagesInboxEndpoint {
    pub fn new(client: Arc<RejestrClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointAdapter for MessagesInboxEndpoint {
    fn endpoint_id(&self) -> EndpointId {
        ENDPOINT_REJESTR_MESSAGES_INBOX
    }

    fn name(&self) -> &'static str {
        "messages-inbox"
    }

    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<EndpointBatch> {
        let messages: Envelope<WireMessage> = self
            .client
            .get(ctx.session, "/api/wiadomosci/odebrane", &[student_param(ctx)])
            .await?;

        let (messages, recipients, metadata) =
            RejestrMapper::map_messages(ctx.profile, messages.data);
        let mut batch = EndpointBatch::new();
        batch.messages = messages;
        batch.recipients = recipients;
        batch.metadata = metadata;
        batch.next_sync = SYNC_ALWAYS;
        Ok(batch)
    }
}
