use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::{
    common::{EventType, GradeKind, MessageType, MetadataType},
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

use super::repository::{
    DictionaryRepository, EndpointTimerRepository, EventRepository, GradeRepository,
    JournalRepository, MessageRepository, MetadataRepository, ProfileRepository,
    SyncRunRepository, TimetableRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl JournalRepository for SqliteRepository {}

// -- Helper functions for mapping enums and JSON columns --

fn sync_status_to_str(s: &SyncStatus) -> &'static str {
    match s {
        SyncStatus::Running => "running",
        SyncStatus::Succeeded => "succeeded",
        SyncStatus::PartiallyFailed => "partially_failed",
        SyncStatus::Cancelled => "cancelled",
        SyncStatus::Failed => "failed",
    }
}

fn parse_sync_status(s: &str) -> SyncStatus {
    match s {
        "succeeded" => SyncStatus::Succeeded,
        "partially_failed" => SyncStatus::PartiallyFailed,
        "cancelled" => SyncStatus::Cancelled,
        "failed" => SyncStatus::Failed,
        _ => SyncStatus::Running,
    }
}

fn parse_json_map(s: &str) -> serde_json::Map<String, serde_json::Value> {
    serde_json::from_str(s).unwrap_or_default()
}

fn parse_outcomes(s: &str) -> Vec<EndpointOutcome> {
    serde_json::from_str(s).unwrap_or_default()
}

// -- Row mappers --

fn row_to_profile(r: &SqliteRow) -> Profile {
    Profile {
        id: r.get("id"),
        login_store_id: r.get("login_store_id"),
        name: r.get("name"),
        student_name_long: r.get("student_name_long"),
        student_name_short: r.get("student_name_short"),
        school_year_start: r.get("school_year_start"),
        semester2_start: r.get("semester2_start"),
        school_year_end: r.get("school_year_end"),
        current_semester: r.get("current_semester"),
        empty: r.get("empty"),
        student_data: parse_json_map(r.get("student_data")),
    }
}

fn row_to_teacher(r: &SqliteRow) -> Teacher {
    Teacher {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        name: r.get("name"),
        surname: r.get("surname"),
    }
}

fn row_to_subject(r: &SqliteRow) -> Subject {
    Subject {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        long_name: r.get("long_name"),
        short_name: r.get("short_name"),
    }
}

fn row_to_grade(r: &SqliteRow) -> Grade {
    Grade {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        kind: GradeKind::from_code(r.get("kind")),
        category: r.get("category"),
        color: r.get("color"),
        name: r.get("name"),
        value: r.get("value"),
        weight: r.get("weight"),
        semester: r.get("semester"),
        teacher_id: r.get("teacher_id"),
        subject_id: r.get("subject_id"),
    }
}

fn row_to_event(r: &SqliteRow) -> Event {
    Event {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        event_type: EventType::from_code(r.get("event_type")),
        date: r.get("date"),
        start_time: r.get("start_time"),
        topic: r.get("topic"),
        teacher_id: r.get("teacher_id"),
        subject_id: r.get("subject_id"),
        team_id: r.get("team_id"),
    }
}

fn row_to_timetable_entry(r: &SqliteRow) -> TimetableEntry {
    TimetableEntry {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        date: r.get("date"),
        start_time: r.get("start_time"),
        end_time: r.get("end_time"),
        subject_id: r.get("subject_id"),
        teacher_id: r.get("teacher_id"),
        team_id: r.get("team_id"),
        classroom: r.get("classroom"),
    }
}

fn row_to_message(r: &SqliteRow) -> Message {
    Message {
        profile_id: r.get("profile_id"),
        id: r.get("id"),
        message_type: MessageType::from_code(r.get("message_type")),
        subject: r.get("subject"),
        body: r.get("body"),
        sender_id: r.get("sender_id"),
        has_attachments: r.get("has_attachments"),
    }
}

fn row_to_recipient(r: &SqliteRow) -> MessageRecipient {
    MessageRecipient {
        profile_id: r.get("profile_id"),
        message_id: r.get("message_id"),
        recipient_id: r.get("recipient_id"),
        read_date: r.get("read_date"),
    }
}

fn row_to_metadata(r: &SqliteRow) -> Metadata {
    Metadata {
        profile_id: r.get("profile_id"),
        thing_type: MetadataType::from_code(r.get("thing_type")),
        thing_id: r.get("thing_id"),
        seen: r.get("seen"),
        notified: r.get("notified"),
        added_date: r.get("added_date"),
    }
}

fn row_to_sync_run(r: &SqliteRow) -> SyncRun {
    SyncRun {
        id: r.get("id"),
        profile_id: r.get("profile_id"),
        provider: r.get("provider"),
        status: parse_sync_status(r.get("status")),
        started_at: r.get("started_at"),
        completed_at: r.get("completed_at"),
        error_message: r.get("error_message"),
        outcomes: parse_outcomes(r.get("outcomes")),
    }
}

// -- Write helpers on a borrowed connection --
//
// The reconciler runs these inside one transaction per endpoint batch; the
// repository methods below reuse them on pooled connections.

pub(crate) async fn upsert_teacher(conn: &mut SqliteConnection, teacher: &Teacher) -> Result<()> {
    sqlx::query(
        "INSERT INTO teachers (profile_id, id, name, surname) VALUES (?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET name = excluded.name, surname = excluded.surname",
    )
    .bind(teacher.profile_id)
    .bind(teacher.id)
    .bind(&teacher.name)
    .bind(&teacher.surname)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn upsert_subject(conn: &mut SqliteConnection, subject: &Subject) -> Result<()> {
    sqlx::query(
        "INSERT INTO subjects (profile_id, id, long_name, short_name) VALUES (?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET
             long_name = excluded.long_name,
             short_name = COALESCE(excluded.short_name, subjects.short_name)",
    )
    .bind(subject.profile_id)
    .bind(subject.id)
    .bind(&subject.long_name)
    .bind(&subject.short_name)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn get_teacher_by_full_name(
    conn: &mut SqliteConnection,
    profile_id: i64,
    full_name: &str,
) -> Result<Option<Teacher>> {
    let row = sqlx::query(
        "SELECT * FROM teachers WHERE profile_id = ? AND name || ' ' || surname = ?",
    )
    .bind(profile_id)
    .bind(full_name)
    .fetch_optional(conn)
    .await?;
    Ok(row.as_ref().map(row_to_teacher))
}

pub(crate) async fn get_subject_by_name(
    conn: &mut SqliteConnection,
    profile_id: i64,
    long_name: &str,
) -> Result<Option<Subject>> {
    let row = sqlx::query("SELECT * FROM subjects WHERE profile_id = ? AND long_name = ?")
        .bind(profile_id)
        .bind(long_name)
        .fetch_optional(conn)
        .await?;
    Ok(row.as_ref().map(row_to_subject))
}

pub(crate) async fn upsert_grade(conn: &mut SqliteConnection, grade: &Grade) -> Result<()> {
    sqlx::query(
        "INSERT INTO grades (profile_id, id, kind, category, color, name, value, weight,
                             semester, teacher_id, subject_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET
             kind = excluded.kind,
             category = excluded.category,
             color = excluded.color,
             name = excluded.name,
             value = excluded.value,
             weight = excluded.weight,
             semester = excluded.semester,
             teacher_id = excluded.teacher_id,
             subject_id = excluded.subject_id",
    )
    .bind(grade.profile_id)
    .bind(grade.id)
    .bind(grade.kind.code())
    .bind(&grade.category)
    .bind(grade.color)
    .bind(&grade.name)
    .bind(grade.value)
    .bind(grade.weight)
    .bind(grade.semester)
    .bind(grade.teacher_id)
    .bind(grade.subject_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn upsert_event(conn: &mut SqliteConnection, event: &Event) -> Result<()> {
    sqlx::query(
        "INSERT INTO events (profile_id, id, event_type, date, start_time, topic,
                             teacher_id, subject_id, team_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET
             event_type = excluded.event_type,
             date = excluded.date,
             start_time = excluded.start_time,
             topic = excluded.topic,
             teacher_id = excluded.teacher_id,
             subject_id = excluded.subject_id,
             team_id = excluded.team_id",
    )
    .bind(event.profile_id)
    .bind(event.id)
    .bind(event.event_type.code())
    .bind(event.date)
    .bind(event.start_time)
    .bind(&event.topic)
    .bind(event.teacher_id)
    .bind(event.subject_id)
    .bind(event.team_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn upsert_timetable_entry(
    conn: &mut SqliteConnection,
    entry: &TimetableEntry,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO timetable (profile_id, id, date, start_time, end_time,
                                subject_id, teacher_id, team_id, classroom)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET
             date = excluded.date,
             start_time = excluded.start_time,
             end_time = excluded.end_time,
             subject_id = excluded.subject_id,
             teacher_id = excluded.teacher_id,
             team_id = excluded.team_id,
             classroom = excluded.classroom",
    )
    .bind(entry.profile_id)
    .bind(entry.id)
    .bind(entry.date)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(entry.subject_id)
    .bind(entry.teacher_id)
    .bind(entry.team_id)
    .bind(&entry.classroom)
    .execute(conn)
    .await?;
    Ok(())
}

/// Upsert a message. A stored body survives a body-less upsert: inbox
/// listings never carry the body, and it is never re-derived once fetched.
pub(crate) async fn upsert_message(conn: &mut SqliteConnection, message: &Message) -> Result<()> {
    sqlx::query(
        "INSERT INTO messages (profile_id, id, message_type, subject, body,
                               sender_id, has_attachments)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (profile_id, id) DO UPDATE SET
             message_type = excluded.message_type,
             subject = excluded.subject,
             body = COALESCE(excluded.body, messages.body),
             sender_id = excluded.sender_id,
             has_attachments = excluded.has_attachments",
    )
    .bind(message.profile_id)
    .bind(message.id)
    .bind(message.message_type.code())
    .bind(&message.subject)
    .bind(&message.body)
    .bind(message.sender_id)
    .bind(message.has_attachments)
    .execute(conn)
    .await?;
    Ok(())
}

/// Upsert a recipient row. `read_date` only moves forward so a backend
/// listing that momentarily reports unread cannot regress a read receipt.
pub(crate) async fn upsert_recipient(
    conn: &mut SqliteConnection,
    recipient: &MessageRecipient,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO message_recipients (profile_id, message_id, recipient_id, read_date)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (profile_id, message_id, recipient_id) DO UPDATE SET
             read_date = MAX(message_recipients.read_date, excluded.read_date)",
    )
    .bind(recipient.profile_id)
    .bind(recipient.message_id)
    .bind(recipient.recipient_id)
    .bind(recipient.read_date)
    .execute(conn)
    .await?;
    Ok(())
}

pub(crate) async fn get_metadata(
    conn: &mut SqliteConnection,
    profile_id: i64,
    thing_type: MetadataType,
    thing_id: i64,
) -> Result<Option<Metadata>> {
    let row = sqlx::query(
        "SELECT * FROM metadata WHERE profile_id = ? AND thing_type = ? AND thing_id = ?",
    )
    .bind(profile_id)
    .bind(thing_type.code())
    .bind(thing_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.as_ref().map(row_to_metadata))
}

pub(crate) async fn replace_metadata(
    conn: &mut SqliteConnection,
    metadata: &Metadata,
) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO metadata (profile_id, thing_type, thing_id, seen, notified, added_date)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(metadata.profile_id)
    .bind(metadata.thing_type.code())
    .bind(metadata.thing_id)
    .bind(metadata.seen)
    .bind(metadata.notified)
    .bind(metadata.added_date)
    .execute(conn)
    .await?;
    Ok(())
}

// -- Removal helpers, called by the DataRemoveModel directives --

pub(crate) async fn clear_grades(conn: &mut SqliteConnection, profile_id: i64) -> Result<u64> {
    let res = sqlx::query("DELETE FROM grades WHERE profile_id = ?")
        .bind(profile_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_grades_with_type(
    conn: &mut SqliteConnection,
    profile_id: i64,
    kind: GradeKind,
) -> Result<u64> {
    let res = sqlx::query("DELETE FROM grades WHERE profile_id = ? AND kind = ?")
        .bind(profile_id)
        .bind(kind.code())
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_grades_for_semester(
    conn: &mut SqliteConnection,
    profile_id: i64,
    semester: i32,
) -> Result<u64> {
    let res = sqlx::query("DELETE FROM grades WHERE profile_id = ? AND semester = ?")
        .bind(profile_id)
        .bind(semester)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_grades_for_semester_with_type(
    conn: &mut SqliteConnection,
    profile_id: i64,
    semester: i32,
    kind: GradeKind,
) -> Result<u64> {
    let res =
        sqlx::query("DELETE FROM grades WHERE profile_id = ? AND semester = ? AND kind = ?")
            .bind(profile_id)
            .bind(semester)
            .bind(kind.code())
            .execute(conn)
            .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_timetable_from(
    conn: &mut SqliteConnection,
    profile_id: i64,
    date_from: NaiveDate,
) -> Result<u64> {
    let res = sqlx::query("DELETE FROM timetable WHERE profile_id = ? AND date >= ?")
        .bind(profile_id)
        .bind(date_from)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_timetable_to(
    conn: &mut SqliteConnection,
    profile_id: i64,
    date_to: NaiveDate,
) -> Result<u64> {
    let res = sqlx::query("DELETE FROM timetable WHERE profile_id = ? AND date <= ?")
        .bind(profile_id)
        .bind(date_to)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn clear_timetable_between(
    conn: &mut SqliteConnection,
    profile_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<u64> {
    let res =
        sqlx::query("DELETE FROM timetable WHERE profile_id = ? AND date >= ? AND date <= ?")
            .bind(profile_id)
            .bind(date_from)
            .bind(date_to)
            .execute(conn)
            .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn remove_future_events_with_type(
    conn: &mut SqliteConnection,
    profile_id: i64,
    today: NaiveDate,
    event_type: EventType,
) -> Result<u64> {
    let res = sqlx::query(
        "DELETE FROM events WHERE profile_id = ? AND date >= ? AND event_type = ?",
    )
    .bind(profile_id)
    .bind(today)
    .bind(event_type.code())
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

pub(crate) async fn remove_future_events_except_type(
    conn: &mut SqliteConnection,
    profile_id: i64,
    today: NaiveDate,
    event_type: EventType,
) -> Result<u64> {
    let res = sqlx::query(
        "DELETE FROM events WHERE profile_id = ? AND date >= ? AND event_type != ?",
    )
    .bind(profile_id)
    .bind(today)
    .bind(event_type.code())
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

// -- Repository trait implementations --

#[async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let student_data = serde_json::Value::Object(profile.student_data.clone()).to_string();
        sqlx::query(
            "INSERT INTO profiles (id, login_store_id, name, student_name_long, student_name_short,
                                   school_year_start, semester2_start, school_year_end,
                                   current_semester, empty, student_data)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 login_store_id = excluded.login_store_id,
                 name = excluded.name,
                 student_name_long = excluded.student_name_long,
                 student_name_short = excluded.student_name_short,
                 school_year_start = excluded.school_year_start,
                 semester2_start = excluded.semester2_start,
                 school_year_end = excluded.school_year_end,
                 current_semester = excluded.current_semester,
                 empty = excluded.empty,
                 student_data = excluded.student_data",
        )
        .bind(profile.id)
        .bind(profile.login_store_id)
        .bind(&profile.name)
        .bind(&profile.student_name_long)
        .bind(&profile.student_name_short)
        .bind(profile.school_year_start)
        .bind(profile.semester2_start)
        .bind(profile.school_year_end)
        .bind(profile.current_semester)
        .bind(profile.empty)
        .bind(student_data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, id: i64) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let rows = sqlx::query("SELECT * FROM profiles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn set_profile_empty(&self, id: i64, empty: bool) -> Result<()> {
        sqlx::query("UPDATE profiles SET empty = ? WHERE id = ?")
            .bind(empty)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DictionaryRepository for SqliteRepository {
    async fn upsert_teacher(&self, teacher: &Teacher) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_teacher(&mut conn, teacher).await
    }

    async fn get_teacher(&self, profile_id: i64, id: i64) -> Result<Option<Teacher>> {
        let row = sqlx::query("SELECT * FROM teachers WHERE profile_id = ? AND id = ?")
            .bind(profile_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_teacher))
    }

    async fn get_teacher_by_full_name(
        &self,
        profile_id: i64,
        full_name: &str,
    ) -> Result<Option<Teacher>> {
        let mut conn = self.pool.acquire().await?;
        get_teacher_by_full_name(&mut conn, profile_id, full_name).await
    }

    async fn list_teachers(&self, profile_id: i64) -> Result<Vec<Teacher>> {
        let rows = sqlx::query("SELECT * FROM teachers WHERE profile_id = ? ORDER BY surname, name")
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_teacher).collect())
    }

    async fn upsert_subject(&self, subject: &Subject) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_subject(&mut conn, subject).await
    }

    async fn get_subject(&self, profile_id: i64, id: i64) -> Result<Option<Subject>> {
        let row = sqlx::query("SELECT * FROM subjects WHERE profile_id = ? AND id = ?")
            .bind(profile_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_subject))
    }

    async fn get_subject_by_name(
        &self,
        profile_id: i64,
        long_name: &str,
    ) -> Result<Option<Subject>> {
        let mut conn = self.pool.acquire().await?;
        get_subject_by_name(&mut conn, profile_id, long_name).await
    }

    async fn list_subjects(&self, profile_id: i64) -> Result<Vec<Subject>> {
        let rows = sqlx::query("SELECT * FROM subjects WHERE profile_id = ? ORDER BY long_name")
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_subject).collect())
    }
}

#[async_trait]
impl GradeRepository for SqliteRepository {
    async fn upsert_grade(&self, grade: &Grade) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_grade(&mut conn, grade).await
    }

    async fn get_grade(&self, profile_id: i64, id: i64) -> Result<Option<Grade>> {
        let row = sqlx::query("SELECT * FROM grades WHERE profile_id = ? AND id = ?")
            .bind(profile_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_grade))
    }

    async fn list_grades(&self, profile_id: i64) -> Result<Vec<Grade>> {
        let rows = sqlx::query("SELECT * FROM grades WHERE profile_id = ? ORDER BY id")
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_grade).collect())
    }
}

#[async_trait]
impl EventRepository for SqliteRepository {
    async fn upsert_event(&self, event: &Event) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_event(&mut conn, event).await
    }

    async fn get_event(&self, profile_id: i64, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT * FROM events WHERE profile_id = ? AND id = ?")
            .bind(profile_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_event))
    }

    async fn list_events(&self, profile_id: i64) -> Result<Vec<Event>> {
        let rows =
            sqlx::query("SELECT * FROM events WHERE profile_id = ? ORDER BY date, start_time")
                .bind(profile_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(row_to_event).collect())
    }
}

#[async_trait]
impl TimetableRepository for SqliteRepository {
    async fn upsert_timetable_entry(&self, entry: &TimetableEntry) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_timetable_entry(&mut conn, entry).await
    }

    async fn list_timetable_between(
        &self,
        profile_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<TimetableEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM timetable WHERE profile_id = ? AND date >= ? AND date <= ?
             ORDER BY date, start_time",
        )
        .bind(profile_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_timetable_entry).collect())
    }
}

#[async_trait]
impl MessageRepository for SqliteRepository {
    async fn upsert_message(&self, message: &Message) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_message(&mut conn, message).await
    }

    async fn get_message(&self, profile_id: i64, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query("SELECT * FROM messages WHERE profile_id = ? AND id = ?")
            .bind(profile_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_message))
    }

    async fn list_messages(
        &self,
        profile_id: i64,
        message_type: MessageType,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE profile_id = ? AND message_type = ? ORDER BY id DESC",
        )
        .bind(profile_id)
        .bind(message_type.code())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_message).collect())
    }

    async fn upsert_recipient(&self, recipient: &MessageRecipient) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_recipient(&mut conn, recipient).await
    }

    async fn list_recipients(
        &self,
        profile_id: i64,
        message_id: i64,
    ) -> Result<Vec<MessageRecipient>> {
        let rows = sqlx::query(
            "SELECT * FROM message_recipients WHERE profile_id = ? AND message_id = ?
             ORDER BY recipient_id",
        )
        .bind(profile_id)
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_recipient).collect())
    }
}

#[async_trait]
impl MetadataRepository for SqliteRepository {
    async fn get_metadata(
        &self,
        profile_id: i64,
        thing_type: MetadataType,
        thing_id: i64,
    ) -> Result<Option<Metadata>> {
        let mut conn = self.pool.acquire().await?;
        get_metadata(&mut conn, profile_id, thing_type, thing_id).await
    }

    async fn upsert_metadata(&self, metadata: &Metadata) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        replace_metadata(&mut conn, metadata).await
    }

    async fn set_seen(
        &self,
        profile_id: i64,
        thing_type: MetadataType,
        thing_id: i64,
        seen: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE metadata SET seen = ? WHERE profile_id = ? AND thing_type = ? AND thing_id = ?",
        )
        .bind(seen)
        .bind(profile_id)
        .bind(thing_type.code())
        .bind(thing_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_unseen(&self, profile_id: i64, thing_type: MetadataType) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM metadata WHERE profile_id = ? AND thing_type = ? AND seen = 0",
        )
        .bind(profile_id)
        .bind(thing_type.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl EndpointTimerRepository for SqliteRepository {
    async fn set_sync_next(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
        now: DateTime<Utc>,
        delay: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO endpoint_timers (profile_id, endpoint_id, next_sync)
             VALUES (?, ?, ?)",
        )
        .bind(profile_id)
        .bind(endpoint_id)
        .bind(now + Duration::seconds(delay))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_timer(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
    ) -> Result<Option<EndpointTimer>> {
        let row = sqlx::query(
            "SELECT * FROM endpoint_timers WHERE profile_id = ? AND endpoint_id = ?",
        )
        .bind(profile_id)
        .bind(endpoint_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| EndpointTimer {
            profile_id: r.get("profile_id"),
            endpoint_id: r.get("endpoint_id"),
            next_sync: r.get("next_sync"),
        }))
    }

    async fn is_due(
        &self,
        profile_id: i64,
        endpoint_id: EndpointId,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        match self.get_timer(profile_id, endpoint_id).await? {
            Some(timer) => Ok(timer.is_due(now)),
            None => Ok(true),
        }
    }
}

#[async_trait]
impl SyncRunRepository for SqliteRepository {
    async fn create_sync_run(&self, profile_id: i64, provider: &str) -> Result<SyncRun> {
        let started_at = Utc::now();
        let res = sqlx::query(
            "INSERT INTO sync_runs (profile_id, provider, status, started_at, outcomes)
             VALUES (?, ?, ?, ?, '[]')",
        )
        .bind(profile_id)
        .bind(provider)
        .bind(sync_status_to_str(&SyncStatus::Running))
        .bind(started_at)
        .execute(&self.pool)
        .await?;
        Ok(SyncRun {
            id: res.last_insert_rowid(),
            profile_id,
            provider: provider.to_string(),
            status: SyncStatus::Running,
            started_at,
            completed_at: None,
            error_message: None,
            outcomes: Vec::new(),
        })
    }

    async fn finish_sync_run(
        &self,
        id: i64,
        status: SyncStatus,
        error_message: Option<&str>,
        outcomes: &[EndpointOutcome],
    ) -> Result<()> {
        let outcomes_json = serde_json::to_string(outcomes).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            "UPDATE sync_runs SET status = ?, completed_at = ?, error_message = ?, outcomes = ?
             WHERE id = ?",
        )
        .bind(sync_status_to_str(&status))
        .bind(Utc::now())
        .bind(error_message)
        .bind(outcomes_json)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_sync_run(&self, id: i64) -> Result<Option<SyncRun>> {
        let row = sqlx::query("SELECT * FROM sync_runs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }

    async fn get_latest_sync_run(&self, profile_id: i64) -> Result<Option<SyncRun>> {
        let row = sqlx::query(
            "SELECT * FROM sync_runs WHERE profile_id = ? ORDER BY started_at DESC, id DESC LIMIT 1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }
}
