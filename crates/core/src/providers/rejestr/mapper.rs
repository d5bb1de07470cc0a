use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::models::common::{EventType, GradeKind, MessageType, MetadataType};
use crate::models::dictionary::{Subject, Teacher};
use crate::models::event::Event;
use crate::models::grade::Grade;
use crate::models::message::{Message, MessageRecipient};
use crate::models::metadata::Metadata;
use crate::models::profile::Profile;
use crate::models::timetable::TimetableEntry;
use crate::providers::Draft;
use crate::removal::{DataRemoveModel, EventsRemove, GradesRemove};

use super::models::{
    WireEvent, WireGrade, WireGradeSummary, WireLesson, WireMessage, WireSubject, WireTeacher,
};

/// Maps Rejestr wire rows into journal entities. Rows the backend sends
/// malformed (bad dates, bad times) are dropped, matching how little the
/// rest of a sync pass can do about them.
pub struct RejestrMapper;

impl RejestrMapper {
    pub fn map_teachers(profile_id: i64, rows: Vec<WireTeacher>) -> Vec<Teacher> {
        rows.into_iter()
            .map(|t| Teacher {
                profile_id,
                id: t.id,
                name: t.name.trim().to_string(),
                surname: t.surname.trim().to_string(),
            })
            .collect()
    }

    pub fn map_subjects(profile_id: i64, rows: Vec<WireSubject>) -> Vec<Subject> {
        rows.into_iter()
            .map(|s| Subject {
                profile_id,
                id: s.id,
                long_name: s.name.trim().to_string(),
                short_name: s.short_name,
            })
            .collect()
    }

    /// Current-semester grades. The matching removal directive replaces the
    /// whole (semester, normal) slice so deleted backend rows disappear.
    pub fn map_grades(
        profile: &Profile,
        rows: Vec<WireGrade>,
        now: DateTime<Utc>,
    ) -> (Vec<Draft<Grade>>, Vec<Metadata>, Vec<DataRemoveModel>) {
        let mut grades = Vec::new();
        let mut metadata = Vec::new();
        for row in rows {
            let added_date = row
                .created_at
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or(now);
            grades.push(Draft::new(Grade {
                profile_id: profile.id,
                id: row.id,
                kind: GradeKind::Normal,
                category: row.category.unwrap_or_default(),
                color: row.color.unwrap_or(-1),
                name: row.entry.trim().to_string(),
                value: row.value,
                weight: row.weight,
                semester: profile.current_semester,
                teacher_id: row.teacher_id.unwrap_or(-1),
                subject_id: row.subject_id,
            }));
            metadata.push(Metadata::new(
                profile.id,
                MetadataType::Grade,
                row.id,
                profile.empty,
                profile.empty,
                added_date,
            ));
        }
        let removals = vec![DataRemoveModel::Grades(GradesRemove::semester_with_type(
            profile.current_semester,
            GradeKind::Normal,
        ))];
        (grades, metadata, removals)
    }

    /// Proposed/final summary rows. Synthetic ids are derived from the
    /// subject so every sync overwrites the same rows.
    pub fn map_grade_summary(
        profile: &Profile,
        rows: Vec<WireGradeSummary>,
        now: DateTime<Utc>,
    ) -> (Vec<Draft<Grade>>, Vec<Metadata>, Vec<DataRemoveModel>) {
        let semester = profile.current_semester;
        let proposed_kind = GradeKind::proposed_for_semester(semester);
        let final_kind = GradeKind::final_for_semester(semester);

        let mut grades = Vec::new();
        let mut metadata = Vec::new();
        for row in rows {
            let mut push = |id: i64, kind: GradeKind, entry: &str| {
                grades.push(Draft::new(Grade {
                    profile_id: profile.id,
                    id,
                    kind,
                    category: String::new(),
                    color: -1,
                    name: entry.trim().to_string(),
                    value: entry.trim().parse::<f64>().unwrap_or(0.0),
                    weight: 0.0,
                    semester,
                    teacher_id: -1,
                    subject_id: row.subject_id,
                }));
                metadata.push(Metadata::new(
                    profile.id,
                    MetadataType::Grade,
                    id,
                    profile.empty,
                    profile.empty,
                    now,
                ));
            };
            if let Some(proposed) = row.proposed.as_deref().filter(|s| !s.trim().is_empty()) {
                push(Grade::proposed_id(row.subject_id), proposed_kind, proposed);
            }
            if let Some(final_grade) = row.final_grade.as_deref().filter(|s| !s.trim().is_empty())
            {
                push(Grade::final_id(row.subject_id), final_kind, final_grade);
            }
        }

        let removals = vec![
            DataRemoveModel::Grades(GradesRemove::semester_with_type(semester, proposed_kind)),
            DataRemoveModel::Grades(GradesRemove::semester_with_type(semester, final_kind)),
        ];
        (grades, metadata, removals)
    }

    pub fn map_events(
        profile: &Profile,
        is_homework: bool,
        rows: Vec<WireEvent>,
        now: DateTime<Utc>,
    ) -> (Vec<Draft<Event>>, Vec<Metadata>, Vec<DataRemoveModel>) {
        let mut events = Vec::new();
        let mut metadata = Vec::new();
        for row in rows {
            let Some(date) = parse_date(&row.date) else {
                continue;
            };
            let event_type = if is_homework {
                EventType::Homework
            } else {
                match row.is_exam {
                    Some(false) => EventType::ShortQuiz,
                    _ => EventType::Exam,
                }
            };
            events.push(Draft::new(Event {
                profile_id: profile.id,
                id: row.id,
                event_type,
                date,
                start_time: None,
                topic: row.topic.unwrap_or_default(),
                teacher_id: row.teacher_id.unwrap_or(-1),
                subject_id: row.subject_id.unwrap_or(-1),
                team_id: row.team_id.unwrap_or(-1),
            }));
            metadata.push(Metadata::new(
                profile.id,
                event_type.metadata_type(),
                row.id,
                profile.empty,
                profile.empty,
                now,
            ));
        }

        let removals = if is_homework {
            vec![DataRemoveModel::Events(EventsRemove::future_with_type(
                EventType::Homework,
            ))]
        } else {
            vec![
                DataRemoveModel::Events(EventsRemove::future_with_type(EventType::Exam)),
                DataRemoveModel::Events(EventsRemove::future_with_type(EventType::ShortQuiz)),
            ]
        };
        (events, metadata, removals)
    }

    pub fn map_messages(
        profile: &Profile,
        rows: Vec<WireMessage>,
    ) -> (Vec<Message>, Vec<MessageRecipient>, Vec<Metadata>) {
        let mut messages = Vec::new();
        let mut recipients = Vec::new();
        let mut metadata = Vec::new();
        for row in rows {
            messages.push(Message {
                profile_id: profile.id,
                id: row.id,
                message_type: MessageType::Received,
                subject: row.subject.trim().to_string(),
                body: None,
                sender_id: row.sender_id.unwrap_or(-1),
                has_attachments: row.has_attachments,
            });
            recipients.push(MessageRecipient {
                profile_id: profile.id,
                message_id: row.id,
                recipient_id: -1,
                read_date: if row.read { row.sent_at } else { 0 },
            });
            metadata.push(Metadata::new(
                profile.id,
                MetadataType::Message,
                row.id,
                row.read,
                row.read || profile.empty,
                DateTime::from_timestamp_millis(row.sent_at).unwrap_or_else(Utc::now),
            ));
        }
        (messages, recipients, metadata)
    }

    pub fn map_timetable(profile_id: i64, rows: Vec<WireLesson>) -> Vec<Draft<TimetableEntry>> {
        let mut entries = Vec::new();
        for row in rows {
            let Some(date) = parse_date(&row.date) else {
                continue;
            };
            let (Some(start_time), Some(end_time)) =
                (parse_time(&row.start_time), parse_time(&row.end_time))
            else {
                continue;
            };
            let mut draft = Draft::new(TimetableEntry {
                profile_id,
                id: row.id,
                date,
                start_time,
                end_time,
                subject_id: row.subject_id.unwrap_or(-1),
                teacher_id: row.teacher_id.unwrap_or(-1),
                team_id: row.team_id.unwrap_or(-1),
                classroom: row.classroom,
            });
            // A stand-in teacher arrives as a bare name; the reconciler
            // creates the dictionary row for it.
            if row.teacher_id.is_none() {
                if let Some(name) = row.teacher_name.as_deref().filter(|n| !n.trim().is_empty()) {
                    draft = draft.with_teacher(name.trim());
                }
            }
            entries.push(draft);
        }
        entries
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(empty: bool) -> Profile {
        Profile {
            id: 1,
            login_store_id: 10,
            name: "Ania".to_string(),
            student_name_long: "Anna Nowak".to_string(),
            student_name_short: None,
            school_year_start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            semester2_start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            school_year_end: NaiveDate::from_ymd_opt(2026, 6, 26).unwrap(),
            current_semester: 1,
            empty,
            student_data: serde_json::Map::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 6, 0, 0).unwrap()
    }

    #[test]
    fn grades_map_with_removal_for_semester() {
        let rows = vec![WireGrade {
            id: 100,
            entry: " 4+ ".to_string(),
            value: 4.5,
            weight: 2.0,
            category: Some("sprawdzian".to_string()),
            color: Some(0x4CAF50),
            subject_id: 42,
            teacher_id: Some(17),
            created_at: Some(1_726_000_000_000),
        }];
        let (grades, metadata, removals) = RejestrMapper::map_grades(&profile(false), rows, now());

        assert_eq!(grades.len(), 1);
        let grade = &grades[0].entity;
        assert_eq!(grade.name, "4+");
        assert_eq!(grade.kind, GradeKind::Normal);
        assert_eq!(grade.semester, 1);
        assert_eq!(
            removals,
            vec![DataRemoveModel::Grades(GradesRemove::semester_with_type(
                1,
                GradeKind::Normal
            ))]
        );
        assert!(!metadata[0].seen);
        assert_eq!(
            metadata[0].added_date,
            DateTime::from_timestamp_millis(1_726_000_000_000).unwrap()
        );
    }

    #[test]
    fn empty_profile_grades_arrive_pre_seen() {
        let rows = vec![WireGrade {
            id: 100,
            entry: "4".to_string(),
            value: 4.0,
            weight: 1.0,
            category: None,
            color: None,
            subject_id: 42,
            teacher_id: None,
            created_at: None,
        }];
        let (_, metadata, _) = RejestrMapper::map_grades(&profile(true), rows, now());
        assert!(metadata[0].seen);
        assert!(metadata[0].notified);
        assert_eq!(metadata[0].added_date, now());
    }

    #[test]
    fn summary_derives_synthetic_ids() {
        let rows = vec![WireGradeSummary {
            subject_id: 42,
            proposed: Some("5".to_string()),
            final_grade: Some("4".to_string()),
        }];
        let (grades, _, removals) =
            RejestrMapper::map_grade_summary(&profile(false), rows, now());

        assert_eq!(grades.len(), 2);
        assert_eq!(grades[0].entity.id, -43);
        assert_eq!(grades[0].entity.kind, GradeKind::Semester1Proposed);
        assert_eq!(grades[0].entity.value, 5.0);
        assert_eq!(grades[1].entity.id, -44);
        assert_eq!(grades[1].entity.kind, GradeKind::Semester1Final);
        assert_eq!(removals.len(), 2);
    }

    #[test]
    fn summary_skips_blank_entries_and_handles_unparseable_values() {
        let rows = vec![
            WireGradeSummary {
                subject_id: 42,
                proposed: Some("  ".to_string()),
                final_grade: None,
            },
            WireGradeSummary {
                subject_id: 7,
                proposed: Some("celujący".to_string()),
                final_grade: None,
            },
        ];
        let (grades, _, _) = RejestrMapper::map_grade_summary(&profile(false), rows, now());
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].entity.name, "celujący");
        assert_eq!(grades[0].entity.value, 0.0);
    }

    #[test]
    fn events_map_kinds_and_removals() {
        let rows = vec![
            WireEvent {
                id: 1,
                date: "2025-10-03".to_string(),
                topic: Some("Dział 2".to_string()),
                is_exam: Some(true),
                subject_id: Some(42),
                teacher_id: Some(17),
                team_id: Some(3),
            },
            WireEvent {
                id: 2,
                date: "2025-10-06".to_string(),
                topic: None,
                is_exam: Some(false),
                subject_id: Some(42),
                teacher_id: None,
                team_id: None,
            },
            WireEvent {
                id: 3,
                date: "not-a-date".to_string(),
                topic: None,
                is_exam: None,
                subject_id: None,
                teacher_id: None,
                team_id: None,
            },
        ];
        let (events, metadata, removals) =
            RejestrMapper::map_events(&profile(false), false, rows, now());

        assert_eq!(events.len(), 2, "malformed rows are dropped");
        assert_eq!(events[0].entity.event_type, EventType::Exam);
        assert_eq!(events[1].entity.event_type, EventType::ShortQuiz);
        assert_eq!(metadata[0].thing_type, MetadataType::Event);
        assert_eq!(removals.len(), 2);
    }

    #[test]
    fn homework_uses_homework_type_and_metadata() {
        let rows = vec![WireEvent {
            id: 5,
            date: "2025-10-03".to_string(),
            topic: Some("Zadania 1-10".to_string()),
            is_exam: None,
            subject_id: Some(42),
            teacher_id: None,
            team_id: None,
        }];
        let (events, metadata, removals) =
            RejestrMapper::map_events(&profile(false), true, rows, now());

        assert_eq!(events[0].entity.event_type, EventType::Homework);
        assert_eq!(metadata[0].thing_type, MetadataType::Homework);
        assert_eq!(
            removals,
            vec![DataRemoveModel::Events(EventsRemove::future_with_type(
                EventType::Homework
            ))]
        );
    }

    #[test]
    fn messages_carry_read_state_into_recipient_and_metadata() {
        let rows = vec![
            WireMessage {
                id: 70,
                subject: "Zebranie".to_string(),
                sender_id: Some(17),
                read: true,
                sent_at: 1_726_000_000_000,
                has_attachments: false,
            },
            WireMessage {
                id: 71,
                subject: "Wycieczka".to_string(),
                sender_id: None,
                read: false,
                sent_at: 1_726_100_000_000,
                has_attachments: true,
            },
        ];
        let (messages, recipients, metadata) =
            RejestrMapper::map_messages(&profile(false), rows);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, None);
        assert_eq!(messages[1].sender_id, -1);
        assert_eq!(recipients[0].read_date, 1_726_000_000_000);
        assert_eq!(recipients[1].read_date, 0);
        assert!(metadata[0].seen);
        assert!(!metadata[1].seen);
        assert!(!metadata[1].notified);
    }

    #[test]
    fn unread_message_on_empty_profile_is_notified_but_not_seen() {
        let rows = vec![WireMessage {
            id: 70,
            subject: "Zebranie".to_string(),
            sender_id: Some(17),
            read: false,
            sent_at: 1_726_000_000_000,
            has_attachments: false,
        }];
        let (_, _, metadata) = RejestrMapper::map_messages(&profile(true), rows);
        assert!(!metadata[0].seen);
        assert!(metadata[0].notified);
    }

    #[test]
    fn timetable_resolves_stand_in_teacher_by_name() {
        let rows = vec![
            WireLesson {
                id: 1,
                date: "2025-09-15".to_string(),
                start_time: "08:00".to_string(),
                end_time: "08:45".to_string(),
                subject_id: Some(42),
                teacher_id: Some(17),
                teacher_name: None,
                team_id: Some(3),
                classroom: Some("s. 204".to_string()),
            },
            WireLesson {
                id: 2,
                date: "2025-09-15".to_string(),
                start_time: "08:55".to_string(),
                end_time: "09:40".to_string(),
                subject_id: Some(42),
                teacher_id: None,
                teacher_name: Some("Maria Zastępcza".to_string()),
                team_id: None,
                classroom: None,
            },
            WireLesson {
                id: 3,
                date: "2025-09-15".to_string(),
                start_time: "bad".to_string(),
                end_time: "10:35".to_string(),
                subject_id: None,
                teacher_id: None,
                teacher_name: None,
                team_id: None,
                classroom: None,
            },
        ];
        let entries = RejestrMapper::map_timetable(1, rows);

        assert_eq!(entries.len(), 2, "unparseable times are dropped");
        assert!(entries[0].teacher_name.is_none());
        assert_eq!(entries[1].teacher_name.as_deref(), Some("Maria Zastępcza"));
    }
}
