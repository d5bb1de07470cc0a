//! Enums shared across the journal entity model.
//!
//! Every enum carries a stable integer code: the code is what providers put
//! on the wire and what the store persists, so variants must never be
//! renumbered.

use serde::{Deserialize, Serialize};

/// Kind of a grade row. Proposed/final kinds use synthetic negative ids
/// derived from the subject, see [`crate::models::grade::Grade`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GradeKind {
    Normal,
    Semester1Proposed,
    Semester1Final,
    Semester2Proposed,
    Semester2Final,
    YearProposed,
    YearFinal,
}

impl GradeKind {
    pub fn code(&self) -> i32 {
        match self {
            GradeKind::Normal => 0,
            GradeKind::Semester1Proposed => 1,
            GradeKind::Semester1Final => 2,
            GradeKind::Semester2Proposed => 3,
            GradeKind::Semester2Final => 4,
            GradeKind::YearProposed => 5,
            GradeKind::YearFinal => 6,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => GradeKind::Semester1Proposed,
            2 => GradeKind::Semester1Final,
            3 => GradeKind::Semester2Proposed,
            4 => GradeKind::Semester2Final,
            5 => GradeKind::YearProposed,
            6 => GradeKind::YearFinal,
            _ => GradeKind::Normal,
        }
    }

    /// The proposed-grade kind for the given semester.
    pub fn proposed_for_semester(semester: i32) -> Self {
        match semester {
            1 => GradeKind::Semester1Proposed,
            _ => GradeKind::Semester2Proposed,
        }
    }

    /// The final-grade kind for the given semester.
    pub fn final_for_semester(semester: i32) -> Self {
        match semester {
            1 => GradeKind::Semester1Final,
            _ => GradeKind::Semester2Final,
        }
    }
}

/// Kind of an event row; drives removal-predicate selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ClassEvent,
    Homework,
    Exam,
    ShortQuiz,
    Essay,
    Excursion,
    /// User-created rows; protected from `future_except_type` removals.
    Manual,
}

impl EventType {
    pub fn code(&self) -> i32 {
        match self {
            EventType::ClassEvent => 0,
            EventType::Homework => 1,
            EventType::Exam => 2,
            EventType::ShortQuiz => 3,
            EventType::Essay => 4,
            EventType::Excursion => 5,
            EventType::Manual => 9,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => EventType::Homework,
            2 => EventType::Exam,
            3 => EventType::ShortQuiz,
            4 => EventType::Essay,
            5 => EventType::Excursion,
            9 => EventType::Manual,
            _ => EventType::ClassEvent,
        }
    }

    /// The metadata bucket events of this type are tracked under.
    pub fn metadata_type(&self) -> MetadataType {
        match self {
            EventType::Homework => MetadataType::Homework,
            _ => MetadataType::Event,
        }
    }
}

/// Mailbox a message belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Received,
    Sent,
    Deleted,
    Draft,
}

impl MessageType {
    pub fn code(&self) -> i32 {
        match self {
            MessageType::Received => 0,
            MessageType::Sent => 1,
            MessageType::Deleted => 2,
            MessageType::Draft => 3,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => MessageType::Sent,
            2 => MessageType::Deleted,
            3 => MessageType::Draft,
            _ => MessageType::Received,
        }
    }
}

/// Entity kind a metadata row refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetadataType {
    Grade,
    Event,
    Homework,
    LessonChange,
    Message,
}

impl MetadataType {
    pub fn code(&self) -> i32 {
        match self {
            MetadataType::Grade => 1,
            MetadataType::Event => 2,
            MetadataType::Homework => 3,
            MetadataType::LessonChange => 4,
            MetadataType::Message => 5,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            2 => MetadataType::Event,
            3 => MetadataType::Homework,
            4 => MetadataType::LessonChange,
            5 => MetadataType::Message,
            _ => MetadataType::Grade,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_kind_codes_round_trip() {
        for kind in [
            GradeKind::Normal,
            GradeKind::Semester1Proposed,
            GradeKind::Semester1Final,
            GradeKind::Semester2Proposed,
            GradeKind::Semester2Final,
            GradeKind::YearProposed,
            GradeKind::YearFinal,
        ] {
            assert_eq!(GradeKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn grade_kind_unknown_code_falls_back_to_normal() {
        assert_eq!(GradeKind::from_code(42), GradeKind::Normal);
    }

    #[test]
    fn grade_kind_per_semester() {
        assert_eq!(
            GradeKind::proposed_for_semester(1),
            GradeKind::Semester1Proposed
        );
        assert_eq!(
            GradeKind::proposed_for_semester(2),
            GradeKind::Semester2Proposed
        );
        assert_eq!(GradeKind::final_for_semester(1), GradeKind::Semester1Final);
        assert_eq!(GradeKind::final_for_semester(2), GradeKind::Semester2Final);
    }

    #[test]
    fn event_type_codes_round_trip() {
        for t in [
            EventType::ClassEvent,
            EventType::Homework,
            EventType::Exam,
            EventType::ShortQuiz,
            EventType::Essay,
            EventType::Excursion,
            EventType::Manual,
        ] {
            assert_eq!(EventType::from_code(t.code()), t);
        }
    }

    #[test]
    fn homework_uses_its_own_metadata_bucket() {
        assert_eq!(EventType::Homework.metadata_type(), MetadataType::Homework);
        assert_eq!(EventType::Exam.metadata_type(), MetadataType::Event);
        assert_eq!(EventType::Manual.metadata_type(), MetadataType::Event);
    }

    #[test]
    fn message_type_codes_round_trip() {
        for t in [
            MessageType::Received,
            MessageType::Sent,
            MessageType::Deleted,
            MessageType::Draft,
        ] {
            assert_eq!(MessageType::from_code(t.code()), t);
        }
    }

    #[test]
    fn metadata_type_codes_round_trip() {
        for t in [
            MetadataType::Grade,
            MetadataType::Event,
            MetadataType::Homework,
            MetadataType::LessonChange,
            MetadataType::Message,
        ] {
            assert_eq!(MetadataType::from_code(t.code()), t);
        }
    }

    #[test]
    fn enum_serialization() {
        assert_eq!(
            serde_json::to_string(&GradeKind::Semester1Proposed).unwrap(),
            "\"semester1_proposed\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::ShortQuiz).unwrap(),
            "\"short_quiz\""
        );
        assert_eq!(
            serde_json::to_string(&MessageType::Received).unwrap(),
            "\"received\""
        );
    }
}
