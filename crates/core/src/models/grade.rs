use serde::{Deserialize, Serialize};

use super::common::GradeKind;

/// One grade row, keyed by (profile_id, id).
///
/// Proposed and final grades have no backend id of their own; their ids are
/// derived from the subject so that every sync overwrites the same row
/// instead of inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub profile_id: i64,
    pub id: i64,
    pub kind: GradeKind,
    pub category: String,
    pub color: i32,
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub semester: i32,
    pub teacher_id: i64,
    pub subject_id: i64,
}

impl Grade {
    /// Synthetic id of the proposed grade for a subject: `-(subjectId) - 1`.
    pub fn proposed_id(subject_id: i64) -> i64 {
        -subject_id - 1
    }

    /// Synthetic id of the final grade for a subject: `-(subjectId) - 2`.
    pub fn final_id(subject_id: i64) -> i64 {
        -subject_id - 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grade() -> Grade {
        Grade {
            profile_id: 1,
            id: 9001,
            kind: GradeKind::Normal,
            category: "sprawdzian".to_string(),
            color: 0xFF4CAF50u32 as i32,
            name: "5".to_string(),
            value: 5.0,
            weight: 3.0,
            semester: 1,
            teacher_id: 17,
            subject_id: 42,
        }
    }

    #[test]
    fn synthetic_ids_are_deterministic() {
        assert_eq!(Grade::proposed_id(42), -43);
        assert_eq!(Grade::final_id(42), -44);
        // Two consecutive syncs derive the same row key.
        assert_eq!(Grade::proposed_id(42), Grade::proposed_id(42));
    }

    #[test]
    fn synthetic_ids_never_collide_between_subjects() {
        assert_ne!(Grade::proposed_id(1), Grade::final_id(1));
        assert_ne!(Grade::proposed_id(2), Grade::final_id(1));
    }

    #[test]
    fn grade_round_trip() {
        let grade = sample_grade();
        let json = serde_json::to_string(&grade).unwrap();
        let back: Grade = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grade);
    }

    #[test]
    fn grade_camel_case_fields() {
        let json = serde_json::to_string(&sample_grade()).unwrap();
        assert!(json.contains("\"profileId\""));
        assert!(json.contains("\"teacherId\""));
        assert!(json.contains("\"subjectId\""));
    }
}
