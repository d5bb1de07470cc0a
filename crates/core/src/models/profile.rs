use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One student/account being synced, possibly one of several under one
/// login.
///
/// `empty` marks a placeholder created before the first successful data
/// import; bootstrap data for an empty profile is stored pre-seen so the
/// first sync does not surface hundreds of synthetic unread badges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub login_store_id: i64,
    pub name: String,
    pub student_name_long: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name_short: Option<String>,
    pub school_year_start: NaiveDate,
    pub semester2_start: NaiveDate,
    pub school_year_end: NaiveDate,
    pub current_semester: i32,
    pub empty: bool,
    /// Per-provider opaque student identifiers (register ids, class ids...).
    #[serde(default)]
    pub student_data: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn semester_start(&self, semester: i32) -> NaiveDate {
        match semester {
            1 => self.school_year_start,
            _ => self.semester2_start,
        }
    }

    pub fn semester_end(&self, semester: i32) -> NaiveDate {
        match semester {
            1 => self.semester2_start.pred_opt().unwrap_or(self.semester2_start),
            _ => self.school_year_end,
        }
    }

    /// Convenience accessor for a string entry in `student_data`.
    pub fn student_data_str(&self, key: &str) -> Option<&str> {
        self.student_data.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        Profile {
            id: 1,
            login_store_id: 10,
            name: "Ania".to_string(),
            student_name_long: "Anna Nowak".to_string(),
            student_name_short: Some("A. Nowak".to_string()),
            school_year_start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            semester2_start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            school_year_end: NaiveDate::from_ymd_opt(2026, 6, 26).unwrap(),
            current_semester: 1,
            empty: true,
            student_data: serde_json::Map::new(),
        }
    }

    #[test]
    fn semester_bounds() {
        let profile = sample_profile();
        assert_eq!(
            profile.semester_start(1),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
        assert_eq!(
            profile.semester_end(1),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
        assert_eq!(
            profile.semester_start(2),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
        );
        assert_eq!(
            profile.semester_end(2),
            NaiveDate::from_ymd_opt(2026, 6, 26).unwrap()
        );
    }

    #[test]
    fn student_data_accessor() {
        let mut profile = sample_profile();
        profile
            .student_data
            .insert("studentId".into(), serde_json::Value::String("4721".into()));
        assert_eq!(profile.student_data_str("studentId"), Some("4721"));
        assert_eq!(profile.student_data_str("registerId"), None);
    }

    #[test]
    fn profile_round_trip() {
        let profile = sample_profile();
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn profile_without_student_data_parses() {
        let json = r#"{
            "id": 2, "loginStoreId": 10, "name": "Jaś",
            "studentNameLong": "Jan Nowak",
            "schoolYearStart": "2025-09-01",
            "semester2Start": "2026-02-01",
            "schoolYearEnd": "2026-06-26",
            "currentSemester": 1, "empty": true
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.student_data.is_empty());
        assert_eq!(profile.student_name_short, None);
    }
}
