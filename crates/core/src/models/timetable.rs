use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One timetable lesson, keyed by (profile_id, id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub profile_id: i64,
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classroom: Option<String>,
}
