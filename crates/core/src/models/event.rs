use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::common::EventType;

/// One calendar event (homework, exam, quiz...), keyed by (profile_id, id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub profile_id: i64,
    pub id: i64,
    pub event_type: EventType,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    pub topic: String,
    pub teacher_id: i64,
    pub subject_id: i64,
    pub team_id: i64,
}

impl Event {
    /// Whether the event lies on or after the given day. Past events are
    /// immutable history and are never touched by removal directives.
    pub fn is_future(&self, today: NaiveDate) -> bool {
        self.date >= today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            profile_id: 1,
            id: 777,
            event_type: EventType::Exam,
            date: NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 50, 0),
            topic: "Równania kwadratowe".to_string(),
            teacher_id: 17,
            subject_id: 42,
            team_id: 3,
        }
    }

    #[test]
    fn event_round_trip() {
        let event = sample_event();
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn event_without_time_omits_field() {
        let mut event = sample_event();
        event.start_time = None;
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("startTime"));
    }

    #[test]
    fn is_future_includes_today() {
        let event = sample_event();
        assert!(event.is_future(NaiveDate::from_ymd_opt(2025, 10, 3).unwrap()));
        assert!(event.is_future(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()));
        assert!(!event.is_future(NaiveDate::from_ymd_opt(2025, 10, 4).unwrap()));
    }
}
