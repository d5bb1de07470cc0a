use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::MetadataType;

/// Per-record read/notification state, keyed by
/// (profile_id, thing_type, thing_id) and kept separate from record content.
///
/// `seen` and `notified` only move false→true under a merge; flipping them
/// back requires an explicit reset (a user marking something unread).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub profile_id: i64,
    pub thing_type: MetadataType,
    pub thing_id: i64,
    pub seen: bool,
    pub notified: bool,
    pub added_date: DateTime<Utc>,
}

impl Metadata {
    pub fn new(
        profile_id: i64,
        thing_type: MetadataType,
        thing_id: i64,
        seen: bool,
        notified: bool,
        added_date: DateTime<Utc>,
    ) -> Self {
        Self {
            profile_id,
            thing_type,
            thing_id,
            seen,
            notified,
            added_date,
        }
    }

    /// Fold a freshly fetched row into this one. Flags only move forward;
    /// the first-sight added_date wins.
    pub fn merge(&mut self, incoming: &Metadata) {
        self.seen = self.seen || incoming.seen;
        self.notified = self.notified || incoming.notified;
    }
}
