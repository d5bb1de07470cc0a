use serde::{Deserialize, Serialize};

use super::common::MessageType;

/// The recipient id marking "recipient exists but is not materialized".
///
/// Inbox listings know a message has a recipient (the student) before the
/// full recipient list is ever fetched; the placeholder row keeps the
/// read-state somewhere until then.
pub const RECIPIENT_PLACEHOLDER: i64 = -1;

/// One message, keyed by (profile_id, id).
///
/// `body` is `None` until the message is opened; inbox listings never carry
/// it. Once stored, a body survives later body-less syncs — it may embed a
/// marker consumed downstream and is never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub profile_id: i64,
    pub id: i64,
    pub message_type: MessageType,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub sender_id: i64,
    pub has_attachments: bool,
}

/// Read-state of a message for one recipient.
///
/// `read_date` is epoch milliseconds; 0 means unread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecipient {
    pub profile_id: i64,
    pub message_id: i64,
    pub recipient_id: i64,
    pub read_date: i64,
}

impl MessageRecipient {
    /// A placeholder row for a message whose recipients are not materialized.
    pub fn placeholder(profile_id: i64, message_id: i64) -> Self {
        Self {
            profile_id,
            message_id,
            recipient_id: RECIPIENT_PLACEHOLDER,
            read_date: 0,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_date > 0
    }
}
