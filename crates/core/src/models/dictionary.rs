//! Teacher and subject dictionaries.
//!
//! Backends that expose no numeric ids for these are handled by deriving a
//! stable id from the name, so the same name maps to the same row on every
//! sync and on every device.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a stable integer id from a dictionary natural key.
///
/// Uses SHA-256 for deterministic, cross-platform hashing (unlike
/// DefaultHasher which may vary across Rust versions and platforms).
pub fn stable_id(name: &str) -> i64 {
    let hash = Sha256::digest(name.as_bytes());
    let bytes: [u8; 8] = hash[..8].try_into().unwrap();
    i64::from_be_bytes(bytes) & 0x7FFF_FFFF_FFFF_FFFF
}

/// A teacher dictionary row, keyed by (profile_id, id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub profile_id: i64,
    pub id: i64,
    pub name: String,
    pub surname: String,
}

impl Teacher {
    /// A teacher known only by name; the id is derived from the full name.
    pub fn from_full_name(profile_id: i64, full_name: &str) -> Self {
        let mut parts = full_name.splitn(2, ' ');
        let name = parts.next().unwrap_or_default().to_string();
        let surname = parts.next().unwrap_or_default().to_string();
        Self {
            profile_id,
            id: stable_id(full_name),
            name,
            surname,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// A subject dictionary row, keyed by (profile_id, id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub profile_id: i64,
    pub id: i64,
    pub long_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

impl Subject {
    /// A subject known only by name; the id is derived from the long name.
    pub fn from_name(profile_id: i64, long_name: &str) -> Self {
        Self {
            profile_id,
            id: stable_id(long_name),
            long_name: long_name.to_string(),
            short_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        assert_eq!(stable_id("Jan Kowalski"), stable_id("Jan Kowalski"));
        assert_ne!(stable_id("Jan Kowalski"), stable_id("Anna Nowak"));
    }

    #[test]
    fn stable_id_is_non_negative() {
        for name in ["Matematyka", "Język polski", "Fizyka", "a", ""] {
            assert!(stable_id(name) >= 0, "negative id for {name:?}");
        }
    }

    #[test]
    fn teacher_from_full_name_splits_once() {
        let teacher = Teacher::from_full_name(1, "Maria Skłodowska Curie");
        assert_eq!(teacher.name, "Maria");
        assert_eq!(teacher.surname, "Skłodowska Curie");
        assert_eq!(teacher.id, stable_id("Maria Skłodowska Curie"));
    }

    #[test]
    fn teacher_full_name_round_trips() {
        let teacher = Teacher::from_full_name(1, "Jan Kowalski");
        assert_eq!(teacher.full_name(), "Jan Kowalski");
    }

    #[test]
    fn subject_from_name_derives_id() {
        let a = Subject::from_name(1, "Matematyka");
        let b = Subject::from_name(2, "Matematyka");
        // Same name, same id — the profile scoping lives in the key, not the id.
        assert_eq!(a.id, b.id);
        assert_eq!(a.long_name, "Matematyka");
        assert_eq!(a.short_name, None);
    }

    #[test]
    fn dictionary_rows_serialize() {
        let teacher = Teacher::from_full_name(1, "Jan Kowalski");
        let json = serde_json::to_string(&teacher).unwrap();
        assert!(json.contains("\"profileId\""));
        let back: Teacher = serde_json::from_str(&json).unwrap();
        assert_eq!(back, teacher);
    }
}
