//! Wire DTOs for the Rejestr mobile API. Field names follow the backend's
//! JSON verbatim; mapping into journal entities lives in `mapper.rs`.

use serde::Deserialize;

/// Every list endpoint wraps its payload in a `Data` array.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Data", default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct WireTeacher {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Imie")]
    pub name: String,
    #[serde(rename = "Nazwisko")]
    pub surname: String,
}

#[derive(Debug, Deserialize)]
pub struct WireSubject {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Nazwa")]
    pub name: String,
    #[serde(rename = "Skrot")]
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireGrade {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Wpis")]
    pub entry: String,
    #[serde(rename = "Wartosc")]
    pub value: f64,
    #[serde(rename = "Waga")]
    pub weight: f64,
    #[serde(rename = "Kategoria")]
    pub category: Option<String>,
    #[serde(rename = "Kolor")]
    pub color: Option<i32>,
    #[serde(rename = "IdPrzedmiot")]
    pub subject_id: i64,
    #[serde(rename = "IdPracownik")]
    pub teacher_id: Option<i64>,
    /// Epoch milliseconds of the entry's creation.
    #[serde(rename = "DataUtworzenia")]
    pub created_at: Option<i64>,
}

/// Proposed/final grade summary row, one per subject.
#[derive(Debug, Deserialize)]
pub struct WireGradeSummary {
    #[serde(rename = "IdPrzedmiot")]
    pub subject_id: i64,
    #[serde(rename = "Proponowana")]
    pub proposed: Option<String>,
    #[serde(rename = "Koncowa")]
    pub final_grade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "DataTekst")]
    pub date: String,
    #[serde(rename = "Opis")]
    pub topic: Option<String>,
    /// true is an exam, false a short quiz; absent on homework rows.
    #[serde(rename = "Rodzaj")]
    pub is_exam: Option<bool>,
    #[serde(rename = "IdPrzedmiot")]
    pub subject_id: Option<i64>,
    #[serde(rename = "IdPracownik")]
    pub teacher_id: Option<i64>,
    #[serde(rename = "IdOddzial")]
    pub team_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Temat")]
    pub subject: String,
    #[serde(rename = "IdNadawca")]
    pub sender_id: Option<i64>,
    #[serde(rename = "Odczytana")]
    pub read: bool,
    /// Epoch milliseconds of delivery.
    #[serde(rename = "DataNadania")]
    pub sent_at: i64,
    #[serde(rename = "Zalaczniki", default)]
    pub has_attachments: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireLesson {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "DataTekst")]
    pub date: String,
    #[serde(rename = "GodzinaOd")]
    pub start_time: String,
    #[serde(rename = "GodzinaDo")]
    pub end_time: String,
    #[serde(rename = "IdPrzedmiot")]
    pub subject_id: Option<i64>,
    #[serde(rename = "IdPracownik")]
    pub teacher_id: Option<i64>,
    /// Full name of a stand-in teacher not present in the dictionaries.
    #[serde(rename = "Nauczyciel")]
    pub teacher_name: Option<String>,
    #[serde(rename = "IdOddzial")]
    pub team_id: Option<i64>,
    #[serde(rename = "Sala")]
    pub classroom: Option<String>,
}
