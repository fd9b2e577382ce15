use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Discriminates the two kinds of rows in the `files` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Trip,
    File,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::File => "file",
        }
    }
}

/// Trip metadata, kept as a marker row next to the trip's files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: i64,
    pub trip_name: String,
    pub location: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    pub trip_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// An uploaded receipt or document attached to a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: i64,
    pub trip_id: i64,
    pub trip_name: String,
    pub location: Option<String>,
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub note: Option<String>,
    #[serde(skip_serializing, default)]
    pub storage_key: String,
    pub created_at: NaiveDateTime,
}

/// Metadata of a stored object, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFile {
    pub trip_id: i64,
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub storage_key: String,
    pub note: Option<String>,
}
