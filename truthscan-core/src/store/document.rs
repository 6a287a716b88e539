use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored record: generated id and timestamp plus caller fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// ISO-8601 UTC, microsecond precision
    pub timestamp: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Caller field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Summary counters kept inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_analyses: usize,
    pub total_feedback: usize,
    pub last_updated: Option<String>,
}

/// Root document persisted as a single JSON file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub analyses: Vec<Record>,
    #[serde(default)]
    pub feedback: Vec<Record>,
    #[serde(default)]
    pub known_hoaxes: Vec<Record>,
    #[serde(default)]
    pub users: Vec<Record>,
    #[serde(default)]
    pub statistics: Statistics,
}

impl StoreDocument {
    pub(crate) fn collection_mut(&mut self, collection: Collection) -> &mut Vec<Record> {
        match collection {
            Collection::Analyses => &mut self.analyses,
            Collection::Feedback => &mut self.feedback,
            Collection::KnownHoaxes => &mut self.known_hoaxes,
            Collection::Users => &mut self.users,
        }
    }

    /// Bring the counters in line with the collections.
    pub(crate) fn refresh_statistics(&mut self, last_updated: &str) {
        self.statistics.total_analyses = self.analyses.len();
        self.statistics.total_feedback = self.feedback.len();
        self.statistics.last_updated = Some(last_updated.to_string());
    }
}

/// The four named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Analyses,
    Feedback,
    KnownHoaxes,
    Users,
}

impl Collection {
    /// Prefix of generated identifiers.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Analyses => "analysis",
            Self::Feedback => "fb",
            Self::KnownHoaxes => "hoax",
            Self::Users => "user",
        }
    }
}

/// User feedback on a previous analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub analysis_id: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Counts reported by [`RecordStore::stats`](super::RecordStore::stats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_analyses: usize,
    pub total_feedback: usize,
    pub total_known_hoaxes: usize,
    pub total_users: usize,
    pub last_updated: Option<String>,
    pub storage_file: String,
}
