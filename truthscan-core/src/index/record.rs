use serde::{Deserialize, Serialize};

/// Fact-check label attached to an indexed statement.
///
/// Stored labels outside the known set load as [`Verdict::Other`] and are
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    /// Known false statement.
    #[default]
    Fake,
    /// Verified true statement.
    Real,
    /// True in part but presented deceptively.
    Misleading,
    /// Not yet fact-checked.
    Unverified,
    /// Label written by another tool.
    Other(String),
}

impl Verdict {
    fn known(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "FAKE" => Some(Self::Fake),
            "REAL" => Some(Self::Real),
            "MISLEADING" => Some(Self::Misleading),
            "UNVERIFIED" => Some(Self::Unverified),
            _ => None,
        }
    }
}

impl From<String> for Verdict {
    fn from(label: String) -> Self {
        Self::known(&label).unwrap_or(Self::Other(label))
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Other(label) => label,
            known => known.to_string(),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fake => write!(f, "FAKE"),
            Self::Real => write!(f, "REAL"),
            Self::Misleading => write!(f, "MISLEADING"),
            Self::Unverified => write!(f, "UNVERIFIED"),
            Self::Other(label) => f.write_str(label),
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    /// Strict: only the four known labels parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::known(s).ok_or_else(|| format!("unknown verdict: {}", s.to_ascii_uppercase()))
    }
}

/// Descriptive metadata supplied when inserting a statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HoaxMetadata {
    pub verdict: Verdict,
    /// Who debunked or reported it
    #[serde(default)]
    pub source: String,
    /// Topic bucket, e.g. "health_misinformation"
    #[serde(default)]
    pub category: String,
}

impl HoaxMetadata {
    pub fn new(verdict: Verdict, source: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            verdict,
            source: source.into(),
            category: category.into(),
        }
    }
}

/// Metadata stored alongside each vector, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub text: String,
    #[serde(flatten)]
    pub metadata: HoaxMetadata,
}

impl EmbeddingRecord {
    pub fn verdict(&self) -> &Verdict {
        &self.metadata.verdict
    }

    pub fn category(&self) -> &str {
        &self.metadata.category
    }
}
