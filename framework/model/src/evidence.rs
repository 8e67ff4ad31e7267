use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uitrack_core::prelude::StepId;

/// Suffix of the companion metadata file written next to each evidence file.
pub const EVIDENCE_META_SUFFIX: &str = ".meta.json";

/// The logical kind of an evidence artifact, which decides its file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvidenceKind {
    Screenshot,
    DbSnapshot,
    ConsoleLog,
    NetworkLog,
    HtmlSnapshot,
    Custom,
    /// Any kind this version doesn't know about. Stored with a generic binary extension.
    Other(String),
}

impl EvidenceKind {
    pub fn as_str(&self) -> &str {
        match self {
            EvidenceKind::Screenshot => "screenshot",
            EvidenceKind::DbSnapshot => "db_snapshot",
            EvidenceKind::ConsoleLog => "console_log",
            EvidenceKind::NetworkLog => "network_log",
            EvidenceKind::HtmlSnapshot => "html_snapshot",
            EvidenceKind::Custom => "custom",
            EvidenceKind::Other(kind) => kind,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            EvidenceKind::Screenshot => "png",
            EvidenceKind::DbSnapshot => "json",
            EvidenceKind::ConsoleLog => "txt",
            EvidenceKind::NetworkLog => "json",
            EvidenceKind::HtmlSnapshot => "html",
            EvidenceKind::Custom => "json",
            EvidenceKind::Other(_) => "bin",
        }
    }

    /// Screenshots are passed by path and copied in. Everything else is passed inline as text.
    pub fn copies_from_path(&self) -> bool {
        matches!(self, EvidenceKind::Screenshot)
    }
}

impl From<String> for EvidenceKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "screenshot" => EvidenceKind::Screenshot,
            "db_snapshot" => EvidenceKind::DbSnapshot,
            "console_log" => EvidenceKind::ConsoleLog,
            "network_log" => EvidenceKind::NetworkLog,
            "html_snapshot" => EvidenceKind::HtmlSnapshot,
            "custom" => EvidenceKind::Custom,
            _ => EvidenceKind::Other(kind),
        }
    }
}

impl From<&str> for EvidenceKind {
    fn from(kind: &str) -> Self {
        EvidenceKind::from(kind.to_string())
    }
}

impl From<EvidenceKind> for String {
    fn from(kind: EvidenceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The content of `<name>.meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMeta {
    pub run_id: String,
    pub step_id: StepId,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub name: String,
    pub captured_at: DateTime<Utc>,
    pub file_size: u64,
    /// Caller supplied, `{}` when none was given.
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
