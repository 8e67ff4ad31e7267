use std::path::{Path, PathBuf};

use crate::step_id::InvalidStepId;

/// Recommended result type for everything that touches a uitrack project.
pub type TrackResult<T> = Result<T, TrackError>;

/// The failures that the tracker surfaces to its callers.
///
/// Every variant is reported as-is. Nothing is retried and only explicitly optional lookups (a
/// missing `meta.yaml`, `run.json` or `result.json`) are defaulted instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// Malformed or missing parameters. Raised before any I/O takes place.
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Project is not initialized: {} does not exist", root.display())]
    NotInitialized { root: PathBuf },
    #[error("Scenario not found: {slug}")]
    ScenarioNotFound { slug: String },
    #[error("Scenario already exists: {slug}")]
    ScenarioAlreadyExists { slug: String },
    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },
    #[error("Run {run_id} is already completed with status `{status}`")]
    RunAlreadyCompleted { run_id: String, status: String },
    /// Screenshot evidence must reference a readable file by absolute path.
    #[error("Evidence path error: {0}")]
    EvidencePath(String),
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl TrackError {
    /// A stable name for the failure class, suitable for a transport to switch on.
    pub fn kind(&self) -> &'static str {
        match self {
            TrackError::Validation(_) => "ValidationError",
            TrackError::NotInitialized { .. } => "NotInitialized",
            TrackError::ScenarioNotFound { .. } => "ScenarioNotFound",
            TrackError::ScenarioAlreadyExists { .. } => "ScenarioAlreadyExists",
            TrackError::RunNotFound { .. } => "RunNotFound",
            TrackError::RunAlreadyCompleted { .. } => "RunAlreadyCompleted",
            TrackError::EvidencePath(_) => "EvidencePathError",
            TrackError::Io { .. } => "IoError",
            TrackError::Json { .. } | TrackError::Yaml { .. } => "StorageFormatError",
        }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        TrackError::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn yaml(path: &Path, source: serde_yaml::Error) -> Self {
        TrackError::Yaml {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<InvalidStepId> for TrackError {
    fn from(err: InvalidStepId) -> Self {
        TrackError::Validation(err.to_string())
    }
}

/// Attach the action and path to a raw [std::io::Error].
pub trait IoResultExt<T> {
    fn io_err(self, action: &'static str, path: &Path) -> TrackResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn io_err(self, action: &'static str, path: &Path) -> TrackResult<T> {
        self.map_err(|source| TrackError::Io {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}
