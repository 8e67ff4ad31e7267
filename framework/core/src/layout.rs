use std::path::{Path, PathBuf};

use crate::error::{TrackError, TrackResult};
use crate::step_id::StepId;

pub const SCENARIOS_DIR: &str = "scenarios";
pub const RUNS_DIR: &str = "runs";
pub const META_FILE: &str = "meta.yaml";
pub const START_RECORD_FILE: &str = "run.json";
pub const RESULT_FILE: &str = "result.json";
pub const EVIDENCE_DIR: &str = "evidence";

/// The on-disk layout of a uitrack project.
///
/// ```text
/// <root>/scenarios/<slug>/meta.yaml
/// <root>/scenarios/<slug>/runs/<runId>/run.json
/// <root>/scenarios/<slug>/runs/<runId>/result.json
/// <root>/scenarios/<slug>/runs/<runId>/step-<NN>/evidence/<name>.<ext>
/// <root>/scenarios/<slug>/runs/<runId>/step-<NN>/evidence/<name>.meta.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail with [TrackError::NotInitialized] unless the project root exists.
    pub fn ensure_initialized(&self) -> TrackResult<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(TrackError::NotInitialized {
                root: self.root.clone(),
            })
        }
    }

    pub fn scenarios_dir(&self) -> PathBuf {
        self.root.join(SCENARIOS_DIR)
    }

    pub fn scenario_dir(&self, slug: &str) -> PathBuf {
        self.scenarios_dir().join(slug)
    }

    pub fn meta_path(&self, slug: &str) -> PathBuf {
        self.scenario_dir(slug).join(META_FILE)
    }

    pub fn runs_dir(&self, slug: &str) -> PathBuf {
        self.scenario_dir(slug).join(RUNS_DIR)
    }

    pub fn run_location(&self, slug: &str, run_id: &str) -> RunLocation {
        RunLocation {
            scenario_slug: slug.to_string(),
            run_id: run_id.to_string(),
            dir: self.runs_dir(slug).join(run_id),
        }
    }
}

/// Where a run lives: its owning scenario and its storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLocation {
    pub scenario_slug: String,
    pub run_id: String,
    pub dir: PathBuf,
}

impl RunLocation {
    pub fn start_record_path(&self) -> PathBuf {
        self.dir.join(START_RECORD_FILE)
    }

    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }

    pub fn step_dir(&self, step: StepId) -> PathBuf {
        self.dir.join(step.dir_name())
    }

    pub fn evidence_dir(&self, step: StepId) -> PathBuf {
        self.step_dir(step).join(EVIDENCE_DIR)
    }
}

/// Slugs name a directory, so they are restricted to lowercase ASCII letters, digits, `-` and
/// `_`, and must start with a letter or digit.
pub fn is_valid_slug(slug: &str) -> bool {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn run_paths_follow_the_project_layout() {
        let layout = ProjectLayout::new("/project");
        let run = layout.run_location("login", "abc123");
        let step = StepId::new(4).unwrap();

        assert_eq!(
            layout.meta_path("login"),
            PathBuf::from("/project/scenarios/login/meta.yaml")
        );
        assert_eq!(run.dir, PathBuf::from("/project/scenarios/login/runs/abc123"));
        assert_eq!(
            run.start_record_path(),
            PathBuf::from("/project/scenarios/login/runs/abc123/run.json")
        );
        assert_eq!(
            run.result_path(),
            PathBuf::from("/project/scenarios/login/runs/abc123/result.json")
        );
        assert_eq!(
            run.evidence_dir(step),
            PathBuf::from("/project/scenarios/login/runs/abc123/step-04/evidence")
        );
    }

    #[test]
    fn missing_root_is_not_initialized() {
        let layout = ProjectLayout::new("/definitely/not/a/uitrack/root");

        let err = layout.ensure_initialized().unwrap_err();

        assert_eq!(err.kind(), "NotInitialized");
    }

    #[test]
    fn slugs_are_directory_safe() {
        assert!(is_valid_slug("checkout-flow"));
        assert!(is_valid_slug("2fa_login"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("../escape"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("with space"));
    }
}
