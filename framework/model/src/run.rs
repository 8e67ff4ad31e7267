use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uitrack_core::prelude::StepId;

/// Lifecycle state of a run.
///
/// A run starts out `running` and is sealed by moving to `pass` or `fail`. Once sealed, no
/// further step results or evidence are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    #[serde(alias = "passed")]
    Pass,
    #[serde(alias = "failed")]
    Fail,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Pass => "pass",
            RunStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunVerdict {
    #[serde(alias = "passed")]
    Pass,
    #[serde(alias = "failed")]
    Fail,
}

impl From<RunVerdict> for RunStatus {
    fn from(verdict: RunVerdict) -> Self {
        match verdict {
            RunVerdict::Pass => RunStatus::Pass,
            RunVerdict::Fail => RunStatus::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[serde(alias = "passed")]
    Pass,
    #[serde(alias = "failed")]
    Fail,
    Skipped,
}

impl StepStatus {
    /// Whether the run should carry on with the next step after this one.
    pub fn continues(self) -> bool {
        !matches!(self, StepStatus::Fail)
    }
}

/// The recorded outcome of a single step within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: StepId,
    pub status: StepStatus,
    /// Milliseconds. Zero when unknown.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub error: Option<String>,
    /// Evidence file names, excluding metadata files, ordered by name.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// The content of `run.json`, written when a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecord {
    pub started_at: DateTime<Utc>,
}

/// A run record as stored in `result.json`, either in progress or final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub run_id: String,
    pub scenario_slug: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Milliseconds. Zero while the run is in progress.
    #[serde(default)]
    pub duration: u64,
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub failed_step: Option<StepId>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl Run {
    /// A fresh in-progress run with no steps.
    pub fn running(run_id: String, scenario_slug: String, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            scenario_slug,
            status: RunStatus::Running,
            started_at,
            completed_at: None,
            duration: 0,
            steps: Vec::new(),
            failed_step: None,
            error_message: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Insert a step result, replacing any existing result for the same step. Steps stay
    /// sorted by id.
    pub fn upsert_step(&mut self, step: StepResult) {
        match self
            .steps
            .binary_search_by_key(&step.step_id, |existing| existing.step_id)
        {
            Ok(index) => self.steps[index] = step,
            Err(index) => self.steps.insert(index, step),
        }
    }

    /// Replace all steps, sorting by id and keeping the last entry for any repeated id.
    pub fn set_steps(&mut self, steps: Vec<StepResult>) {
        self.steps = steps
            .into_iter()
            .rev()
            .unique_by(|step| step.step_id)
            .sorted_by_key(|step| step.step_id)
            .collect();
    }

    pub fn first_failed_step(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|step| step.status == StepStatus::Fail)
            .map(|step| step.step_id)
    }
}
