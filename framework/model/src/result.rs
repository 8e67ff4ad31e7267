use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uitrack_core::prelude::StepId;

use crate::run::{Run, RunStatus, StepResult, StepStatus};

/// Any shape of `result.json` that has been written by some version of the tracker.
///
/// The current shape carries a `steps` array. The legacy shape stored a flat `evidence` list at
/// the run level with the step encoded into each file name, and a numeric `failedStep`. Use
/// [RunResult::upgrade] to get a [Run] regardless of the shape that was read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RunResult {
    V2(Run),
    V1(LegacyRunResult),
}

/// The legacy flat-evidence result shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRunResult {
    pub run_id: String,
    #[serde(default, alias = "scenario")]
    pub scenario_slug: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub failed_step: Option<StepId>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl RunResult {
    pub fn status(&self) -> RunStatus {
        match self {
            RunResult::V2(run) => run.status,
            RunResult::V1(legacy) => legacy.status,
        }
    }

    /// Convert to the current [Run] shape.
    ///
    /// `scenario_slug` is used when the stored record doesn't name its scenario. `now` is the
    /// start time of last resort for legacy records with neither a start nor a completion time.
    pub fn upgrade(self, scenario_slug: &str, now: DateTime<Utc>) -> Run {
        match self {
            RunResult::V2(run) => run,
            RunResult::V1(legacy) => legacy.upgrade(scenario_slug, now),
        }
    }
}

impl LegacyRunResult {
    fn upgrade(self, scenario_slug: &str, now: DateTime<Utc>) -> Run {
        let mut by_step: BTreeMap<StepId, Vec<String>> = BTreeMap::new();
        for name in self.evidence {
            match legacy_step_of(&name) {
                Some(step_id) => by_step.entry(step_id).or_default().push(name),
                None => log::debug!(
                    "Dropping legacy evidence without a step marker from run {}: {}",
                    self.run_id,
                    name
                ),
            }
        }
        if let Some(failed_step) = self.failed_step {
            by_step.entry(failed_step).or_default();
        }

        let steps = by_step
            .into_iter()
            .map(|(step_id, mut evidence)| {
                evidence.sort();
                StepResult {
                    step_id,
                    status: if Some(step_id) == self.failed_step {
                        StepStatus::Fail
                    } else {
                        StepStatus::Pass
                    },
                    duration: 0,
                    error: None,
                    evidence,
                }
            })
            .collect();

        Run {
            run_id: self.run_id,
            scenario_slug: self
                .scenario_slug
                .unwrap_or_else(|| scenario_slug.to_string()),
            status: self.status,
            started_at: self.started_at.or(self.completed_at).unwrap_or(now),
            completed_at: self.completed_at,
            duration: self.duration,
            steps,
            failed_step: self.failed_step,
            error_message: self.error_message,
        }
    }
}

/// Find the step that a legacy evidence file name belongs to.
///
/// Legacy names embed the step as `step-NN`, `step_NN` or `stepNN` anywhere in the name, for
/// example `run42_step-03_login.png`. The first marker that parses wins.
pub fn legacy_step_of(name: &str) -> Option<StepId> {
    let lower = name.to_ascii_lowercase();
    let mut rest = lower.as_str();
    while let Some(pos) = rest.find("step") {
        let after = &rest[pos + "step".len()..];
        let digits_start = after
            .strip_prefix('-')
            .or_else(|| after.strip_prefix('_'))
            .unwrap_or(after);
        let digits: String = digits_start
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if (1..=2).contains(&digits.len()) {
            if let Ok(step_id) = digits.parse::<StepId>() {
                return Some(step_id);
            }
        }
        rest = after;
    }
    None
}
