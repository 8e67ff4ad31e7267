use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::run::RunVerdict;

/// Aggregate counters for a scenario, stored under the `stats` key of `meta.yaml`.
///
/// Missing fields default to zero or null, so scenarios created before statistics existed
/// read as never having been run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioStats {
    #[serde(deserialize_with = "lenient_u64")]
    pub total_runs: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub pass_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub fail_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_result: Option<RunVerdict>,
    /// Milliseconds, rounded to the nearest integer.
    #[serde(deserialize_with = "lenient_u64")]
    pub avg_duration: u64,
}

/// What a completed run contributes to its scenario's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub verdict: RunVerdict,
    /// Milliseconds.
    pub duration: u64,
}

impl ScenarioStats {
    /// Fold one completed run into these statistics.
    ///
    /// The average is a weighted running mean: `round((avg * total + duration) / (total + 1))`,
    /// rounding halves up. Individual durations are not retained.
    pub fn apply_completed_run(&self, outcome: RunOutcome, now: DateTime<Utc>) -> ScenarioStats {
        let total_runs = self.total_runs + 1;

        let (pass_count, fail_count) = match outcome.verdict {
            RunVerdict::Pass => (self.pass_count + 1, self.fail_count),
            RunVerdict::Fail => (self.pass_count, self.fail_count + 1),
        };

        let weighted_sum = u128::from(self.avg_duration) * u128::from(self.total_runs)
            + u128::from(outcome.duration);
        let divisor = u128::from(total_runs);
        let avg_duration = (2 * weighted_sum + divisor) / (2 * divisor);

        ScenarioStats {
            total_runs,
            pass_count,
            fail_count,
            last_run: Some(now),
            last_result: Some(outcome.verdict),
            avg_duration: u64::try_from(avg_duration).unwrap_or(u64::MAX),
        }
    }
}

/// Counters written by other tools may have been stored as floats or be null.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    })
}
