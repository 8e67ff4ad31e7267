use chrono::Utc;
use uitrack_core::prelude::{ProjectLayout, TrackError, TrackResult};
use uitrack_model::{RunOutcome, ScenarioStats};

use crate::storage::{read_yaml_value, write_yaml};

const STATS_KEY: &str = "stats";

/// Owns the `stats` key of each scenario's `meta.yaml`.
///
/// Updates are a merge: the document is read as-is, only `stats` is replaced, and every other
/// key (title, tags, starred, steps and anything else) is written back unchanged.
pub struct ScenarioStatsRepository {
    layout: ProjectLayout,
}

impl ScenarioStatsRepository {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Current statistics for a scenario, zeroed when none have been recorded yet.
    #[cfg(test)]
    fn load(&self, slug: &str) -> TrackResult<ScenarioStats> {
        let path = self.layout.meta_path(slug);
        let document = read_yaml_value(&path)?.unwrap_or(serde_yaml::Value::Null);
        parse_stats(document.get(STATS_KEY)).map_err(|e| TrackError::yaml(&path, e))
    }

    /// Fold one completed run into the scenario's statistics and persist them.
    pub fn apply_completed_run(
        &self,
        slug: &str,
        outcome: RunOutcome,
    ) -> TrackResult<ScenarioStats> {
        let path = self.layout.meta_path(slug);
        let mut document = match read_yaml_value(&path)? {
            Some(serde_yaml::Value::Mapping(mapping)) => mapping,
            Some(serde_yaml::Value::Null) | None => {
                log::debug!("No meta.yaml content for {slug}, starting stats from zero");
                serde_yaml::Mapping::new()
            }
            Some(_) => {
                return Err(TrackError::yaml(
                    &path,
                    serde::de::Error::custom("expected a mapping at the top level"),
                ))
            }
        };

        let current =
            parse_stats(document.get(STATS_KEY)).map_err(|e| TrackError::yaml(&path, e))?;
        let updated = current.apply_completed_run(outcome, Utc::now());

        document.insert(
            serde_yaml::Value::String(STATS_KEY.to_string()),
            serde_yaml::to_value(&updated).map_err(|e| TrackError::yaml(&path, e))?,
        );
        write_yaml(&path, &document)?;

        log::debug!(
            "Updated stats for {slug}: {} runs, {} pass, {} fail, avg {}ms",
            updated.total_runs,
            updated.pass_count,
            updated.fail_count,
            updated.avg_duration
        );
        Ok(updated)
    }
}

/// Parse a stats record, treating an absent or null value as zeroed stats.
fn parse_stats(value: Option<&serde_yaml::Value>) -> Result<ScenarioStats, serde_yaml::Error> {
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(ScenarioStats::default()),
        Some(stats) => serde_yaml::from_value(stats.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uitrack_model::RunVerdict;

    const META: &str = r#"title: Checkout
slug: checkout
starred: true
tags:
- smoke
- payments
owner: qa-team
steps:
- id: '01'
  title: Open cart
stats:
  totalRuns: 2
  passCount: 1
  failCount: 1
  lastRun: null
  lastResult: fail
  avgDuration: 1000
"#;

    fn repo_with_meta(meta: Option<&str>) -> (tempfile::TempDir, ScenarioStatsRepository) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        std::fs::create_dir_all(layout.scenario_dir("checkout")).unwrap();
        if let Some(meta) = meta {
            std::fs::write(layout.meta_path("checkout"), meta).unwrap();
        }
        (dir, ScenarioStatsRepository::new(layout))
    }

    #[test]
    fn merges_stats_and_preserves_other_keys() {
        let (dir, repo) = repo_with_meta(Some(META));

        let updated = repo
            .apply_completed_run(
                "checkout",
                RunOutcome {
                    verdict: RunVerdict::Pass,
                    duration: 2500,
                },
            )
            .unwrap();

        assert_eq!(updated.total_runs, 3);
        assert_eq!(updated.pass_count, 2);
        assert_eq!(updated.fail_count, 1);
        assert_eq!(updated.avg_duration, 1500);

        let before: serde_yaml::Value = serde_yaml::from_str(META).unwrap();
        let after: serde_yaml::Value = serde_yaml::from_str(
            &std::fs::read_to_string(dir.path().join("scenarios/checkout/meta.yaml")).unwrap(),
        )
        .unwrap();
        for key in ["title", "slug", "starred", "tags", "owner", "steps"] {
            assert_eq!(before[key], after[key], "{key}");
        }
        assert_eq!(after["stats"]["lastResult"], "pass");
        assert_eq!(repo.load("checkout").unwrap(), updated);
    }

    #[test]
    fn missing_meta_starts_from_zero() {
        let (_dir, repo) = repo_with_meta(None);
        assert_eq!(repo.load("checkout").unwrap(), ScenarioStats::default());

        let updated = repo
            .apply_completed_run(
                "checkout",
                RunOutcome {
                    verdict: RunVerdict::Fail,
                    duration: 300,
                },
            )
            .unwrap();

        assert_eq!(updated.total_runs, 1);
        assert_eq!(updated.fail_count, 1);
        assert_eq!(updated.avg_duration, 300);
    }

    #[test]
    fn meta_that_is_not_a_mapping_is_a_storage_error() {
        let (dir, repo) = repo_with_meta(Some("- just\n- a list\n"));

        let err = repo
            .apply_completed_run(
                "checkout",
                RunOutcome {
                    verdict: RunVerdict::Pass,
                    duration: 10,
                },
            )
            .unwrap_err();

        assert_eq!(err.kind(), "StorageFormatError");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("scenarios/checkout/meta.yaml")).unwrap(),
            "- just\n- a list\n"
        );
    }

    #[test]
    fn meta_without_stats_key_starts_from_zero() {
        let (_dir, repo) = repo_with_meta(Some("title: Checkout\nslug: checkout\n"));

        let updated = repo
            .apply_completed_run(
                "checkout",
                RunOutcome {
                    verdict: RunVerdict::Pass,
                    duration: 10,
                },
            )
            .unwrap();

        assert_eq!(updated.total_runs, 1);
        assert_eq!(updated.pass_count, 1);
    }
}
