use serde::{Deserialize, Serialize};
use uitrack_core::prelude::StepId;

use crate::stats::ScenarioStats;

/// A scenario as described by its `meta.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub stats: ScenarioStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: StepId,
    #[serde(default)]
    pub title: String,
    /// Path of the step's script, relative to the scenario directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ScenarioMeta {
    /// Step ids in the order the scenario defines them.
    pub fn step_order(&self) -> Vec<StepId> {
        self.steps.iter().map(|step| step.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const META: &str = r#"
title: Checkout
slug: checkout
starred: true
tags: [smoke, payments]
steps:
  - id: "01"
    title: Open cart
    file: steps/01-open-cart.md
  - id: "02"
    title: Pay
  - id: 10
    title: Confirm
"#;

    #[test]
    fn reads_step_order_from_yaml() {
        let meta: ScenarioMeta = serde_yaml::from_str(META).unwrap();

        let order: Vec<String> = meta.step_order().iter().map(|id| id.to_string()).collect();

        assert_eq!(order, vec!["01", "02", "10"]);
        assert_eq!(meta.tags, vec!["smoke".to_string(), "payments".to_string()]);
        assert_eq!(meta.stats, ScenarioStats::default());
    }
}
