//! Parameter objects for the tracker operations.
//!
//! Every operation validates its parameters before it touches storage: unknown or missing fields
//! and malformed values are rejected as [TrackError::Validation].

use std::collections::HashSet;

use serde::Deserialize;
use uitrack_core::prelude::{is_valid_slug, StepId, TrackError, TrackResult};
use uitrack_model::{EvidenceKind, RunVerdict, StepDefinition, StepResult, StepStatus};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartRunParams {
    pub scenario_slug: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompleteStepParams {
    pub run_id: String,
    pub step_id: StepId,
    pub status: StepStatus,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordEvidenceParams {
    pub run_id: String,
    pub step_number: StepId,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub name: String,
    /// An absolute file path for screenshots, the evidence content itself for anything else.
    pub data: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompleteRunParams {
    pub run_id: String,
    pub status: RunVerdict,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub failed_step: Option<StepId>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Overrides any steps recorded so far when non-empty.
    #[serde(default)]
    pub steps: Option<Vec<StepResult>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateScenarioParams {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetRunParams {
    pub run_id: String,
}

impl StartRunParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_slug(&self.scenario_slug)
    }
}

impl CompleteStepParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_run_id(&self.run_id)
    }
}

impl RecordEvidenceParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_run_id(&self.run_id)?;
        validate_evidence_name(&self.name)?;
        match &self.metadata {
            None | Some(serde_json::Value::Object(_)) => Ok(()),
            Some(_) => Err(TrackError::Validation(
                "`metadata` must be an object when given".to_string(),
            )),
        }
    }
}

impl CompleteRunParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_run_id(&self.run_id)
    }
}

impl CreateScenarioParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_slug(&self.slug)?;
        if self.title.trim().is_empty() {
            return Err(TrackError::Validation(
                "`title` must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id) {
                return Err(TrackError::Validation(format!(
                    "step `{}` is defined more than once",
                    step.id
                )));
            }
        }
        Ok(())
    }
}

impl GetRunParams {
    pub fn validate(&self) -> TrackResult<()> {
        validate_run_id(&self.run_id)
    }
}

fn validate_slug(slug: &str) -> TrackResult<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(TrackError::Validation(format!(
            "invalid scenario slug `{slug}`: use lowercase letters, digits, `-` and `_`"
        )))
    }
}

/// Run ids are generated from the URL-safe nanoid alphabet, so anything else can't name a run.
fn validate_run_id(run_id: &str) -> TrackResult<()> {
    let valid = !run_id.is_empty()
        && run_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TrackError::Validation(format!("invalid run id `{run_id}`")))
    }
}

/// Evidence names become file names inside the step's evidence directory, next to the
/// `<name>.meta.json` companion of each file. A name ending in `.meta` would share that namespace.
fn validate_evidence_name(name: &str) -> TrackResult<()> {
    let valid = !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if !valid {
        return Err(TrackError::Validation(format!(
            "invalid evidence name `{name}`: must be a plain file name"
        )));
    }
    if name.to_ascii_lowercase().ends_with(".meta") {
        return Err(TrackError::Validation(format!(
            "invalid evidence name `{name}`: names ending in `.meta` are reserved for metadata"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn complete_step_defaults_duration_and_error() {
        let params: CompleteStepParams =
            serde_json::from_value(json!({"runId": "abc", "stepId": "02", "status": "skipped"}))
                .unwrap();

        assert_eq!(params.duration, 0);
        assert_eq!(params.error, None);
        assert_eq!(params.step_id.to_string(), "02");
        params.validate().unwrap();
    }

    #[test]
    fn rejects_negative_duration_and_unknown_fields() {
        assert!(serde_json::from_value::<CompleteStepParams>(
            json!({"runId": "abc", "stepId": 1, "status": "pass", "duration": -5})
        )
        .is_err());
        assert!(serde_json::from_value::<StartRunParams>(
            json!({"scenarioSlug": "login", "extra": true})
        )
        .is_err());
        assert!(serde_json::from_value::<CompleteRunParams>(json!({"runId": "abc"})).is_err());
    }

    #[test]
    fn run_ids_cannot_escape_the_project() {
        let params = GetRunParams {
            run_id: "../../etc".to_string(),
        };

        assert_eq!(params.validate().unwrap_err().kind(), "ValidationError");
    }

    #[test]
    fn evidence_names_must_be_plain_file_names() {
        for name in ["", " ", "..", "a/b", "a\\b", "cart.meta", "cart.META"] {
            let params = RecordEvidenceParams {
                run_id: "abc".to_string(),
                step_number: StepId::FIRST,
                kind: EvidenceKind::Custom,
                name: name.to_string(),
                data: "{}".to_string(),
                metadata: None,
            };
            assert!(params.validate().is_err(), "{name:?}");
        }
    }

    #[test]
    fn evidence_names_may_contain_meta_elsewhere() {
        for name in ["metadata", "cart.meta-2", "meta.cart"] {
            assert!(validate_evidence_name(name).is_ok(), "{name:?}");
        }
    }

    #[test]
    fn evidence_metadata_must_be_an_object() {
        let params: RecordEvidenceParams = serde_json::from_value(json!({
            "runId": "abc",
            "stepNumber": 1,
            "type": "custom",
            "name": "cart",
            "data": "{}",
            "metadata": [1, 2]
        }))
        .unwrap();

        assert!(params.validate().is_err());
    }

    #[test]
    fn scenarios_reject_duplicate_steps() {
        let params: CreateScenarioParams = serde_json::from_value(json!({
            "slug": "login",
            "title": "Login",
            "steps": [{"id": "01", "title": "a"}, {"id": 1, "title": "b"}]
        }))
        .unwrap();

        assert!(params.validate().is_err());
    }
}
