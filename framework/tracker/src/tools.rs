use serde::de::DeserializeOwned;
use serde::Serialize;
use uitrack_core::prelude::{TrackError, TrackResult};

use crate::params::{
    CompleteRunParams, CompleteStepParams, CreateScenarioParams, GetRunParams,
    RecordEvidenceParams, StartRunParams,
};
use crate::repository::RunRepository;
use crate::tracker::Tracker;

/// The operations a transport may invoke by name.
pub const TOOL_NAMES: &[&str] = &[
    "init_project",
    "create_scenario",
    "start_run",
    "complete_step",
    "record_evidence",
    "complete_run",
    "get_run",
];

/// A named operation together with its validated parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    InitProject,
    CreateScenario(CreateScenarioParams),
    StartRun(StartRunParams),
    CompleteStep(CompleteStepParams),
    RecordEvidence(RecordEvidenceParams),
    CompleteRun(CompleteRunParams),
    GetRun(GetRunParams),
}

impl ToolCall {
    /// Check `params` against the schema of the tool called `name`.
    ///
    /// Nothing is read or written here, so a rejected call has no side effects. A `null`
    /// parameter value is treated as an empty object.
    pub fn parse(name: &str, params: serde_json::Value) -> TrackResult<Self> {
        let params = match params {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let call = match name {
            "init_project" => {
                let _: EmptyParams = decode(name, params)?;
                ToolCall::InitProject
            }
            "create_scenario" => {
                let p: CreateScenarioParams = decode(name, params)?;
                p.validate()?;
                ToolCall::CreateScenario(p)
            }
            "start_run" => {
                let p: StartRunParams = decode(name, params)?;
                p.validate()?;
                ToolCall::StartRun(p)
            }
            "complete_step" => {
                let p: CompleteStepParams = decode(name, params)?;
                p.validate()?;
                ToolCall::CompleteStep(p)
            }
            "record_evidence" => {
                let p: RecordEvidenceParams = decode(name, params)?;
                p.validate()?;
                ToolCall::RecordEvidence(p)
            }
            "complete_run" => {
                let p: CompleteRunParams = decode(name, params)?;
                p.validate()?;
                ToolCall::CompleteRun(p)
            }
            "get_run" => {
                let p: GetRunParams = decode(name, params)?;
                p.validate()?;
                ToolCall::GetRun(p)
            }
            _ => {
                return Err(TrackError::Validation(format!(
                    "unknown tool `{name}`, expected one of: {}",
                    TOOL_NAMES.join(", ")
                )))
            }
        };

        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::InitProject => "init_project",
            ToolCall::CreateScenario(_) => "create_scenario",
            ToolCall::StartRun(_) => "start_run",
            ToolCall::CompleteStep(_) => "complete_step",
            ToolCall::RecordEvidence(_) => "record_evidence",
            ToolCall::CompleteRun(_) => "complete_run",
            ToolCall::GetRun(_) => "get_run",
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyParams {}

fn decode<T: DeserializeOwned>(name: &str, params: serde_json::Value) -> TrackResult<T> {
    serde_json::from_value(params)
        .map_err(|e| TrackError::Validation(format!("invalid parameters for `{name}`: {e}")))
}

fn to_value<T: Serialize>(value: T) -> TrackResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| TrackError::Validation(format!("failed to encode response: {e}")))
}

impl<R: RunRepository> Tracker<R> {
    /// Run a parsed tool call and encode its response as JSON.
    pub fn invoke(&self, call: &ToolCall) -> TrackResult<serde_json::Value> {
        log::debug!("Invoking {}", call.name());
        match call {
            ToolCall::InitProject => to_value(self.init_project()?),
            ToolCall::CreateScenario(p) => to_value(self.create_scenario(p)?),
            ToolCall::StartRun(p) => to_value(self.start_run(p)?),
            ToolCall::CompleteStep(p) => to_value(self.complete_step(p)?),
            ToolCall::RecordEvidence(p) => to_value(self.record_evidence(p)?),
            ToolCall::CompleteRun(p) => to_value(self.complete_run(p)?),
            ToolCall::GetRun(p) => to_value(self.get_run(p)?),
        }
    }

    /// Parse and run a tool call in one go.
    pub fn invoke_by_name(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> TrackResult<serde_json::Value> {
        let call = ToolCall::parse(name, params)?;
        self.invoke(&call)
    }
}
