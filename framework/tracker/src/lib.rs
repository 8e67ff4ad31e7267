mod config;
mod evidence;
mod params;
mod repository;
mod scenarios;
mod sequencer;
mod stats;
mod storage;
mod tools;
mod tracker;

pub mod prelude {
    pub use crate::config::TrackerConfig;
    pub use crate::evidence::{EvidenceRecord, EvidenceStore, NewEvidence};
    pub use crate::params::{
        CompleteRunParams, CompleteStepParams, CreateScenarioParams, GetRunParams,
        RecordEvidenceParams, StartRunParams,
    };
    pub use crate::repository::{FsRunRepository, RunRepository};
    pub use crate::scenarios::ScenarioStore;
    pub use crate::sequencer::next_step;
    pub use crate::stats::ScenarioStatsRepository;
    pub use crate::tools::{ToolCall, TOOL_NAMES};
    pub use crate::tracker::{
        CompleteRunResponse, CompleteStepResponse, InitProjectResponse, StartRunResponse,
        Tracker,
    };

    pub use uitrack_core::prelude::*;
    pub use uitrack_model::*;
}
