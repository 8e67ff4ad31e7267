use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uitrack_core::prelude::{
    IoResultExt, ProjectLayout, RunLocation, StepId, TrackError, TrackResult,
};
use uitrack_model::{
    Run, RunOutcome, RunStatus, RunVerdict, ScenarioMeta, ScenarioStats, StartRecord,
    StepResult, StepStatus,
};

use crate::config::TrackerConfig;
use crate::evidence::{EvidenceRecord, EvidenceStore, NewEvidence};
use crate::params::{
    CompleteRunParams, CompleteStepParams, CreateScenarioParams, GetRunParams,
    RecordEvidenceParams, StartRunParams,
};
use crate::repository::{FsRunRepository, RunRepository};
use crate::scenarios::ScenarioStore;
use crate::sequencer::next_step;
use crate::stats::ScenarioStatsRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
    pub run_id: String,
    pub scenario_slug: String,
    pub run_number: usize,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStepResponse {
    pub run_id: String,
    pub step_id: StepId,
    pub status: StepStatus,
    pub next_step_id: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRunResponse {
    pub run_id: String,
    pub status: RunVerdict,
    pub stats: ScenarioStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitProjectResponse {
    pub root: PathBuf,
    pub created: bool,
}

/// Drives runs through their lifecycle: start, any number of completed steps and evidence
/// captures, then a single completion that seals the run and updates the scenario statistics.
///
/// Operations on the same run are expected to be serialized by the caller.
pub struct Tracker<R: RunRepository = FsRunRepository> {
    config: TrackerConfig,
    layout: ProjectLayout,
    runs: R,
    evidence: EvidenceStore,
    scenarios: ScenarioStore,
    stats: ScenarioStatsRepository,
}

impl Tracker<FsRunRepository> {
    pub fn new(config: TrackerConfig) -> Self {
        let runs = FsRunRepository::new(config.layout());
        Self::with_repository(config, runs)
    }
}

impl<R: RunRepository> Tracker<R> {
    pub fn with_repository(config: TrackerConfig, runs: R) -> Self {
        let layout = config.layout();
        Self {
            evidence: EvidenceStore::new(),
            scenarios: ScenarioStore::new(layout.clone()),
            stats: ScenarioStatsRepository::new(layout.clone()),
            layout,
            runs,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Create the project root and its `scenarios/` directory if they don't exist yet.
    pub fn init_project(&self) -> TrackResult<InitProjectResponse> {
        let scenarios_dir = self.layout.scenarios_dir();
        let created = !scenarios_dir.is_dir();
        std::fs::create_dir_all(&scenarios_dir).io_err("create directory", &scenarios_dir)?;
        if created {
            log::info!("Initialized project at {}", self.layout.root().display());
        }

        Ok(InitProjectResponse {
            root: self.layout.root().to_path_buf(),
            created,
        })
    }

    pub fn create_scenario(&self, params: &CreateScenarioParams) -> TrackResult<ScenarioMeta> {
        params.validate()?;
        self.layout.ensure_initialized()?;

        let mut steps = params.steps.clone();
        steps.sort_by_key(|step| step.id);
        let meta = ScenarioMeta {
            title: params.title.trim().to_string(),
            slug: params.slug.clone(),
            starred: params.starred,
            tags: params.tags.clone(),
            steps,
            stats: ScenarioStats::default(),
        };
        self.scenarios.create(&meta)?;

        Ok(meta)
    }

    pub fn start_run(&self, params: &StartRunParams) -> TrackResult<StartRunResponse> {
        params.validate()?;
        self.layout.ensure_initialized()?;

        let slug = &params.scenario_slug;
        if !self.scenarios.exists(slug) {
            return Err(TrackError::ScenarioNotFound { slug: slug.clone() });
        }

        let run_number = self.runs.count_runs(slug)? + 1;
        let run_id_length = self.config.run_id_length;
        let run_id = nanoid::nanoid!(run_id_length);
        let started_at = Utc::now();
        let location = self
            .runs
            .create_run(slug, &run_id, &StartRecord { started_at })?;

        log::info!(
            "Started run {} (#{}) for scenario {} at {}",
            run_id,
            run_number,
            slug,
            location.dir.display()
        );

        Ok(StartRunResponse {
            run_id,
            scenario_slug: slug.clone(),
            run_number,
            started_at,
        })
    }

    /// Record the outcome of one step, replacing any earlier outcome for the same step.
    pub fn complete_step(&self, params: &CompleteStepParams) -> TrackResult<CompleteStepResponse> {
        params.validate()?;

        let location = self.runs.find_run(&params.run_id)?;
        let mut record = match self.runs.load_open_run(&location)? {
            Some(record) => record,
            None => Run::running(
                location.run_id.clone(),
                location.scenario_slug.clone(),
                self.start_time(&location)?,
            ),
        };

        let evidence = self.evidence.list(&location, params.step_id)?;
        record.upsert_step(StepResult {
            step_id: params.step_id,
            status: params.status,
            duration: params.duration,
            error: params.error.clone(),
            evidence,
        });
        self.runs.save_result(&location, &record)?;

        let next_step_id = if params.status.continues() {
            let order = self.scenarios.step_order(&location.scenario_slug)?;
            next_step(&order, params.step_id)
        } else {
            None
        };

        log::info!(
            "Run {} step {} completed with status {:?}, next step {}",
            location.run_id,
            params.step_id,
            params.status,
            next_step_id.map_or_else(|| "none".to_string(), |id| id.to_string())
        );

        Ok(CompleteStepResponse {
            run_id: location.run_id,
            step_id: params.step_id,
            status: params.status,
            next_step_id,
        })
    }

    pub fn record_evidence(&self, params: &RecordEvidenceParams) -> TrackResult<EvidenceRecord> {
        params.validate()?;

        let location = self.runs.find_run(&params.run_id)?;
        self.runs.load_open_run(&location)?;

        self.evidence.record(
            &location,
            params.step_number,
            NewEvidence {
                kind: &params.kind,
                name: &params.name,
                data: &params.data,
                metadata: params.metadata.as_ref(),
            },
        )
    }

    /// Seal a run with its final status and fold it into the scenario statistics.
    ///
    /// Steps come from, in order of preference: the `steps` parameter when it is non-empty, the
    /// steps recorded with [Tracker::complete_step], or the `step-NN` directories found under
    /// the run.
    pub fn complete_run(&self, params: &CompleteRunParams) -> TrackResult<CompleteRunResponse> {
        params.validate()?;

        let location = self.runs.find_run(&params.run_id)?;
        let open = self.runs.load_open_run(&location)?;

        let explicit_steps = params.steps.clone().filter(|steps| !steps.is_empty());
        let steps = match (explicit_steps, &open) {
            (Some(steps), _) => steps,
            (None, Some(open)) if !open.steps.is_empty() => open.steps.clone(),
            (None, _) => self.reconstruct_steps(&location, params.failed_step)?,
        };

        let started_at = match &open {
            Some(open) => open.started_at,
            None => self.start_time(&location)?,
        };

        let mut record = Run {
            run_id: location.run_id.clone(),
            scenario_slug: location.scenario_slug.clone(),
            status: RunStatus::from(params.status),
            started_at,
            completed_at: Some(Utc::now()),
            duration: params.duration,
            steps: Vec::new(),
            failed_step: None,
            error_message: params.error_message.clone(),
        };
        record.set_steps(steps);
        let failed_step = params.failed_step.or_else(|| record.first_failed_step());
        record.failed_step = failed_step;

        self.runs.save_result(&location, &record)?;

        let stats = self.stats.apply_completed_run(
            &location.scenario_slug,
            RunOutcome {
                verdict: params.status,
                duration: params.duration,
            },
        )?;

        log::info!(
            "Run {} of scenario {} completed with status {} after {}ms",
            location.run_id,
            location.scenario_slug,
            record.status,
            record.duration
        );

        Ok(CompleteRunResponse {
            run_id: location.run_id,
            status: params.status,
            stats,
        })
    }

    /// The current record of a run, upgraded to the current shape. A run with no result yet is
    /// reported as running with no steps.
    pub fn get_run(&self, params: &GetRunParams) -> TrackResult<Run> {
        params.validate()?;

        let location = self.runs.find_run(&params.run_id)?;
        match self.runs.load_result(&location)? {
            Some(result) => Ok(result.upgrade(&location.scenario_slug, Utc::now())),
            None => Ok(Run::running(
                location.run_id.clone(),
                location.scenario_slug.clone(),
                self.start_time(&location)?,
            )),
        }
    }

    /// Start time from `run.json`, or now if the run has no start record.
    fn start_time(&self, location: &RunLocation) -> TrackResult<DateTime<Utc>> {
        match self.runs.load_start_record(location)? {
            Some(start) => Ok(start.started_at),
            None => {
                log::warn!(
                    "Run {} has no start record, using the current time",
                    location.run_id
                );
                Ok(Utc::now())
            }
        }
    }

    /// Rebuild step results from the step directories of a run that never reported its steps.
    fn reconstruct_steps(
        &self,
        location: &RunLocation,
        failed_step: Option<StepId>,
    ) -> TrackResult<Vec<StepResult>> {
        let mut steps = Vec::new();
        for step_id in self.runs.step_dirs(location)? {
            steps.push(StepResult {
                step_id,
                status: if Some(step_id) == failed_step {
                    StepStatus::Fail
                } else {
                    StepStatus::Pass
                },
                duration: 0,
                error: None,
                evidence: self.evidence.list(location, step_id)?,
            });
        }
        log::debug!(
            "Reconstructed {} steps for run {} from its evidence directories",
            steps.len(),
            location.run_id
        );
        Ok(steps)
    }
}
