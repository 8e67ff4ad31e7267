use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use uitrack_core::layout::RUNS_DIR;
use uitrack_core::prelude::{
    IoResultExt, ProjectLayout, RunLocation, StepId, TrackError, TrackResult,
};
use uitrack_model::{Run, RunResult, StartRecord};
use walkdir::WalkDir;

use crate::storage::{read_json, write_json};

/// Storage of run records.
///
/// Callers only ever know a run by its id, so [RunRepository::find_run] is the way in to every
/// other operation on an existing run.
pub trait RunRepository: Send + Sync {
    /// Locate a run by id across all scenarios.
    fn find_run(&self, run_id: &str) -> TrackResult<RunLocation>;

    /// Number of run directories that already exist for a scenario.
    fn count_runs(&self, scenario_slug: &str) -> TrackResult<usize>;

    /// Create the storage root for a new run and write its start record.
    fn create_run(
        &self,
        scenario_slug: &str,
        run_id: &str,
        start: &StartRecord,
    ) -> TrackResult<RunLocation>;

    fn load_start_record(&self, run: &RunLocation) -> TrackResult<Option<StartRecord>>;

    /// Load the stored result in whatever shape it was written.
    fn load_result(&self, run: &RunLocation) -> TrackResult<Option<RunResult>>;

    fn save_result(&self, run: &RunLocation, record: &Run) -> TrackResult<()>;

    /// Step ids that have a `step-NN` directory under the run, in order.
    fn step_dirs(&self, run: &RunLocation) -> TrackResult<Vec<StepId>>;

    /// Load the in-progress record of a run that may still be written to.
    ///
    /// Fails with [TrackError::RunAlreadyCompleted] if the stored status is terminal. A missing
    /// result, or one that is still `running`, is accepted.
    fn load_open_run(&self, run: &RunLocation) -> TrackResult<Option<Run>> {
        match self.load_result(run)? {
            Some(result) if result.status().is_terminal() => Err(TrackError::RunAlreadyCompleted {
                run_id: run.run_id.clone(),
                status: result.status().to_string(),
            }),
            Some(result) => Ok(Some(result.upgrade(&run.scenario_slug, Utc::now()))),
            None => Ok(None),
        }
    }
}

/// A [RunRepository] over the project directory tree.
///
/// Keeps an index of run id to scenario slug. Entries are checked against the filesystem on
/// every lookup and the whole index is rebuilt from a directory scan on a miss.
pub struct FsRunRepository {
    layout: ProjectLayout,
    index: Mutex<HashMap<String, String>>,
}

impl FsRunRepository {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            index: Mutex::new(HashMap::new()),
        }
    }

    /// Scan `scenarios/*/runs/*` for run directories.
    fn scan(&self) -> HashMap<String, String> {
        let mut found = HashMap::new();
        let walker = WalkDir::new(self.layout.scenarios_dir())
            .min_depth(3)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() != 2 || e.file_name() == RUNS_DIR);

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            let slug = entry
                .path()
                .parent()
                .and_then(|runs| runs.parent())
                .and_then(|scenario| scenario.file_name())
                .map(|name| name.to_string_lossy().to_string());
            if let Some(slug) = slug {
                found.entry(run_id).or_insert(slug);
            }
        }

        found
    }
}

impl RunRepository for FsRunRepository {
    fn find_run(&self, run_id: &str) -> TrackResult<RunLocation> {
        self.layout.ensure_initialized()?;

        let mut index = self.index.lock();
        if let Some(slug) = index.get(run_id) {
            let location = self.layout.run_location(slug, run_id);
            if location.dir.is_dir() {
                return Ok(location);
            }
            log::debug!("Run {run_id} moved or was removed, rescanning");
        }

        *index = self.scan();
        log::debug!("Indexed {} runs", index.len());

        index
            .get(run_id)
            .map(|slug| self.layout.run_location(slug, run_id))
            .ok_or_else(|| TrackError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    fn count_runs(&self, scenario_slug: &str) -> TrackResult<usize> {
        let runs_dir = self.layout.runs_dir(scenario_slug);
        if !runs_dir.is_dir() {
            return Ok(0);
        }

        let mut count = 0;
        for entry in WalkDir::new(&runs_dir).min_depth(1).max_depth(1) {
            let entry = entry
                .map_err(std::io::Error::from)
                .io_err("list runs in", &runs_dir)?;
            if entry.file_type().is_dir() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn create_run(
        &self,
        scenario_slug: &str,
        run_id: &str,
        start: &StartRecord,
    ) -> TrackResult<RunLocation> {
        let location = self.layout.run_location(scenario_slug, run_id);
        let runs_dir = self.layout.runs_dir(scenario_slug);
        std::fs::create_dir_all(&runs_dir).io_err("create directory", &runs_dir)?;
        std::fs::create_dir(&location.dir).io_err("create run directory", &location.dir)?;
        write_json(&location.start_record_path(), start)?;

        self.index
            .lock()
            .insert(run_id.to_string(), scenario_slug.to_string());

        Ok(location)
    }

    fn load_start_record(&self, run: &RunLocation) -> TrackResult<Option<StartRecord>> {
        read_json(&run.start_record_path())
    }

    fn load_result(&self, run: &RunLocation) -> TrackResult<Option<RunResult>> {
        read_json(&run.result_path())
    }

    fn save_result(&self, run: &RunLocation, record: &Run) -> TrackResult<()> {
        write_json(&run.result_path(), record)
    }

    fn step_dirs(&self, run: &RunLocation) -> TrackResult<Vec<StepId>> {
        let mut steps = Vec::new();
        for entry in WalkDir::new(&run.dir).min_depth(1).max_depth(1) {
            let entry = entry
                .map_err(std::io::Error::from)
                .io_err("list steps in", &run.dir)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(step_id) = StepId::from_dir_name(&entry.file_name().to_string_lossy()) {
                steps.push(step_id);
            }
        }
        steps.sort();
        Ok(steps)
    }
}
