use uitrack_core::prelude::{IoResultExt, ProjectLayout, StepId, TrackError, TrackResult};
use uitrack_model::ScenarioMeta;

use crate::storage::{read_yaml_value, write_yaml};

/// Read access to scenario definitions, and their one-off creation.
pub struct ScenarioStore {
    layout: ProjectLayout,
}

impl ScenarioStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.layout.scenario_dir(slug).is_dir()
    }

    /// The parsed `meta.yaml`, or `None` for a scenario that has none.
    pub fn load_meta(&self, slug: &str) -> TrackResult<Option<ScenarioMeta>> {
        let path = self.layout.meta_path(slug);
        match read_yaml_value(&path)? {
            None | Some(serde_yaml::Value::Null) => Ok(None),
            Some(value) => serde_yaml::from_value(value)
                .map(Some)
                .map_err(|e| TrackError::yaml(&path, e)),
        }
    }

    /// The scenario's step ids in definition order. Empty when there is no `meta.yaml`.
    pub fn step_order(&self, slug: &str) -> TrackResult<Vec<StepId>> {
        Ok(self
            .load_meta(slug)?
            .map(|meta| meta.step_order())
            .unwrap_or_default())
    }

    /// Create the scenario directory, its `runs/` directory and `meta.yaml`.
    pub fn create(&self, meta: &ScenarioMeta) -> TrackResult<()> {
        let dir = self.layout.scenario_dir(&meta.slug);
        if dir.exists() {
            return Err(TrackError::ScenarioAlreadyExists {
                slug: meta.slug.clone(),
            });
        }

        let runs_dir = self.layout.runs_dir(&meta.slug);
        std::fs::create_dir_all(&runs_dir).io_err("create directory", &runs_dir)?;
        write_yaml(&self.layout.meta_path(&meta.slug), meta)?;

        log::info!("Created scenario {} ({})", meta.slug, meta.title);
        Ok(())
    }
}
