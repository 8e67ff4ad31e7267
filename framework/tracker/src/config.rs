use std::path::PathBuf;

use uitrack_core::prelude::ProjectLayout;

/// Default project root, relative to the working directory.
pub const DEFAULT_ROOT: &str = ".uitrack";
/// Run ids are nanoids of this many characters unless configured otherwise.
pub const DEFAULT_RUN_ID_LENGTH: usize = 12;

/// Options for configuring a [`crate::tracker::Tracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub root: PathBuf,
    pub run_id_length: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            root: PathBuf::from(DEFAULT_ROOT),
            run_id_length: DEFAULT_RUN_ID_LENGTH,
        }
    }
}

impl TrackerConfig {
    /// Set `root` option
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set `run_id_length` option
    ///
    /// Lengths below 8 are raised to 8 to keep collisions improbable.
    pub fn run_id_length(mut self, length: usize) -> Self {
        self.run_id_length = length.max(8);
        self
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.root.clone())
    }
}
