mod error;
pub mod layout;
mod step_id;

pub mod prelude {
    pub use crate::error::{IoResultExt, TrackError, TrackResult};
    pub use crate::layout::{is_valid_slug, ProjectLayout, RunLocation};
    pub use crate::step_id::{InvalidStepId, StepId};
}
