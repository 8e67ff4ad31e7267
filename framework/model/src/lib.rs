mod evidence;
mod result;
mod run;
mod scenario;
mod stats;

pub use evidence::{EvidenceKind, EvidenceMeta, EVIDENCE_META_SUFFIX};
pub use result::{legacy_step_of, LegacyRunResult, RunResult};
pub use run::{Run, RunStatus, RunVerdict, StartRecord, StepResult, StepStatus};
pub use scenario::{ScenarioMeta, StepDefinition};
pub use stats::{RunOutcome, ScenarioStats};
