use uitrack_core::prelude::StepId;

/// The step that follows `current` in a scenario's step order.
///
/// Returns `None` when `current` is the last step, isn't part of the order at all, or the
/// scenario defines no steps.
pub fn next_step(order: &[StepId], current: StepId) -> Option<StepId> {
    let position = order.iter().position(|step| *step == current)?;
    order.get(position + 1).copied()
}
