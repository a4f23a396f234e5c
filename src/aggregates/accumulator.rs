use serde_json::Value;

use crate::executor::ExecutionError;

/// Per-group state of one aggregate call.
///
/// The executor evaluates the call's arguments for every row of the group,
/// feeds them to `update`, then reads `finalize`. `count(*)` is fed an empty
/// slice. DISTINCT is handled by the executor before `update`.
pub trait Accumulator: Send {
    fn update(&mut self, args: &[Value]) -> Result<(), ExecutionError>;

    fn finalize(&self) -> Value;
}
