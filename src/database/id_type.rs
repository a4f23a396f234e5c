use serde::{Deserialize, Serialize};

/// How a collection assigns ids to documents persisted without one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum IdType {
    /// Random v4 UUID strings.
    #[default]
    Uuid,
    /// Sequential integers starting after the largest id seen.
    Int,
    /// Never generated; documents must carry their id.
    None,
}
