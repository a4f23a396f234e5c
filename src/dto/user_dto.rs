use serde::{Deserialize, Serialize};

use crate::{expr::ValueType, materializer::ProjectionTarget};

/// Same shape as `MemberDto` under different names; filled through aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub name: String,
    pub age: i64,
}

impl UserDto {
    pub fn new(name: String, age: i64) -> Self {
        Self { name, age }
    }
}

impl ProjectionTarget for UserDto {
    const FIELDS: &'static [(&'static str, ValueType)] = &[("name", ValueType::String), ("age", ValueType::Int)];
}
