use serde::{Deserialize, Serialize};

use crate::{expr::ValueType, materializer::ProjectionTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDto {
    pub username: String,
    pub age: i64,
}

impl MemberDto {
    pub fn new(username: String, age: i64) -> Self {
        Self { username, age }
    }
}

impl ProjectionTarget for MemberDto {
    const FIELDS: &'static [(&'static str, ValueType)] = &[("username", ValueType::String), ("age", ValueType::Int)];
}
