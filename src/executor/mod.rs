use std::future::Future;

use thiserror::Error;

use crate::translator::Statement;

pub mod row;
pub use row::*;

pub mod eval;
pub mod helpers;
pub mod plan_executor;
pub use plan_executor::PlanExecutor;

#[cfg(test)]
mod _tests;

/// Failure reported by the execution boundary. Opaque to the query layer,
/// which surfaces it unchanged.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self { message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Runs translated statements. Each returned row must have one value per
/// projected column, in select-list order.
pub trait Executor {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, ExecutionError>;
}

pub trait AsyncExecutor {
    fn execute_async(&self, statement: Statement) -> impl Future<Output = Result<Vec<Row>, ExecutionError>> + Send;
}
