pub mod error;
pub use error::*;

pub mod config;
pub use config::*;

pub mod expr;
pub use expr::{CaseBuilder, Expr, Expressions, IntoExpr, Named, Predicate, SqlType, ValueType};

pub mod entity;
pub use entity::{Association, Entity, EntityPath, EntityRef, EntitySchema};

pub mod query;
pub use query::{JpaExpressions, Query, QueryBuilder, QueryFactory, TypedQuery};

pub mod analyzer;

pub mod aggregates;

pub mod translator;
pub use translator::{Dialect, Statement, Translator};

pub mod materializer;
pub use materializer::{Projections, ProjectionTarget, QueryResults, Selection, Tuple};

pub mod executor;
pub use executor::{AsyncExecutor, ExecutionError, Executor, Row};

pub mod planner;

pub mod database;
pub use database::{Db, DbCommon, DbConfig, IdType, StoreError};

pub mod domain;
pub mod dto;
