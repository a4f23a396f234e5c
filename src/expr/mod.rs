pub mod literal;
pub use literal::*;

pub mod truth;
pub use truth::*;

pub mod operators;
pub use operators::*;

pub mod value_type;
pub use value_type::*;

pub mod column;
pub use column::*;

pub mod function;
pub use function::*;

pub mod scalar_expr;
pub use scalar_expr::*;

pub mod predicate;
pub use predicate::*;

pub mod typed;
pub use typed::*;

pub mod case_builder;
pub use case_builder::*;

pub mod expressions;
pub use expressions::*;
