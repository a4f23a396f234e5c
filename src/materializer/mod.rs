pub mod selection;
pub use selection::*;

pub mod tuple;
pub use tuple::*;

pub mod projections;
pub use projections::*;

pub mod query_results;
pub use query_results::*;
