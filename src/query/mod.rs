pub mod identifier;
pub use identifier::*;

pub mod order_by;
pub use order_by::*;

pub mod join;
pub use join::*;

pub mod projection;
pub use projection::*;

#[allow(clippy::module_inception)]
pub mod query;
pub use query::*;

pub mod builder;
pub use builder::*;

pub mod factory;
pub use factory::*;

pub mod typed_query;
pub use typed_query::*;
