//! The entities used throughout the query examples: members that optionally
//! belong to a team.

pub mod team;
pub use team::*;

pub mod member;
pub use member::*;
