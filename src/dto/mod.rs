pub mod member_dto;
pub use member_dto::*;

pub mod user_dto;
pub use user_dto::*;
