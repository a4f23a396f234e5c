pub mod id_type;
pub use id_type::*;

pub mod id_manager;
pub use id_manager::*;

pub mod db_config;
pub use db_config::*;

pub mod store_error;
pub use store_error::*;

pub mod db_collection;
pub use db_collection::*;

pub mod db;
pub use db::*;
