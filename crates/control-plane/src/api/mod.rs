// HTTP API modules

pub mod common;
pub mod users;

pub use common::ApiError;
