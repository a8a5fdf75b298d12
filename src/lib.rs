pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod repository;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
