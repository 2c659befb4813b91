pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
mod http;
mod mcp;
pub mod model;
pub mod pagination;
pub mod report;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, Result};
