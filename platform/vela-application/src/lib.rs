pub mod backtesting;
pub mod config;
pub mod reporting;
mod shared;

pub use shared::config_sha256;
