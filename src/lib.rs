pub mod commands;
pub mod config;
pub mod error;
pub mod job;
pub mod report;
pub mod runner;
pub mod ui;
pub mod utils;

pub use error::BenchError;
