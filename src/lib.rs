pub mod analyzer;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod growth_score;
pub mod logging;
pub mod web;

pub use config::AppConfig;
pub use web::{build_rocket, start_web_server};
