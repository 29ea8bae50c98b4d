//! Forge Registry - Backend Library
//!
//! Package registry for Forge source packages: scoped API keys, semver-ordered
//! version history, yanking, and download accounting.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
