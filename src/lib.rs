//! Lending Server
//!
//! A book catalogue and loan ledger: tracks titles and their copies, lends
//! copies to borrowers and takes them back, and persists the whole state
//! through a pluggable store (JSON document, SQLite, or memory). Served as a
//! REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
