//! Cement-AI backend: live kiln KPIs, reports, a plant assistant and a
//! setpoint optimizer behind one HTTP API.
//!
//! Every route group is mounted under `/api` behind a single CORS policy.
//! `GET /api` returns a fixed welcome message.
//!
//! # Modules
//!
//! - [`app`]: Router assembly, CORS policy and the welcome route
//! - [`routes`]: Route groups (api, streaming, reports, chatbot, optimizer)
//! - [`plant`]: KPI types, simulation, history and the live feed
//! - [`assistant`]: Intent detection and replies for the chatbot
//! - [`optimizer`]: Surrogate kiln model and setpoint search
//! - [`state`]: Shared application state
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod app;
pub mod assistant;
pub mod config;
pub mod error;
pub mod metrics;
pub mod optimizer;
pub mod plant;
pub mod routes;
pub mod state;
pub mod utils;

pub use app::create_app;
pub use config::Config;
pub use error::{ApiError, BackendError, Result};
pub use state::AppState;
