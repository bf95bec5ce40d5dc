//! classdesk-server: HTTP API for the classdesk education platform
//!
//! Students, courses, classes and enrollments over Postgres, with Stripe
//! checkout, QuickBooks invoicing and Webflow publishing behind provider
//! traits.
//!
//! # Modules
//!
//! - `config`: provider and checkout settings from the environment
//! - `models`: validated request types and pagination
//! - `db`: pool, migrations and one repository per table
//! - `auth`: bearer token verification
//! - `providers`: Stripe, QuickBooks and Webflow REST clients
//! - `services`: checkout, invoicing and publishing flows
//! - `jobs`: the heartbeat job
//! - `http`: router, extractors, error mapping and route handlers

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod jobs;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use http::{build_router, run_server, ServerConfig};
pub use state::AppState;
