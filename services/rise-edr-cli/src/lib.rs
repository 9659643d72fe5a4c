//! Driver for RISE EDR location queries.
//!
//! Wires the HTTP client, the shared result cache and the resolver
//! together from configuration, and renders query results as JSON.

pub mod command;
pub mod config;

pub use command::{execute, render_error, Command};
pub use config::DriverConfig;
