//! AWS-oriented adapters and handlers for the log minder.
//!
//! This crate owns runtime integration details (CloudWatch Logs and Lambda
//! clients, Lambda handlers, the command line) and delegates every decision
//! to `log_minder_core`.

pub mod adapters;
pub mod cli;
pub mod handlers;
pub mod runtime;
pub mod settings;
pub mod telemetry;
