//! Retention and pruning decisions for CloudWatch-style log groups.
//!
//! This crate owns the decision engine: which groups get a retention policy,
//! which streams are deleted and which groups are removed. It talks to the
//! log service only through [`service::LogService`] and excludes AWS SDK and
//! Lambda runtime concerns, which live in `log_minder_lambda`.

pub mod contract;
pub mod decision;
pub mod fan_out;
pub mod groups;
pub mod pagination;
pub mod retention;
pub mod retry;
pub mod service;
pub mod streams;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod time;
