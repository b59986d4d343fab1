//! Quiz lifecycle, generation dispatch and history aggregation for guuk.
//!
//! This crate holds the client-side orchestration logic: the per-attempt quiz
//! state machine, quiz authoring, routing of generation requests to the right
//! capability, and the history view model. All I/O goes through the traits in
//! [`traits`], implemented by `guuk-client`.

pub mod authoring;
pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod quiz_session;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use error::{CoreError, ServiceError};
