//! HTTP and in-memory implementations of the guuk collaborator traits.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod mock;
pub mod quizzes;

pub use backend::HttpBackend;
pub use config::GuukConfig;
pub use error::ClientError;
pub use mock::MockBackend;
