//! Person Service Library
//!
//! An HTTP service exposing a "person" resource whose inputs (JSON bodies,
//! query strings and path segments) are checked against declarative field
//! constraints before being echoed back in shape.

pub mod config;
pub mod constraints;
pub mod error;
pub mod formats;
pub mod health;
pub mod http;
pub mod logging;
pub mod models;
pub mod server;
pub mod validator;

// Test modules
#[cfg(test)]
mod tests;

// Re-export key types
pub use config::{LogFormat, RequestLimits, ServerConfig};
pub use error::{ApiError, ApiResult, ValidationFailure, Violation, ViolationKind};
pub use formats::{Format, FormatCheck, FormatCheckers};
pub use health::{HealthChecker, HealthStatus};
pub use models::{
    Greeting, HairColor, Location, Person, PersonDetailQuery, PersonIdPath, PersonUpdate,
};
pub use server::PersonServer;
pub use validator::RequestValidator;
