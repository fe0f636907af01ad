//! HTTP Transport Module
//!
//! Warp routes for the person resource and the helpers that build their
//! responses.

pub mod response;
pub mod routes;

pub use response::{create_error_response, ResponseBuilder, REQUEST_ID_HEADER};
pub use routes::{handle_rejection, person_routes};
