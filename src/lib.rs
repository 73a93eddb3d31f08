//! Gateway in front of a generative-model API for project-idea and image requests
//!
//! A parsed request and an API credential go in; a normalized result (or a
//! classified error with an HTTP status hint) comes out. The single upstream call is
//! bounded by a deadline and cancelled when the deadline wins.

pub mod ai;
pub mod app;
pub mod error;
pub mod extract;
pub mod models;
pub mod payload;
pub mod prompts;
pub mod schema;
pub mod selector;

pub use app::Gateway;
pub use error::{ErrorKind, GatewayError, Result};
