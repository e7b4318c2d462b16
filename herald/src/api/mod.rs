//! HTTP and WebSocket surface.
//!
//! Exposes campaign execution, notification reads and the live event stream.

pub mod error;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
