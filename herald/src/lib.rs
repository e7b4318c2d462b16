//! herald: scheduled campaign delivery and real-time notification fan-out.
//!
//! Campaigns are resolved to an audience, delivered over email and live
//! channels, and their outcome recorded once. Live notifications reach
//! connected clients through a WebSocket fan-out registry.

pub mod api;
pub mod audience;
pub mod campaign;
pub mod channels;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod notification;
pub mod realtime;
pub mod services;

pub use error::{Error, Result};
