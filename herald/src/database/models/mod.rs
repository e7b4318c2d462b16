//! Database models for herald.
//!
//! These models map directly to the database schema and handle
//! serialization/deserialization of JSON and enum fields.

pub mod campaign;
pub mod notification;
pub mod user;

pub use campaign::*;
pub use notification::*;
pub use user::*;
