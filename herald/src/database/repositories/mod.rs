//! Repository layer for database access.
//!
//! Each repository is a trait with an sqlx implementation so services can be
//! exercised against fakes or a real SQLite database.

pub mod campaign;
pub mod notification;
pub mod user;

pub use campaign::*;
pub use notification::*;
pub use user::*;
