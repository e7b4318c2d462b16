//! Real-time fan-out of live events to connected recipients.
//!
//! The [`FanOutRegistry`] owns the only shared mutable map in the engine:
//! recipient id -> live connections. WebSocket sessions register a
//! [`ConnectionHandle`] after the client identifies itself and unregister it on
//! disconnect; services emit [`LiveEvent`]s by recipient id.

mod events;
mod registry;

pub use events::{ClientMessage, LiveEvent, event_names};
pub use registry::{ConnectionHandle, ConnectionId, FanOutRegistry, DEFAULT_CONNECTION_BUFFER};
