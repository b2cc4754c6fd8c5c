//! Streaming Transport
//!
//! WebSocket endpoint, control-frame protocol and the per-connection send
//! primitive.

pub mod connections;
pub mod protocol;
pub mod server;

pub use connections::{ConnectionMap, SendError};
pub use protocol::{ControlFrame, FrameError};
pub use server::{ServerError, StartStatus, StopStatus, StreamServer};
