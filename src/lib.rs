//! rzmq_monitor - ZeroMQ socket monitoring for rzmq.
//!
//! A `Monitor` attaches to a socket's monitor endpoint, decodes the compact
//! `[u16 code][i32 value][address]` event records published there and hands them
//! to typed observers. The producer side (`EventPublisher`) encodes the same
//! records for a monitored socket.

/// Defines the `Context`, which owns the inproc endpoint registry.
pub mod context;
/// Defines custom error types used throughout the library.
pub mod error;
/// Contains types related to message representation (Msg, MsgFlags).
pub mod message;
/// The monitor event loop, event taxonomy, argument model and dispatch table.
pub mod monitor;
/// The control-channel seam, the pair socket and the publisher side of a feed.
pub mod socket;
/// Endpoint parsing.
pub(crate) mod transport;

// Re-export core types for user convenience.
pub use context::Context;
pub use error::ZmqError;
pub use message::{Msg, MsgFlags};
pub use monitor::args::{BaseEventArgs, EventArgs, FdEventArgs, IntervalEventArgs};
pub use monitor::event::{EventKind, EventRecord};
pub use monitor::options::MonitorOptions;
pub use monitor::{Monitor, MonitorBuilder, StopHandle};
pub use socket::{ControlChannel, EventMask, EventPublisher, PairSocket, SocketEvent};

