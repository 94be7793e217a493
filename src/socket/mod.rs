// src/socket/mod.rs

/// Defines `SocketEvent`, the wire encoder and the publisher side of a monitor feed.
pub mod events;
/// The inproc `PairSocket` control channel.
pub mod pair_socket;

use crate::error::ZmqError;
use crate::message::Msg;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// The side channel a `Monitor` reads records from.
///
/// Implementations own the transport details; the monitor only relies on the
/// bounded `poll` contract below.
#[async_trait]
pub trait ControlChannel: Send + fmt::Debug {
  /// Attaches the channel to the publisher at `endpoint`.
  async fn connect(&mut self, endpoint: &str) -> Result<(), ZmqError>;

  /// Detaches from `endpoint`.
  async fn disconnect(&mut self, endpoint: &str) -> Result<(), ZmqError>;

  /// Waits up to `timeout` for the next multipart record.
  ///
  /// Returns `ZmqError::Timeout` when nothing arrived in time. Any other error
  /// is treated as fatal by the monitor loop.
  async fn poll(&mut self, timeout: Duration) -> Result<Vec<Msg>, ZmqError>;

  /// Releases the channel's resources. Called exactly once by `Monitor::dispose`.
  async fn close(&mut self);
}

pub use events::{encode_event, EventMask, EventPublisher, SocketEvent, DEFAULT_MONITOR_CAPACITY};
pub use pair_socket::PairSocket;
