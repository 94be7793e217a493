// src/socket/pair_socket.rs

use crate::context::Context;
use crate::error::ZmqError;
use crate::message::Msg;
use crate::socket::events::RecordReceiver;
use crate::socket::ControlChannel;
use crate::transport::{parse_endpoint, Endpoint};

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Queue claimed from an inproc binding while connected.
struct Connection {
  name: String,
  binding_id: usize,
  rx: RecordReceiver,
}

/// Exclusive, receive-only control channel that connects to an `EventPublisher`
/// by inproc name.
pub struct PairSocket {
  context: Context,
  handle: usize,
  connection: Option<Connection>,
  closed: bool,
}

impl PairSocket {
  pub(crate) fn new(context: Context, handle: usize) -> Self {
    Self {
      context,
      handle,
      connection: None,
      closed: false,
    }
  }

  pub fn is_connected(&self) -> bool {
    self.connection.is_some()
  }

  /// Gives the claimed queue back to the context registry.
  fn release(&mut self) {
    if let Some(conn) = self.connection.take() {
      self.context.inner().release_inproc(&conn.name, conn.binding_id, conn.rx);
      tracing::debug!(socket_handle = self.handle, inproc_name = %conn.name, "Pair socket detached");
    }
  }
}

#[async_trait]
impl ControlChannel for PairSocket {
  async fn connect(&mut self, endpoint: &str) -> Result<(), ZmqError> {
    if self.closed {
      return Err(ZmqError::InvalidState("Socket is closed"));
    }
    if self.connection.is_some() {
      return Err(ZmqError::InvalidState("Pair socket is already connected"));
    }
    let Endpoint::Inproc(name) = parse_endpoint(endpoint)?;
    let (binding_id, rx) = self.context.inner().claim_inproc(&name)?;
    tracing::debug!(socket_handle = self.handle, endpoint, "Pair socket connected");
    self.connection = Some(Connection { name, binding_id, rx });
    Ok(())
  }

  async fn disconnect(&mut self, endpoint: &str) -> Result<(), ZmqError> {
    let Endpoint::Inproc(name) = parse_endpoint(endpoint)?;
    let attached = self.connection.as_ref().is_some_and(|conn| conn.name == name);
    if !attached {
      return Err(ZmqError::InvalidState("Pair socket is not connected to endpoint"));
    }
    self.release();
    Ok(())
  }

  async fn poll(&mut self, timeout: Duration) -> Result<Vec<Msg>, ZmqError> {
    let conn = self
      .connection
      .as_ref()
      .ok_or(ZmqError::InvalidState("Pair socket is not connected"))?;
    match tokio::time::timeout(timeout, conn.rx.recv()).await {
      Ok(Ok(frames)) => Ok(frames),
      // Publisher gone and queue drained.
      Ok(Err(_closed)) => Err(ZmqError::ConnectionClosed),
      Err(_elapsed) => Err(ZmqError::Timeout),
    }
  }

  async fn close(&mut self) {
    self.release();
    self.closed = true;
    tracing::debug!(socket_handle = self.handle, "Pair socket closed");
  }
}

impl Drop for PairSocket {
  fn drop(&mut self) {
    self.release();
  }
}

impl fmt::Debug for PairSocket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PairSocket")
      .field("handle", &self.handle)
      .field("connected_to", &self.connection.as_ref().map(|c| c.name.as_str()))
      .field("closed", &self.closed)
      .finish()
  }
}
