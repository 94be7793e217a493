// src/socket/events.rs

use crate::context::Context;
use crate::message::{Msg, MsgFlags};
use crate::monitor::event::*;

use bitflags::bitflags;
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Represents significant events occurring within a socket or its connections.
/// Mirrors the libzmq socket monitor events and their value semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
  // --- Connecter Events ---
  /// Connection established. `fd` is the connection's OS handle.
  Connected { endpoint: String, fd: i32 },
  /// Synchronous connect failed; the attempt continues in the background.
  ConnectDelayed { endpoint: String, errno: i32 },
  /// Retrying connection after `interval`.
  ConnectRetried { endpoint: String, interval: Duration },

  // --- Listener Events ---
  /// Socket has started listening on the endpoint. `fd` is the listener handle.
  Listening { endpoint: String, fd: i32 },
  /// Socket failed to bind to the endpoint.
  BindFailed { endpoint: String, errno: i32 },
  /// Accepted a new connection.
  Accepted { endpoint: String, fd: i32 },
  /// Failed to accept a new connection.
  AcceptFailed { endpoint: String, errno: i32 },

  // --- General Connection Events ---
  /// Connection or listener closed.
  Closed { endpoint: String, fd: i32 },
  /// Failed to close a connection cleanly.
  CloseFailed { endpoint: String, errno: i32 },
  /// Peer disconnected or connection terminated unexpectedly.
  Disconnected { endpoint: String, fd: i32 },

  /// The monitor feed itself is shutting down.
  MonitorStopped,
}

impl SocketEvent {
  pub fn kind(&self) -> EventKind {
    match self {
      SocketEvent::Connected { .. } => EventKind::Connected,
      SocketEvent::ConnectDelayed { .. } => EventKind::ConnectDelayed,
      SocketEvent::ConnectRetried { .. } => EventKind::ConnectRetried,
      SocketEvent::Listening { .. } => EventKind::Listening,
      SocketEvent::BindFailed { .. } => EventKind::BindFailed,
      SocketEvent::Accepted { .. } => EventKind::Accepted,
      SocketEvent::AcceptFailed { .. } => EventKind::AcceptFailed,
      SocketEvent::Closed { .. } => EventKind::Closed,
      SocketEvent::CloseFailed { .. } => EventKind::CloseFailed,
      SocketEvent::Disconnected { .. } => EventKind::Disconnected,
      SocketEvent::MonitorStopped => EventKind::Stopped,
    }
  }

  /// The 32-bit value written to the wire for this event.
  pub fn value(&self) -> i32 {
    match self {
      SocketEvent::Connected { fd, .. }
      | SocketEvent::Listening { fd, .. }
      | SocketEvent::Accepted { fd, .. }
      | SocketEvent::Closed { fd, .. }
      | SocketEvent::Disconnected { fd, .. } => *fd,
      SocketEvent::ConnectDelayed { errno, .. }
      | SocketEvent::BindFailed { errno, .. }
      | SocketEvent::AcceptFailed { errno, .. }
      | SocketEvent::CloseFailed { errno, .. } => *errno,
      SocketEvent::ConnectRetried { interval, .. } => i32::try_from(interval.as_millis()).unwrap_or(i32::MAX),
      SocketEvent::MonitorStopped => 0,
    }
  }

  pub fn endpoint(&self) -> &str {
    match self {
      SocketEvent::Connected { endpoint, .. }
      | SocketEvent::ConnectDelayed { endpoint, .. }
      | SocketEvent::ConnectRetried { endpoint, .. }
      | SocketEvent::Listening { endpoint, .. }
      | SocketEvent::BindFailed { endpoint, .. }
      | SocketEvent::Accepted { endpoint, .. }
      | SocketEvent::AcceptFailed { endpoint, .. }
      | SocketEvent::Closed { endpoint, .. }
      | SocketEvent::CloseFailed { endpoint, .. }
      | SocketEvent::Disconnected { endpoint, .. } => endpoint,
      SocketEvent::MonitorStopped => "",
    }
  }
}

bitflags! {
    /// Selects which events a publisher emits. Bit values are the wire codes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u16 {
        const CONNECTED = EVENT_CONNECTED;
        const CONNECT_DELAYED = EVENT_CONNECT_DELAYED;
        const CONNECT_RETRIED = EVENT_CONNECT_RETRIED;
        const LISTENING = EVENT_LISTENING;
        const BIND_FAILED = EVENT_BIND_FAILED;
        const ACCEPTED = EVENT_ACCEPTED;
        const ACCEPT_FAILED = EVENT_ACCEPT_FAILED;
        const CLOSED = EVENT_CLOSED;
        const CLOSE_FAILED = EVENT_CLOSE_FAILED;
        const DISCONNECTED = EVENT_DISCONNECTED;
        const MONITOR_STOPPED = EVENT_MONITOR_STOPPED;
        const ALL = EVENT_ALL;
    }
}

impl Default for EventMask {
  fn default() -> Self {
    EventMask::ALL
  }
}

impl From<EventKind> for EventMask {
  fn from(kind: EventKind) -> Self {
    EventMask::from_bits_retain(kind.code())
  }
}

/// Encodes an event into the two-frame monitor record format.
///
/// Frame 0 is `[u16 LE code][i32 LE value]` flagged `MORE`; frame 1 is the endpoint.
pub fn encode_event(event: &SocketEvent) -> Vec<Msg> {
  let mut header = BytesMut::with_capacity(EVENT_HEADER_LEN);
  header.put_u16_le(event.kind().code());
  header.put_i32_le(event.value());

  let mut first = Msg::from_bytes(header.freeze());
  first.set_flags(MsgFlags::MORE);
  let second = Msg::from_vec(event.endpoint().as_bytes().to_vec());
  vec![first, second]
}

// Type alias for the channel sender carrying encoded monitor records.
pub type RecordSender = async_channel::Sender<Vec<Msg>>;
// Type alias for the channel receiver carrying encoded monitor records.
pub type RecordReceiver = async_channel::Receiver<Vec<Msg>>;

// Default capacity for monitor record queues.
pub const DEFAULT_MONITOR_CAPACITY: usize = 100;

/// Producer side of a monitor feed, bound to an inproc endpoint.
///
/// Publishing never blocks: when the queue is full the record is dropped,
/// matching libzmq's behaviour for slow monitor readers. Dropping the
/// publisher emits `MonitorStopped` (if selected) and unbinds the endpoint.
pub struct EventPublisher {
  context: Context,
  name: String,
  binding_id: usize,
  tx: RecordSender,
  events: EventMask,
  closed: AtomicBool,
}

impl EventPublisher {
  pub(crate) fn new(context: Context, name: String, binding_id: usize, tx: RecordSender, events: EventMask) -> Self {
    tracing::debug!(inproc_name = %name, binding_id, ?events, "Monitor publisher bound");
    Self {
      context,
      name,
      binding_id,
      tx,
      events,
      closed: AtomicBool::new(false),
    }
  }

  /// The endpoint a monitor should connect to.
  pub fn endpoint(&self) -> String {
    format!("inproc://{}", self.name)
  }

  /// Encodes and enqueues `event`. Returns `true` if it was queued.
  pub fn publish(&self, event: SocketEvent) -> bool {
    if self.closed.load(Ordering::Acquire) {
      return false;
    }
    let kind = event.kind();
    if !self.events.intersects(EventMask::from(kind)) {
      tracing::trace!(inproc_name = %self.name, %kind, "Event filtered by mask");
      return false;
    }
    match self.tx.try_send(encode_event(&event)) {
      Ok(()) => true,
      Err(async_channel::TrySendError::Full(_)) => {
        tracing::warn!(inproc_name = %self.name, %kind, "Monitor queue full, dropping event");
        false
      }
      Err(async_channel::TrySendError::Closed(_)) => {
        tracing::debug!(inproc_name = %self.name, %kind, "Monitor queue closed, dropping event");
        false
      }
    }
  }

  /// Emits `MonitorStopped` and unbinds the endpoint. Idempotent.
  pub fn close(&self) {
    if self
      .closed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return;
    }
    if self.events.contains(EventMask::MONITOR_STOPPED) {
      // Best effort; a full queue loses the stop record.
      if let Err(e) = self.tx.try_send(encode_event(&SocketEvent::MonitorStopped)) {
        tracing::trace!(inproc_name = %self.name, full = e.is_full(), "Stop record not queued");
      }
    }
    self.context.inner().unregister_inproc(&self.name, self.binding_id);
    self.tx.close();
    tracing::debug!(inproc_name = %self.name, binding_id = self.binding_id, "Monitor publisher closed");
  }
}

impl Drop for EventPublisher {
  fn drop(&mut self) {
    self.close();
  }
}

impl fmt::Debug for EventPublisher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventPublisher")
      .field("endpoint", &self.endpoint())
      .field("events", &self.events)
      .field("queued", &self.tx.len())
      .field("closed", &self.closed.load(Ordering::Relaxed))
      .finish()
  }
}
