// src/monitor/args.rs

//! Typed views over a decoded record handed to observers.

use crate::monitor::event::{EventKind, EventRecord};
use crate::monitor::Monitor;
use std::time::Duration;

/// Payload shared by every event shape: the emitting monitor and the raw record.
#[derive(Debug, Clone, Copy)]
pub struct BaseEventArgs<'a> {
  monitor: &'a Monitor,
  record: &'a EventRecord,
}

impl<'a> BaseEventArgs<'a> {
  pub(crate) fn new(monitor: &'a Monitor, record: &'a EventRecord) -> Self {
    Self { monitor, record }
  }

  /// The monitor that decoded this event. Observers may call `stop()` on it.
  pub fn monitor(&self) -> &'a Monitor {
    self.monitor
  }

  pub fn record(&self) -> &'a EventRecord {
    self.record
  }

  /// Decoded kind, or `None` if the code was not recognised.
  pub fn kind(&self) -> Option<EventKind> {
    self.record.kind
  }

  /// Raw 32-bit value carried by the record.
  pub fn value(&self) -> i32 {
    self.record.value
  }

  pub fn address(&self) -> Option<&'a str> {
    self.record.address.as_deref()
  }
}

/// Events whose value is the OS handle of the affected connection or listener.
#[derive(Debug, Clone, Copy)]
pub struct FdEventArgs<'a> {
  base: BaseEventArgs<'a>,
  fd: i32,
}

impl<'a> FdEventArgs<'a> {
  pub fn base(&self) -> &BaseEventArgs<'a> {
    &self.base
  }

  pub fn fd(&self) -> i32 {
    self.fd
  }

  pub fn address(&self) -> Option<&'a str> {
    self.base.address()
  }
}

/// `ConnectRetried`: the value is the reconnect interval in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct IntervalEventArgs<'a> {
  base: BaseEventArgs<'a>,
  interval: Duration,
}

impl<'a> IntervalEventArgs<'a> {
  pub fn base(&self) -> &BaseEventArgs<'a> {
    &self.base
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  pub fn address(&self) -> Option<&'a str> {
    self.base.address()
  }
}

/// The argument shape passed to an observer, chosen by the record's kind.
#[derive(Debug, Clone, Copy)]
pub enum EventArgs<'a> {
  Base(BaseEventArgs<'a>),
  FileDescriptor(FdEventArgs<'a>),
  Interval(IntervalEventArgs<'a>),
}

impl<'a> EventArgs<'a> {
  /// Builds the variant that matches `record.kind`.
  ///
  /// Outcome-only kinds, unknown kinds and the wildcard get `Base`.
  pub fn for_record(monitor: &'a Monitor, record: &'a EventRecord) -> Self {
    let base = BaseEventArgs::new(monitor, record);
    match record.kind {
      Some(
        EventKind::Connected
        | EventKind::Listening
        | EventKind::Accepted
        | EventKind::Closed
        | EventKind::Disconnected,
      ) => EventArgs::FileDescriptor(FdEventArgs {
        base,
        fd: record.value,
      }),
      Some(EventKind::ConnectRetried) => EventArgs::Interval(IntervalEventArgs {
        base,
        interval: Duration::from_millis(record.value.max(0) as u64),
      }),
      _ => EventArgs::Base(base),
    }
  }

  /// The common payload, whatever the variant.
  pub fn base(&self) -> &BaseEventArgs<'a> {
    match self {
      EventArgs::Base(base) => base,
      EventArgs::FileDescriptor(args) => &args.base,
      EventArgs::Interval(args) => &args.base,
    }
  }

  pub fn record(&self) -> &'a EventRecord {
    self.base().record()
  }
}
