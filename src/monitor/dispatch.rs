// src/monitor/dispatch.rs

//! Fixed dispatch table from `EventKind` to observer sets.

use crate::monitor::args::{BaseEventArgs, EventArgs};
use crate::monitor::event::{EventKind, EventRecord};
use crate::monitor::Monitor;
use std::fmt;

/// A registered callback. Typed `on_*` registrations are adapted into this shape.
pub type Observer = Box<dyn Fn(&EventArgs<'_>) + Send + Sync + 'static>;

/// Observer sets indexed by `EventKind::index()`. Slot 0 is the wildcard.
///
/// Filled by `MonitorBuilder` and frozen once the monitor is built, so the run
/// loop reads it without locking.
pub(crate) struct DispatchTable {
  slots: [Vec<Observer>; EventKind::COUNT],
}

impl DispatchTable {
  pub(crate) fn new() -> Self {
    Self {
      slots: std::array::from_fn(|_| Vec::new()),
    }
  }

  pub(crate) fn register(&mut self, kind: EventKind, observer: Observer) {
    self.slots[kind.index()].push(observer);
  }

  /// Number of observers registered for `kind` (not counting the wildcard).
  pub(crate) fn observer_count(&self, kind: EventKind) -> usize {
    self.slots[kind.index()].len()
  }

  /// Invokes the wildcard set, then the set registered for `record.kind`.
  ///
  /// Argument shapes are only built for sets that are non-empty. Observer panics
  /// are not caught here.
  pub(crate) fn dispatch(&self, monitor: &Monitor, record: &EventRecord) {
    let wildcard = &self.slots[EventKind::AllEvents.index()];
    if !wildcard.is_empty() {
      let args = EventArgs::Base(BaseEventArgs::new(monitor, record));
      for observer in wildcard {
        observer(&args);
      }
    }

    let specific = match record.kind {
      Some(kind) if !kind.is_wildcard() => &self.slots[kind.index()],
      _ => return,
    };
    if !specific.is_empty() {
      let args = EventArgs::for_record(monitor, record);
      for observer in specific {
        observer(&args);
      }
    }
  }
}

impl fmt::Debug for DispatchTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for kind in EventKind::ALL {
      let count = self.observer_count(kind);
      if count > 0 {
        map.entry(&kind, &count);
      }
    }
    map.finish()
  }
}
