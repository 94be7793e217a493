// src/monitor/event.rs

//! Event taxonomy and wire record decoding.
//!
//! A monitor record arrives as one or two frames:
//! `[u16 LE event code][i32 LE value]` followed by an optional `[address]` frame.

use crate::message::Msg;
use bytes::Buf;
use std::fmt;

/// Length of the fixed header carried in the first frame of a record.
pub const EVENT_HEADER_LEN: usize = 6;

// libzmq monitor event flags (ZMQ_EVENT_*).
pub const EVENT_CONNECTED: u16 = 0x0001;
pub const EVENT_CONNECT_DELAYED: u16 = 0x0002;
pub const EVENT_CONNECT_RETRIED: u16 = 0x0004;
pub const EVENT_LISTENING: u16 = 0x0008;
pub const EVENT_BIND_FAILED: u16 = 0x0010;
pub const EVENT_ACCEPTED: u16 = 0x0020;
pub const EVENT_ACCEPT_FAILED: u16 = 0x0040;
pub const EVENT_CLOSED: u16 = 0x0080;
pub const EVENT_CLOSE_FAILED: u16 = 0x0100;
pub const EVENT_DISCONNECTED: u16 = 0x0200;
pub const EVENT_MONITOR_STOPPED: u16 = 0x0400;
pub const EVENT_ALL: u16 = 0xFFFF;

/// Observable socket state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  /// Wildcard. Matches every record and never appears on the wire as a kind.
  AllEvents,
  Connected,
  ConnectDelayed,
  ConnectRetried,
  Listening,
  BindFailed,
  Accepted,
  AcceptFailed,
  Closed,
  CloseFailed,
  Disconnected,
  Stopped,
}

impl EventKind {
  /// Number of kinds, wildcard included. Sizes the dispatch table.
  pub const COUNT: usize = 12;

  /// Every kind in table order. `AllEvents` comes first.
  pub const ALL: [EventKind; EventKind::COUNT] = [
    EventKind::AllEvents,
    EventKind::Connected,
    EventKind::ConnectDelayed,
    EventKind::ConnectRetried,
    EventKind::Listening,
    EventKind::BindFailed,
    EventKind::Accepted,
    EventKind::AcceptFailed,
    EventKind::Closed,
    EventKind::CloseFailed,
    EventKind::Disconnected,
    EventKind::Stopped,
  ];

  /// The wire code for this kind. `AllEvents` maps to the all-bits mask.
  pub const fn code(self) -> u16 {
    match self {
      EventKind::AllEvents => EVENT_ALL,
      EventKind::Connected => EVENT_CONNECTED,
      EventKind::ConnectDelayed => EVENT_CONNECT_DELAYED,
      EventKind::ConnectRetried => EVENT_CONNECT_RETRIED,
      EventKind::Listening => EVENT_LISTENING,
      EventKind::BindFailed => EVENT_BIND_FAILED,
      EventKind::Accepted => EVENT_ACCEPTED,
      EventKind::AcceptFailed => EVENT_ACCEPT_FAILED,
      EventKind::Closed => EVENT_CLOSED,
      EventKind::CloseFailed => EVENT_CLOSE_FAILED,
      EventKind::Disconnected => EVENT_DISCONNECTED,
      EventKind::Stopped => EVENT_MONITOR_STOPPED,
    }
  }

  /// Maps a wire code back to a concrete kind. Unknown codes, and the
  /// wildcard mask itself, yield `None`.
  pub const fn from_code(code: u16) -> Option<EventKind> {
    match code {
      EVENT_CONNECTED => Some(EventKind::Connected),
      EVENT_CONNECT_DELAYED => Some(EventKind::ConnectDelayed),
      EVENT_CONNECT_RETRIED => Some(EventKind::ConnectRetried),
      EVENT_LISTENING => Some(EventKind::Listening),
      EVENT_BIND_FAILED => Some(EventKind::BindFailed),
      EVENT_ACCEPTED => Some(EventKind::Accepted),
      EVENT_ACCEPT_FAILED => Some(EventKind::AcceptFailed),
      EVENT_CLOSED => Some(EventKind::Closed),
      EVENT_CLOSE_FAILED => Some(EventKind::CloseFailed),
      EVENT_DISCONNECTED => Some(EventKind::Disconnected),
      EVENT_MONITOR_STOPPED => Some(EventKind::Stopped),
      _ => None,
    }
  }

  /// Slot of this kind in the dispatch table.
  pub(crate) const fn index(self) -> usize {
    match self {
      EventKind::AllEvents => 0,
      EventKind::Connected => 1,
      EventKind::ConnectDelayed => 2,
      EventKind::ConnectRetried => 3,
      EventKind::Listening => 4,
      EventKind::BindFailed => 5,
      EventKind::Accepted => 6,
      EventKind::AcceptFailed => 7,
      EventKind::Closed => 8,
      EventKind::CloseFailed => 9,
      EventKind::Disconnected => 10,
      EventKind::Stopped => 11,
    }
  }

  pub fn is_wildcard(self) -> bool {
    self == EventKind::AllEvents
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// One decoded monitor record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
  /// Raw wire code. Zero if the header frame was missing or short.
  pub code: u16,
  /// Decoded kind. `None` for unknown codes or a missing header.
  pub kind: Option<EventKind>,
  /// File descriptor, errno or interval depending on the kind.
  pub value: i32,
  /// Endpoint address, present only when a second frame was received.
  pub address: Option<String>,
}

impl EventRecord {
  /// Decodes a record from the frames of one multipart message.
  ///
  /// Never fails: missing or short frames leave the affected fields at their
  /// defaults, and frames beyond the second are ignored.
  pub fn decode(frames: &[Msg]) -> Self {
    let mut record = EventRecord::default();

    if let Some(header) = frames.first().map(Msg::data) {
      if header.len() >= EVENT_HEADER_LEN {
        let mut buf = header;
        record.code = buf.get_u16_le();
        record.value = buf.get_i32_le();
        record.kind = EventKind::from_code(record.code);
      } else {
        tracing::trace!(len = header.len(), "Short monitor header frame, keeping defaults");
      }
    }

    if let Some(address) = frames.get(1) {
      record.address = Some(String::from_utf8_lossy(address.data()).into_owned());
    }

    if frames.len() > 2 {
      tracing::trace!(frames = frames.len(), "Ignoring extra frames in monitor record");
    }
    record
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn header(code: u16, value: i32) -> Msg {
    let mut data = Vec::with_capacity(EVENT_HEADER_LEN);
    data.extend_from_slice(&code.to_le_bytes());
    data.extend_from_slice(&value.to_le_bytes());
    Msg::from_vec(data)
  }

  #[test]
  fn codes_round_trip_for_concrete_kinds() {
    for kind in EventKind::ALL.iter().copied().filter(|k| !k.is_wildcard()) {
      assert_eq!(EventKind::from_code(kind.code()), Some(kind));
    }
    assert_eq!(EventKind::from_code(EVENT_ALL), None);
  }

  #[test]
  fn table_indexes_match_order() {
    for (i, kind) in EventKind::ALL.iter().enumerate() {
      assert_eq!(kind.index(), i);
    }
  }

  #[test]
  fn single_frame_has_no_address() {
    let record = EventRecord::decode(&[header(EVENT_CONNECTED, 42)]);
    assert_eq!(record.kind, Some(EventKind::Connected));
    assert_eq!(record.value, 42);
    assert_eq!(record.address, None);
  }

  #[test]
  fn second_frame_becomes_address() {
    let record = EventRecord::decode(&[header(EVENT_CLOSED, 7), Msg::from_static(b"tcp://127.0.0.1:5556")]);
    assert_eq!(record.kind, Some(EventKind::Closed));
    assert_eq!(record.value, 7);
    assert_eq!(record.address.as_deref(), Some("tcp://127.0.0.1:5556"));
  }

  #[test]
  fn invalid_utf8_address_is_decoded_lossily() {
    let record = EventRecord::decode(&[header(EVENT_CLOSED, 7), Msg::from_static(&[0xff, 0xfe, b'a'])]);
    assert_eq!(record.kind, Some(EventKind::Closed));
    assert_eq!(record.address.as_deref(), Some("\u{fffd}\u{fffd}a"));
  }

  #[test]
  fn empty_address_frame_is_an_empty_string() {
    let record = EventRecord::decode(&[header(EVENT_ACCEPTED, 3), Msg::from_static(b"")]);
    assert_eq!(record.address.as_deref(), Some(""));
  }

  #[test]
  fn negative_values_decode_signed() {
    let record = EventRecord::decode(&[header(EVENT_BIND_FAILED, -98)]);
    assert_eq!(record.value, -98);
  }

  #[test]
  fn extra_frames_are_ignored() {
    let record = EventRecord::decode(&[
      header(EVENT_ACCEPTED, 3),
      Msg::from_static(b"inproc://a"),
      Msg::from_static(b"junk"),
    ]);
    assert_eq!(record.address.as_deref(), Some("inproc://a"));
  }

  #[test]
  fn empty_and_short_records_keep_defaults() {
    assert_eq!(EventRecord::decode(&[]), EventRecord::default());

    let short = EventRecord::decode(&[Msg::from_static(&[0x01, 0x00, 0x2a])]);
    assert_eq!(short.kind, None);
    assert_eq!(short.value, 0);
    assert_eq!(short.code, 0);
  }

  #[test]
  fn unknown_code_decodes_without_kind() {
    let record = EventRecord::decode(&[header(0x0800, 5)]);
    assert_eq!(record.code, 0x0800);
    assert_eq!(record.kind, None);
    assert_eq!(record.value, 5);
  }
}
