use crate::message::flags::MsgFlags;
use bytes::Bytes;
use std::fmt;

/// One frame of a monitor record: the packed header, or the address that
/// follows it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Msg {
  data: Bytes,
  flags: MsgFlags,
}

impl Msg {
  pub fn from_vec(data: Vec<u8>) -> Self {
    Self::from_bytes(Bytes::from(data))
  }

  pub fn from_bytes(data: Bytes) -> Self {
    Self {
      data,
      flags: MsgFlags::empty(),
    }
  }

  pub fn from_static(data: &'static [u8]) -> Self {
    Self::from_bytes(Bytes::from_static(data))
  }

  /// Frame payload. Empty frames yield an empty slice.
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn set_flags(&mut self, flags: MsgFlags) {
    self.flags = flags;
  }

  /// True on every frame of a record except the last.
  pub fn is_more(&self) -> bool {
    self.flags.contains(MsgFlags::MORE)
  }
}

impl fmt::Debug for Msg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Addresses are short, but headers are binary; print sizes only.
    f.debug_struct("Msg")
      .field("size", &self.size())
      .field("more", &self.is_more())
      .finish()
  }
}
