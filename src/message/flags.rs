use bitflags::bitflags;

bitflags! {
    /// Per-frame flags on a monitor record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MsgFlags: u8 {
        /// Set on the header frame when an address frame follows.
        const MORE = 0b01;
    }
}
