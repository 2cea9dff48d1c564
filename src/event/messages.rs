//! Input event types carried from the host to the engine.

/// Kind of a discrete input event.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A key was pressed.
    KeyDown = 0,
    /// A key was released.
    KeyUp = 1,
}

/// One input event in the engine's key-code space.
///
/// Hosts translate their native key codes before posting; see
/// [`keys`](super::keys).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    /// Press or release.
    pub kind: EventKind,
    /// Engine key code.
    pub code: i32,
}

impl InputEvent {
    /// A key press.
    #[inline]
    pub const fn key_down(code: i32) -> Self {
        Self {
            kind: EventKind::KeyDown,
            code,
        }
    }

    /// A key release.
    #[inline]
    pub const fn key_up(code: i32) -> Self {
        Self {
            kind: EventKind::KeyUp,
            code,
        }
    }

    /// Whether this is a press.
    #[inline]
    pub const fn is_down(&self) -> bool {
        matches!(self.kind, EventKind::KeyDown)
    }
}
