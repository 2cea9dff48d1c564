//! Lifecycle phases and per-call delivery outcomes.

use crate::error::HostError;
use std::fmt;

/// Lifecycle phase of a bridge.
///
/// ```text
/// Uninitialized ──init──▶ Ready ◀──finish── Rendering
///                           │  └───start────▶   │
///                           └──shutdown──▶ Shutdown ◀──┘
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Before `init_graphics`.
    #[default]
    Uninitialized = 0,
    /// Initialized, between frames.
    Ready = 1,
    /// Between `start_frame` and `finish_update`.
    Rendering = 2,
    /// After `shutdown_graphics`. Terminal.
    Shutdown = 3,
}

impl Phase {
    /// Whether frame, palette and event operations are legal.
    #[inline]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Rendering)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Rendering => "rendering",
            Self::Shutdown => "shut down",
        })
    }
}

/// Outcome of an engine→host call that does not abort the engine loop.
#[derive(Debug)]
#[must_use]
pub enum Delivery {
    /// The host received the call.
    Delivered,
    /// The host did not register a handler for this call.
    Unsupported,
    /// The crossing failed; the update was dropped for this cycle.
    Skipped(HostError),
}

impl Delivery {
    /// Whether the host received the call.
    #[inline]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Counters for engine→host deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames handed to the host.
    pub frames_delivered: u64,
    /// Frames dropped because the crossing failed.
    pub frames_skipped: u64,
    /// Palettes handed to the host.
    pub palettes_delivered: u64,
    /// Palettes dropped because the crossing failed.
    pub palettes_dropped: u64,
}
