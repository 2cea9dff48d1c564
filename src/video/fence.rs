//! Frame fence: a sequence counter marking when planes are stable.
//!
//! `begin` moves the counter to an odd value (engine writing), `end` back
//! to an even one (frame stable). Readers on another thread follow the
//! seqlock discipline: sample, read, sample again, and discard the read if
//! the samples differ or were odd. The engine never waits on readers.

use std::sync::atomic::{fence, AtomicU64, Ordering};

/// Sequence counter shared between the engine and host readers.
#[derive(Debug, Default)]
pub struct FrameFence {
    sequence: AtomicU64,
}

impl FrameFence {
    /// A fence at sequence 0 (stable).
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    /// Mark the start of a frame. Returns the new (odd) sequence.
    pub fn begin(&self) -> u64 {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        // Plane writes must not become visible before the odd sequence.
        fence(Ordering::Release);
        debug_assert!(seq % 2 == 1, "fence begin while already rendering");
        seq
    }

    /// Mark the frame as stable. Returns the new (even) sequence.
    pub fn end(&self) -> u64 {
        let seq = self.sequence.fetch_add(1, Ordering::Release) + 1;
        debug_assert!(seq % 2 == 0, "fence end without begin");
        seq
    }

    /// Current sequence.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Whether no frame is being written.
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.sequence() % 2 == 0
    }

    /// Number of completed frames.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.sequence() / 2
    }

    /// Run `read` only if no frame starts or ends around it.
    ///
    /// Returns `Err(sequence)` with the sequence that invalidated the read.
    pub fn read<R>(&self, read: impl FnOnce() -> R) -> Result<R, u64> {
        let before = self.sequence();
        if before % 2 == 1 {
            return Err(before);
        }
        let value = read();
        fence(Ordering::Acquire);
        let after = self.sequence.load(Ordering::Relaxed);
        if after == before {
            Ok(value)
        } else {
            Err(after)
        }
    }
}
