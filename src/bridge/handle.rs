//! Host-side handle: the operations a host may call from any thread.
//!
//! A [`HostHandle`] shares state with its [`Bridge`](super::Bridge) but
//! never touches the engine's planes mutably. Plane views are published
//! at initialization and withdrawn at shutdown under a write lock, so a
//! reader holding the read lock can never observe freed planes.
//!
//! Posting never blocks under that lock. A post registers itself as in
//! flight while the bridge is live, releases the lock and only then
//! inserts into the sink; shutdown waits for in-flight posts to land.

use super::lifecycle::Phase;
use crate::error::{BridgeError, Result};
use crate::event::{EventSink, InputEvent};
use crate::video::{FrameFence, PlaneView};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// State published by the engine for host threads.
#[derive(Debug, Default)]
pub(crate) struct Published {
    pub(crate) phase: Phase,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) views: Vec<PlaneView>,
}

/// State shared between a bridge and its host handles.
pub(crate) struct Shared {
    pub(crate) published: RwLock<Published>,
    pub(crate) fence: FrameFence,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) in_flight: AtomicUsize,
}

impl Shared {
    pub(crate) fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            published: RwLock::new(Published::default()),
            fence: FrameFence::new(),
            sink,
            in_flight: AtomicUsize::new(0),
        }
    }
}

/// Thread-safe handle for host-originated calls.
#[derive(Clone)]
pub struct HostHandle {
    shared: Arc<Shared>,
}

impl HostHandle {
    pub(crate) const fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Lock published state, failing unless the bridge is live.
    fn live(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Published>> {
        let published = self.shared.published.read();
        if published.phase.is_live() {
            Ok(published)
        } else {
            Err(BridgeError::InvalidPhase {
                operation,
                phase: published.phase,
            })
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.published.read().phase
    }

    /// Post a key press.
    pub fn on_key_down(&self, code: i32) -> Result<()> {
        self.post(InputEvent::key_down(code))
    }

    /// Post a key release.
    pub fn on_key_up(&self, code: i32) -> Result<()> {
        self.post(InputEvent::key_up(code))
    }

    /// Post one event to the engine queue.
    ///
    /// May block while a bounded queue is full, but never while holding
    /// the published-state lock, so the engine keeps running frames and
    /// can drain. No event lands after `shutdown_graphics` has returned.
    pub fn post(&self, event: InputEvent) -> Result<()> {
        let _in_flight = {
            let _published = self.live("post_event")?;
            InFlight::register(&self.shared.in_flight)
        };
        trace!(kind = ?event.kind, code = event.code, "event posted");
        self.shared.sink.post_event(event)
    }

    /// Posts that passed the phase check but have not landed yet.
    pub fn pending_posts(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Screen width in pixels.
    pub fn screen_width(&self) -> Result<u32> {
        Ok(self.live("screen_width")?.width)
    }

    /// Screen height in pixels.
    pub fn screen_height(&self) -> Result<u32> {
        Ok(self.live("screen_height")?.height)
    }

    /// Number of allocated planes.
    pub fn plane_count(&self) -> Result<usize> {
        Ok(self.live("plane_count")?.views.len())
    }

    /// Zero-copy view of a plane. `size` must equal the plane length.
    pub fn screen_buffer(&self, plane: usize, size: usize) -> Result<PlaneView> {
        let published = self.live("screen_buffer")?;
        let view = lookup(&published, plane)?;
        if size != view.len() {
            return Err(BridgeError::SizeMismatch {
                requested: size,
                available: view.len(),
            });
        }
        Ok(view)
    }

    /// Current frame fence sequence. Even means stable.
    pub fn frame_sequence(&self) -> u64 {
        self.shared.fence.sequence()
    }

    /// Copy a plane into `out` only if no frame is in progress around it.
    ///
    /// `out` must be exactly one plane long. Returns
    /// [`BridgeError::FrameInProgress`] when the engine is writing the
    /// planes or started writing during the copy; the caller should retry
    /// after the next `finish_update`. On error `out` holds garbage.
    #[allow(unsafe_code)]
    pub fn read_stable(&self, plane: usize, out: &mut [u8]) -> Result<()> {
        let published = self.live("read_stable")?;
        let view = lookup(&published, plane)?;
        if out.len() != view.len() {
            return Err(BridgeError::SizeMismatch {
                requested: out.len(),
                available: view.len(),
            });
        }
        self.shared
            .fence
            .read(|| {
                // SAFETY: the planes stay allocated while `published` is
                // read-locked and the lengths match; the fence discards
                // copies that overlap an engine write.
                unsafe { view.copy_volatile(out) }
            })
            .map_err(|sequence| BridgeError::FrameInProgress { sequence })
    }
}

/// Counts one post between its phase check and its insert.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn register(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn lookup(published: &Published, plane: usize) -> Result<PlaneView> {
    published
        .views
        .get(plane)
        .copied()
        .ok_or(BridgeError::PlaneOutOfRange {
            index: plane,
            planes: published.views.len(),
        })
}

impl std::fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandle")
            .field("phase", &self.phase())
            .field("sequence", &self.frame_sequence())
            .finish()
    }
}
