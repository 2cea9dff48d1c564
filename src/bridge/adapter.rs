//! Bridge: the engine-side boundary adapter.
//!
//! The engine owns a [`Bridge`] and calls it at fixed points of its main
//! loop. The bridge owns the screen planes, gates every call on the
//! lifecycle [`Phase`], and forwards to the [`HostSink`].
//!
//! Failure policy:
//! - calls in the wrong phase return [`BridgeError::InvalidPhase`]
//! - a host failure during `init_graphics` aborts initialization
//! - a host failure on a per-frame call is logged and that update is
//!   dropped ([`Delivery::Skipped`]); the engine loop carries on
//!
//! The frame fence is open whenever the engine may be writing a plane:
//! from `start_frame`, or from the first write borrow taken in
//! [`Phase::Ready`], until the next `finish_update`.

use super::handle::{HostHandle, Shared};
use super::lifecycle::{BridgeStats, Delivery, Phase};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, HostError, Result};
use crate::event::{EventQueue, EventSink, InputEvent};
use crate::host::{self, Capabilities, HostSink};
use crate::video::{Palette, PlaneView, ScreenPlanes, PALETTE_BYTES};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

/// Engine-side boundary adapter.
pub struct Bridge<H: HostSink> {
    host: H,
    plane_count: usize,
    planes: Option<ScreenPlanes>,
    queue: Option<EventQueue>,
    parked: Mutex<Vec<InputEvent>>,
    shared: Arc<Shared>,
    fence_open: bool,
    stats: BridgeStats,
}

impl Bridge<Box<dyn HostSink>> {
    /// Build a bridge around the host selected by `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_queue(
            host::from_config(config),
            config.planes,
            EventQueue::new(config.event_capacity),
        ))
    }

    /// [`from_config`](Self::from_config), then initialize graphics at the
    /// configured screen size.
    pub fn init_from_config(config: &BridgeConfig) -> Result<Self> {
        let mut bridge = Self::from_config(config)?;
        bridge.init_graphics(config.width, config.height)?;
        Ok(bridge)
    }
}

impl<H: HostSink> Bridge<H> {
    /// Bridge with one plane and an unbounded event queue.
    pub fn new(host: H) -> Self {
        Self::with_queue(host, 1, EventQueue::unbounded())
    }

    /// Bridge with `planes` planes feeding `queue`.
    pub fn with_queue(host: H, planes: usize, queue: EventQueue) -> Self {
        let sink: Arc<dyn EventSink> = Arc::new(queue.clone());
        Self {
            host,
            plane_count: planes,
            planes: None,
            queue: Some(queue),
            parked: Mutex::new(Vec::new()),
            shared: Arc::new(Shared::new(sink)),
            fence_open: false,
            stats: BridgeStats::default(),
        }
    }

    /// Bridge posting into an engine-provided event sink.
    pub fn with_sink(host: H, planes: usize, sink: Arc<dyn EventSink>) -> Self {
        Self {
            host,
            plane_count: planes,
            planes: None,
            queue: None,
            parked: Mutex::new(Vec::new()),
            shared: Arc::new(Shared::new(sink)),
            fence_open: false,
            stats: BridgeStats::default(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.published.read().phase
    }

    fn require(&self, operation: &'static str, allowed: fn(Phase) -> bool) -> Result<Phase> {
        let phase = self.phase();
        if allowed(phase) {
            Ok(phase)
        } else {
            Err(BridgeError::InvalidPhase { operation, phase })
        }
    }

    fn set_phase(&self, phase: Phase) {
        self.shared.published.write().phase = phase;
    }

    /// Mark the planes as being written.
    fn open_fence(&mut self) {
        if !self.fence_open {
            self.shared.fence.begin();
            self.fence_open = true;
        }
    }

    /// Mark the planes as stable again.
    fn close_fence(&mut self) {
        if self.fence_open {
            self.shared.fence.end();
            self.fence_open = false;
        }
    }

    /// Allocate the planes and establish the host display surface.
    ///
    /// Valid once, from [`Phase::Uninitialized`]. Any host failure here is
    /// fatal: the bridge stays uninitialized and the error is returned.
    pub fn init_graphics(&mut self, width: u32, height: u32) -> Result<()> {
        match self.phase() {
            Phase::Uninitialized => {}
            Phase::Ready | Phase::Rendering => return Err(BridgeError::AlreadyInitialized),
            phase @ Phase::Shutdown => {
                return Err(BridgeError::InvalidPhase {
                    operation: "init_graphics",
                    phase,
                })
            }
        }

        let missing = Capabilities::REQUIRED - self.host.capabilities();
        if !missing.is_empty() {
            let err = HostError::Unavailable(format!(
                "{} host lacks {missing:?}",
                self.host.name()
            ));
            error!(error = %err, "cannot initialize graphics");
            return Err(BridgeError::HostInit(err));
        }

        let planes = ScreenPlanes::new(width, height, self.plane_count)?;
        {
            let mut published = self.shared.published.write();
            published.width = width;
            published.height = height;
            published.views = planes.views();
            published.phase = Phase::Ready;
        }
        self.planes = Some(planes);

        let handle = self.handle();
        if let Err(err) = self.host.init_graphics(width, height, &handle) {
            error!(host = self.host.name(), error = %err, "host failed to initialize graphics");
            self.withdraw(Phase::Uninitialized);
            self.planes = None;
            return Err(BridgeError::HostInit(err));
        }

        debug!(
            host = self.host.name(),
            width,
            height,
            planes = self.plane_count,
            "graphics initialized"
        );
        Ok(())
    }

    /// Tear down the host surface and release the planes.
    ///
    /// Terminal: afterwards every frame, palette and event call fails.
    /// Posts already past their phase check are waited for; their events
    /// stay available through [`drain_events`](Self::drain_events).
    pub fn shutdown_graphics(&mut self) -> Result<()> {
        self.require("shutdown_graphics", Phase::is_live)?;
        self.close_fence();

        self.withdraw(Phase::Shutdown);
        self.settle_posts();
        if let Err(err) = self.host.shutdown_graphics() {
            warn!(host = self.host.name(), error = %err, "host shutdown failed");
        }
        self.planes = None;

        debug!(host = self.host.name(), stats = ?self.stats, "graphics shut down");
        Ok(())
    }

    /// Wait for in-flight posts, draining our own queue so that a full
    /// bounded queue cannot hold a poster forever.
    fn settle_posts(&self) {
        while self.shared.in_flight.load(Ordering::Acquire) > 0 {
            if let Some(queue) = &self.queue {
                queue.drain_into(&mut self.parked.lock());
            }
            thread::yield_now();
        }
    }

    /// Retract published views so no host reader can reach the planes.
    fn withdraw(&self, phase: Phase) {
        let mut published = self.shared.published.write();
        published.views.clear();
        published.width = 0;
        published.height = 0;
        published.phase = phase;
    }

    /// A new frame is about to be rendered.
    pub fn start_frame(&mut self) -> Result<Delivery> {
        self.require("start_frame", |p| p == Phase::Ready)?;
        self.set_phase(Phase::Rendering);
        self.open_fence();

        if !self.host.capabilities().contains(Capabilities::START_FRAME) {
            return Ok(Delivery::Unsupported);
        }
        Ok(match self.host.start_frame() {
            Ok(()) => Delivery::Delivered,
            Err(err) => {
                warn!(host = self.host.name(), error = %err, "start_frame skipped");
                Delivery::Skipped(err)
            }
        })
    }

    /// The frame in plane 0 is complete; hand it to the host.
    ///
    /// Also accepted from [`Phase::Ready`] for engines that present
    /// without a preceding `start_frame` (screen wipes, menus).
    pub fn finish_update(&mut self) -> Result<Delivery> {
        self.require("finish_update", Phase::is_live)?;
        self.open_fence();
        self.close_fence();
        self.set_phase(Phase::Ready);

        let frame = self.expose_frame_buffer(0)?;
        Ok(match self.host.finish_update(frame) {
            Ok(()) => {
                self.stats.frames_delivered += 1;
                Delivery::Delivered
            }
            Err(err) => {
                self.stats.frames_skipped += 1;
                warn!(host = self.host.name(), error = %err, "frame skipped");
                Delivery::Skipped(err)
            }
        })
    }

    // =========================================================================
    // Frame / palette export
    // =========================================================================

    /// Convert the engine palette (256 RGB triples) and hand it to the host.
    pub fn set_palette(&mut self, raw: &[u8; PALETTE_BYTES]) -> Result<Delivery> {
        self.require("set_palette", Phase::is_live)?;

        if !self.host.capabilities().contains(Capabilities::SET_PALETTE) {
            return Ok(Delivery::Unsupported);
        }

        let converted = Palette::from_raw(raw).encode(self.host.palette_layout());
        Ok(match self.host.set_palette(&converted) {
            Ok(()) => {
                self.stats.palettes_delivered += 1;
                Delivery::Delivered
            }
            Err(err) => {
                self.stats.palettes_dropped += 1;
                warn!(host = self.host.name(), error = %err, "palette dropped");
                Delivery::Skipped(err)
            }
        })
    }

    /// [`set_palette`](Self::set_palette) from an unsized slice.
    pub fn set_palette_slice(&mut self, raw: &[u8]) -> Result<Delivery> {
        let raw: &[u8; PALETTE_BYTES] =
            raw.try_into().map_err(|_| BridgeError::SizeMismatch {
                requested: raw.len(),
                available: PALETTE_BYTES,
            })?;
        self.set_palette(raw)
    }

    fn live_planes(&self, operation: &'static str) -> Result<&ScreenPlanes> {
        self.require(operation, Phase::is_live)?;
        self.planes.as_ref().ok_or(BridgeError::InvalidPhase {
            operation,
            phase: Phase::Uninitialized,
        })
    }

    /// Zero-copy view of a plane.
    pub fn expose_frame_buffer(&self, plane: usize) -> Result<PlaneView> {
        self.live_planes("expose_frame_buffer")?.view(plane)
    }

    /// Read access to a plane.
    pub fn plane(&self, plane: usize) -> Result<&[u8]> {
        self.live_planes("plane")?.plane(plane)
    }

    /// Write access to a plane, for the renderer.
    ///
    /// Taken outside `start_frame`, this opens the frame fence until the
    /// next `finish_update`.
    pub fn plane_mut(&mut self, plane: usize) -> Result<&mut [u8]> {
        self.require("plane_mut", Phase::is_live)?;
        self.open_fence();
        match self.planes.as_mut() {
            Some(planes) => planes.plane_mut(plane),
            None => Err(BridgeError::InvalidPhase {
                operation: "plane_mut",
                phase: Phase::Uninitialized,
            }),
        }
    }

    /// The planes themselves, for pixel-level access. Opens the frame
    /// fence like [`plane_mut`](Self::plane_mut).
    pub fn planes_mut(&mut self) -> Result<&mut ScreenPlanes> {
        self.require("planes_mut", Phase::is_live)?;
        self.open_fence();
        self.planes.as_mut().ok_or(BridgeError::InvalidPhase {
            operation: "planes_mut",
            phase: Phase::Uninitialized,
        })
    }

    /// Copy plane 0 into `out`, which must be exactly one plane long.
    pub fn read_screen(&self, out: &mut [u8]) -> Result<()> {
        let screen = self.live_planes("read_screen")?.plane(0)?;
        if out.len() != screen.len() {
            return Err(BridgeError::SizeMismatch {
                requested: out.len(),
                available: screen.len(),
            });
        }
        out.copy_from_slice(screen);
        Ok(())
    }

    /// Screen width, once initialized.
    pub fn width(&self) -> Option<u32> {
        self.planes.as_ref().map(ScreenPlanes::width)
    }

    /// Screen height, once initialized.
    pub fn height(&self) -> Option<u32> {
        self.planes.as_ref().map(ScreenPlanes::height)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Pull hook for the engine loop.
    ///
    /// Hosts push events through [`HostHandle`], so there is nothing to
    /// poll.
    #[inline]
    pub const fn poll_events(&self) {}

    /// Start-of-tic hook. Nothing to do under the push model.
    #[inline]
    pub const fn start_tic(&self) {}

    /// Update-without-blit hook. Nothing to do; presentation happens in
    /// [`finish_update`](Self::finish_update).
    #[inline]
    pub const fn update_no_blit(&self) {}

    /// The bridge's own event queue (absent when built with a custom sink).
    pub const fn event_queue(&self) -> Option<&EventQueue> {
        self.queue.as_ref()
    }

    /// Drain pending events from the bridge's own queue, including any
    /// that landed while shutting down.
    pub fn drain_events(&self) -> Vec<InputEvent> {
        let mut events = std::mem::take(&mut *self.parked.lock());
        if let Some(queue) = &self.queue {
            queue.drain_into(&mut events);
        }
        events
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Handle for host-originated calls. Cheap to clone, usable from any thread.
    pub fn handle(&self) -> HostHandle {
        HostHandle::new(self.shared.clone())
    }

    /// Delivery counters.
    pub const fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Current frame fence sequence.
    pub fn frame_sequence(&self) -> u64 {
        self.shared.fence.sequence()
    }

    /// The host.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (e.g. to register callbacks before init).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: HostSink> Drop for Bridge<H> {
    fn drop(&mut self) {
        if self.phase().is_live() {
            let _ = self.shutdown_graphics();
        }
    }
}

impl<H: HostSink> std::fmt::Debug for Bridge<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("host", &self.host.name())
            .field("phase", &self.phase())
            .field("planes", &self.planes)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
