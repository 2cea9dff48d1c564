//! Callback host: a native application shell registering C function pointers.
//!
//! The shell registers one callback per engine→host call. Calls the shell
//! never registered are reported through [`Capabilities`]; the bridge
//! refuses to start without `init_graphics` and `finish_update`, and skips
//! the optional ones.
//!
//! If the shell's callbacks live in a managed runtime, it also supplies a
//! [`CallbackRuntime`] so every call is wrapped in a [`Crossing`].

use super::{Capabilities, Crossing, ForeignRuntime, HostSink};
use crate::bridge::HostHandle;
use crate::error::{AttachError, HostError};
use crate::video::{HostPalette, PaletteLayout, PlaneView};
use std::os::raw::c_int;
use std::sync::Arc;
use tracing::debug;

/// `void (*)(int width, int height)`
pub type InitGraphicsFn = extern "C" fn(width: c_int, height: c_int);
/// `void (*)(const unsigned char* palette)`; 768 or 1024 bytes per layout.
pub type SetPaletteFn = extern "C" fn(palette: *const u8);
/// `void (*)(void)`
pub type StartFrameFn = extern "C" fn();
/// `void (*)(const unsigned char* screen)`; plane 0, `width * height` bytes.
pub type FinishUpdateFn = extern "C" fn(screen: *const u8);
/// `void (*)(void)`
pub type ShutdownFn = extern "C" fn();

/// `int (*)(void)`; returns 0 on success.
pub type AttachFn = extern "C" fn() -> c_int;
/// `void (*)(void)`
pub type DetachFn = extern "C" fn();
/// `int (*)(void)`; non-zero if the calling thread is already attached.
pub type IsAttachedFn = extern "C" fn() -> c_int;

/// Foreign runtime driven by C attach/detach callbacks.
#[derive(Debug, Clone, Copy)]
pub struct CallbackRuntime {
    attach: AttachFn,
    detach: DetachFn,
    is_attached: Option<IsAttachedFn>,
}

impl CallbackRuntime {
    /// Create a runtime from its attach and detach callbacks.
    pub const fn new(attach: AttachFn, detach: DetachFn, is_attached: Option<IsAttachedFn>) -> Self {
        Self {
            attach,
            detach,
            is_attached,
        }
    }
}

impl ForeignRuntime for CallbackRuntime {
    fn attach_current_thread(&self) -> Result<(), AttachError> {
        match (self.attach)() {
            0 => Ok(()),
            code => Err(AttachError::Refused { code }),
        }
    }

    fn detach_current_thread(&self) {
        (self.detach)();
    }

    fn is_current_thread_attached(&self) -> bool {
        self.is_attached.is_some_and(|f| f() != 0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CallbackTable {
    init_graphics: Option<InitGraphicsFn>,
    set_palette: Option<SetPaletteFn>,
    start_frame: Option<StartFrameFn>,
    finish_update: Option<FinishUpdateFn>,
    shutdown: Option<ShutdownFn>,
}

/// Host backed by registered C callbacks.
#[derive(Default)]
pub struct CallbackHost {
    table: CallbackTable,
    layout: PaletteLayout,
    runtime: Option<Arc<dyn ForeignRuntime>>,
}

impl CallbackHost {
    /// Create a host with no callbacks registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette layout the shell expects.
    #[must_use]
    pub fn with_layout(mut self, layout: PaletteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Wrap every callback in a crossing into `runtime`.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Arc<dyn ForeignRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replace the foreign runtime.
    pub fn set_runtime(&mut self, runtime: Option<Arc<dyn ForeignRuntime>>) {
        self.runtime = runtime;
    }

    /// Replace the palette layout.
    pub fn set_layout(&mut self, layout: PaletteLayout) {
        self.layout = layout;
    }

    /// Register (or clear) the init-graphics callback.
    pub fn set_init_graphics(&mut self, cb: Option<InitGraphicsFn>) {
        self.table.init_graphics = cb;
    }

    /// Register (or clear) the palette callback.
    pub fn set_palette_callback(&mut self, cb: Option<SetPaletteFn>) {
        self.table.set_palette = cb;
    }

    /// Register (or clear) the start-frame callback.
    pub fn set_start_frame(&mut self, cb: Option<StartFrameFn>) {
        self.table.start_frame = cb;
    }

    /// Register (or clear) the finish-update callback.
    pub fn set_finish_update(&mut self, cb: Option<FinishUpdateFn>) {
        self.table.finish_update = cb;
    }

    /// Register (or clear) the shutdown callback.
    pub fn set_shutdown(&mut self, cb: Option<ShutdownFn>) {
        self.table.shutdown = cb;
    }

    fn cross<R>(&self, call: impl FnOnce() -> R) -> Result<R, HostError> {
        match self.runtime.as_deref() {
            Some(runtime) => {
                let _crossing = Crossing::enter(runtime)?;
                Ok(call())
            }
            None => Ok(call()),
        }
    }
}

fn missing(name: &str) -> HostError {
    HostError::Unavailable(format!("{name} callback not registered"))
}

impl HostSink for CallbackHost {
    fn name(&self) -> &str {
        "callback"
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::INIT_GRAPHICS, self.table.init_graphics.is_some());
        caps.set(Capabilities::SET_PALETTE, self.table.set_palette.is_some());
        caps.set(Capabilities::START_FRAME, self.table.start_frame.is_some());
        caps.set(Capabilities::FINISH_UPDATE, self.table.finish_update.is_some());
        caps.set(Capabilities::SHUTDOWN, self.table.shutdown.is_some());
        caps
    }

    fn palette_layout(&self) -> PaletteLayout {
        self.layout
    }

    fn init_graphics(&mut self, width: u32, height: u32, _: &HostHandle) -> Result<(), HostError> {
        let cb = self.table.init_graphics.ok_or_else(|| missing("init_graphics"))?;
        let too_large = |_| HostError::Rejected(format!("surface {width}x{height} exceeds c_int"));
        let w = c_int::try_from(width).map_err(too_large)?;
        let h = c_int::try_from(height).map_err(too_large)?;
        debug!(width, height, "calling shell init_graphics");
        self.cross(|| cb(w, h))
    }

    fn set_palette(&mut self, palette: &HostPalette) -> Result<(), HostError> {
        let cb = self.table.set_palette.ok_or_else(|| missing("set_palette"))?;
        let bytes = palette.as_bytes();
        self.cross(|| cb(bytes.as_ptr()))
    }

    fn start_frame(&mut self) -> Result<(), HostError> {
        let cb = self.table.start_frame.ok_or_else(|| missing("start_frame"))?;
        self.cross(|| cb())
    }

    fn finish_update(&mut self, frame: PlaneView) -> Result<(), HostError> {
        let cb = self.table.finish_update.ok_or_else(|| missing("finish_update"))?;
        self.cross(|| cb(frame.as_ptr()))
    }

    fn shutdown_graphics(&mut self) -> Result<(), HostError> {
        match self.table.shutdown {
            Some(cb) => self.cross(|| cb()),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for CallbackHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHost")
            .field("capabilities", &self.capabilities())
            .field("layout", &self.layout)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}
