//! Host integrations.
//!
//! Every host implements [`HostSink`], the engine→host half of the
//! boundary. Which host a program uses is a configuration choice:
//!
//! - [`NullHost`]: accepts everything, displays nothing
//! - [`CallbackHost`]: C function-pointer table registered by a native shell
//! - [`TerminalHost`]: paints frames into the terminal with `crossterm`
//!
//! Calls that must run inside a foreign runtime go through a
//! [`Crossing`], which attaches the calling thread for the duration of
//! one call.

mod callback;
mod crossing;
mod null;
mod terminal;

pub use callback::{
    AttachFn, CallbackHost, CallbackRuntime, DetachFn, FinishUpdateFn, InitGraphicsFn,
    IsAttachedFn, SetPaletteFn, ShutdownFn, StartFrameFn,
};
pub use crossing::{Crossing, ForeignRuntime, NativeRuntime};
pub use null::NullHost;
pub use terminal::{compose_frame, TerminalHost};

use crate::bridge::HostHandle;
use crate::config::{BridgeConfig, HostKind};
use crate::error::HostError;
use crate::video::{HostPalette, PaletteLayout, PlaneView};
use bitflags::bitflags;

bitflags! {
    /// Calls a host is able to receive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Display surface setup.
        const INIT_GRAPHICS = 0b0000_0001;
        /// Palette updates.
        const SET_PALETTE   = 0b0000_0010;
        /// Frame start notification.
        const START_FRAME   = 0b0000_0100;
        /// Frame presentation.
        const FINISH_UPDATE = 0b0000_1000;
        /// Surface teardown.
        const SHUTDOWN      = 0b0001_0000;

        /// Calls without which a host cannot display anything.
        const REQUIRED = Self::INIT_GRAPHICS.bits() | Self::FINISH_UPDATE.bits();
    }
}

/// The engine→host side of the boundary.
///
/// All methods run on the engine thread. A host that needs to call back
/// into the engine from its own threads keeps a clone of the
/// [`HostHandle`] passed to [`init_graphics`](Self::init_graphics).
pub trait HostSink: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Which calls this host can receive.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    /// Palette byte layout this host expects.
    fn palette_layout(&self) -> PaletteLayout {
        PaletteLayout::Rgb
    }

    /// Establish the display surface for a `width` x `height` screen.
    fn init_graphics(&mut self, width: u32, height: u32, handle: &HostHandle)
        -> Result<(), HostError>;

    /// Receive a converted palette.
    fn set_palette(&mut self, palette: &HostPalette) -> Result<(), HostError>;

    /// A new frame is about to be rendered.
    fn start_frame(&mut self) -> Result<(), HostError>;

    /// The frame in `frame` (plane 0) is stable and may be displayed.
    fn finish_update(&mut self, frame: PlaneView) -> Result<(), HostError>;

    /// Release whatever `init_graphics` acquired.
    fn shutdown_graphics(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}

impl<H: HostSink + ?Sized> HostSink for Box<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn palette_layout(&self) -> PaletteLayout {
        (**self).palette_layout()
    }

    fn init_graphics(
        &mut self,
        width: u32,
        height: u32,
        handle: &HostHandle,
    ) -> Result<(), HostError> {
        (**self).init_graphics(width, height, handle)
    }

    fn set_palette(&mut self, palette: &HostPalette) -> Result<(), HostError> {
        (**self).set_palette(palette)
    }

    fn start_frame(&mut self) -> Result<(), HostError> {
        (**self).start_frame()
    }

    fn finish_update(&mut self, frame: PlaneView) -> Result<(), HostError> {
        (**self).finish_update(frame)
    }

    fn shutdown_graphics(&mut self) -> Result<(), HostError> {
        (**self).shutdown_graphics()
    }
}

/// Build the host selected by `config`.
///
/// A callback host starts with an empty table; the native shell must
/// register its callbacks before `init_graphics`.
pub fn from_config(config: &BridgeConfig) -> Box<dyn HostSink> {
    match config.host {
        HostKind::Null => Box::new(NullHost::new().with_layout(config.palette_layout)),
        HostKind::Callback => Box::new(CallbackHost::new().with_layout(config.palette_layout)),
        HostKind::Terminal => Box::new(TerminalHost::new(config.terminal.clone())),
    }
}
