//! Placeholder host: accepts every call and displays nothing.

use super::HostSink;
use crate::bridge::HostHandle;
use crate::error::HostError;
use crate::video::{HostPalette, PaletteLayout, PlaneView};
use tracing::debug;

/// Host that counts calls and otherwise ignores them.
#[derive(Debug, Default)]
pub struct NullHost {
    layout: PaletteLayout,
    surface: Option<(u32, u32)>,
    palettes: u64,
    frames_started: u64,
    frames_finished: u64,
}

impl NullHost {
    /// Create a null host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette layout to request.
    #[must_use]
    pub const fn with_layout(mut self, layout: PaletteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Surface size, if initialized.
    pub const fn surface(&self) -> Option<(u32, u32)> {
        self.surface
    }

    /// Palettes received.
    pub const fn palettes(&self) -> u64 {
        self.palettes
    }

    /// Frames started.
    pub const fn frames_started(&self) -> u64 {
        self.frames_started
    }

    /// Frames presented.
    pub const fn frames_finished(&self) -> u64 {
        self.frames_finished
    }
}

impl HostSink for NullHost {
    fn name(&self) -> &str {
        "null"
    }

    fn palette_layout(&self) -> PaletteLayout {
        self.layout
    }

    fn init_graphics(&mut self, width: u32, height: u32, _: &HostHandle) -> Result<(), HostError> {
        debug!(width, height, "null host surface");
        self.surface = Some((width, height));
        Ok(())
    }

    fn set_palette(&mut self, _: &HostPalette) -> Result<(), HostError> {
        self.palettes += 1;
        Ok(())
    }

    fn start_frame(&mut self) -> Result<(), HostError> {
        self.frames_started += 1;
        Ok(())
    }

    fn finish_update(&mut self, _: PlaneView) -> Result<(), HostError> {
        self.frames_finished += 1;
        Ok(())
    }

    fn shutdown_graphics(&mut self) -> Result<(), HostError> {
        self.surface = None;
        Ok(())
    }
}
