//! Video module: everything the engine exports to the host each frame.
//!
//! This module contains:
//! - [`ScreenPlanes`] / [`PlaneView`]: engine-owned planes and their zero-copy views
//! - [`Palette`] / [`HostPalette`]: the color table and its host byte layouts
//! - [`FrameFence`]: sequence counter telling readers when a frame is stable

mod fence;
mod palette;
mod plane;

pub use fence::FrameFence;
pub use palette::{
    HostPalette, Palette, PaletteLayout, Rgb, MAX_HOST_PALETTE_BYTES, PALETTE_BYTES,
    PALETTE_ENTRIES,
};
pub use plane::{PlaneView, ScreenPlanes};
