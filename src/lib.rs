//! # Framebridge
//!
//! A zero-copy video and input bridge between an indexed-color game
//! engine and the host that displays it.
//!
//! The engine renders 8-bit palette indices into screen planes it owns.
//! Framebridge hands those planes to a host (a native shell, a terminal,
//! nothing at all) without copying, converts the engine palette into the
//! byte layout the host expects, and carries the host's key events back
//! into an engine-side queue.
//!
//! ## Core Concepts
//!
//! - **Lifecycle gating**: every call is checked against the current [`Phase`]
//! - **Zero-copy planes**: hosts read [`PlaneView`]s aliasing engine memory
//! - **Frame fence**: hosts on other threads read only stable frames
//! - **Push input**: hosts post events from any thread through a [`HostHandle`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use framebridge::{Bridge, NullHost};
//!
//! let mut bridge = Bridge::new(NullHost::new());
//! bridge.init_graphics(320, 200)?;
//!
//! let host = bridge.handle();
//! std::thread::spawn(move || host.on_key_down(27));
//!
//! bridge.start_frame()?;
//! bridge.plane_mut(0)?.fill(4);
//! bridge.finish_update()?;
//!
//! for event in bridge.drain_events() {
//!     // feed the engine's responder
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod ffi;
pub mod host;
pub mod video;

// Re-exports for convenience
pub use bridge::{Bridge, BridgeStats, Delivery, HostHandle, Phase};
pub use config::{BridgeConfig, HostKind, TerminalConfig};
pub use error::{AttachError, BridgeError, HostError, Result};
pub use event::{EventKind, EventQueue, EventSink, InputEvent};
pub use host::{
    CallbackHost, CallbackRuntime, Capabilities, Crossing, ForeignRuntime, HostSink,
    NativeRuntime, NullHost, TerminalHost,
};
pub use video::{FrameFence, HostPalette, Palette, PaletteLayout, PlaneView, Rgb, ScreenPlanes};
