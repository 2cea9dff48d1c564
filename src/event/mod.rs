//! Event module: host input flowing into the engine.
//!
//! ```text
//! ┌──────────────┐  on_key_down/up   ┌────────────┐   drain per tic   ┌────────┐
//! │ Host thread  │ ────────────────▶ │ EventQueue │ ────────────────▶ │ Engine │
//! └──────────────┘                   └────────────┘                   └────────┘
//! ```

pub mod keys;
mod messages;
mod queue;

pub use messages::{EventKind, InputEvent};
pub use queue::{EventQueue, EventSink};
