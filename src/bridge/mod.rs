//! Bridge module: the boundary adapter between engine and host.
//!
//! ```text
//!            engine thread                         host thread(s)
//! ┌────────────────────────────────┐      ┌──────────────────────────────┐
//! │ Bridge<H>                      │      │ HostHandle (Clone + Send)    │
//! │  init / start / finish / pal.  │      │  on_key_down / on_key_up     │
//! │  ScreenPlanes (owned)  ────────┼─view─▶  screen_buffer / read_stable │
//! │  HostSink H ───────────────────┼─call─▶  width / height / sequence   │
//! │  EventQueue  ◀─────────────────┼─post──┤                             │
//! └────────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! The engine drives [`Bridge`]; the host receives [`HostSink`] calls and
//! talks back through a [`HostHandle`].
//!
//! [`HostSink`]: crate::host::HostSink

mod adapter;
mod handle;
mod lifecycle;


pub use adapter::Bridge;
pub use handle::HostHandle;
pub use lifecycle::{BridgeStats, Delivery, Phase};
