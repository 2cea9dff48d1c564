//! Error types for the bridge.
//!
//! Three families of failure cross the boundary:
//! - usage-sequencing errors (an operation called in the wrong [`Phase`])
//! - attach failures when entering a foreign runtime
//! - host resource lookups that fail during initialization

use crate::bridge::Phase;
use std::io;
use thiserror::Error;

/// Errors returned by bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Operation is not legal in the current lifecycle phase.
    #[error("{operation} is not valid while {phase}")]
    InvalidPhase {
        /// The operation that was attempted.
        operation: &'static str,
        /// The phase the bridge was in.
        phase: Phase,
    },

    /// `init_graphics` was called a second time.
    #[error("graphics already initialized")]
    AlreadyInitialized,

    /// Width, height or plane count was zero or overflowed.
    #[error("invalid screen geometry {width}x{height} with {planes} plane(s)")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Requested plane count.
        planes: usize,
    },

    /// Plane index beyond the allocated planes.
    #[error("plane {index} out of range ({planes} allocated)")]
    PlaneOutOfRange {
        /// Requested plane.
        index: usize,
        /// Number of allocated planes.
        planes: usize,
    },

    /// Requested view size differs from the plane length.
    #[error("requested {requested} bytes but plane holds {available}")]
    SizeMismatch {
        /// Bytes requested by the host.
        requested: usize,
        /// Bytes in the plane.
        available: usize,
    },

    /// The engine is between `start_frame` and `finish_update`.
    #[error("frame {sequence} is still being rendered")]
    FrameInProgress {
        /// Fence sequence observed by the reader.
        sequence: u64,
    },

    /// The engine event queue no longer accepts events.
    #[error("engine event queue is closed")]
    QueueClosed,

    /// The host failed while establishing the display surface.
    #[error("host initialization failed: {0}")]
    HostInit(#[source] HostError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error while loading or saving configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised by a [`HostSink`](crate::host::HostSink).
#[derive(Error, Debug)]
pub enum HostError {
    /// A handler, callback or surface could not be located.
    #[error("host resource unavailable: {0}")]
    Unavailable(String),

    /// The calling thread could not enter the foreign runtime.
    #[error(transparent)]
    Attach(#[from] AttachError),

    /// The host refused the call.
    #[error("host rejected call: {0}")]
    Rejected(String),

    /// Terminal or OS level I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure to attach the calling thread to a foreign runtime.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The runtime returned a non-zero status.
    #[error("foreign runtime refused attach (status {code})")]
    Refused {
        /// Status code reported by the runtime.
        code: i32,
    },

    /// The runtime has been torn down.
    #[error("foreign runtime is no longer available")]
    Detached,
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
