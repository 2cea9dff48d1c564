//! C Foreign Function Interface (FFI) for Framebridge.
//!
//! This module lets a native application shell drive a bridge from C.
//! The engine side owns a `FramebridgeBridge`; the shell registers its
//! callbacks on it before `framebridge_init_graphics`, and takes a
//! `FramebridgeHost` handle for its own threads (input, readback).
//!
//! # Safety
//!
//! All functions that accept pointers require valid pointers or NULL.
//! NULL is reported, never dereferenced. The caller is responsible for
//! destroying every handle it creates.
//!
//! # Example (C)
//!
//! ```c
//! #include "framebridge.h"
//!
//! static void on_init(int w, int h) { create_window(w, h); }
//! static void on_finish(const unsigned char* screen) { blit(screen); }
//!
//! int main() {
//!     FramebridgeBridge* bridge = framebridge_new(1, FRAMEBRIDGE_LAYOUT_BGRA);
//!     framebridge_callback_init_graphics(bridge, on_init);
//!     framebridge_callback_finish_update(bridge, on_finish);
//!     if (framebridge_init_graphics(bridge, 320, 200) != FRAMEBRIDGE_OK) return 1;
//!
//!     FramebridgeHost* host = framebridge_host_handle(bridge);
//!     framebridge_on_key_down(host, 27);
//!
//!     // Engine loop...
//!
//!     framebridge_host_destroy(host);
//!     framebridge_destroy(bridge);
//!     return 0;
//! }
//! ```

// FFI modules intentionally use unsafe and no_mangle
#![allow(unsafe_code)]
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use crate::bridge::{Bridge, Delivery, HostHandle};
use crate::error::BridgeError;
use crate::event::{EventQueue, InputEvent};
use crate::host::{
    AttachFn, CallbackHost, CallbackRuntime, DetachFn, FinishUpdateFn, InitGraphicsFn,
    IsAttachedFn, SetPaletteFn, ShutdownFn, StartFrameFn,
};
use crate::video::{PaletteLayout, PALETTE_BYTES};
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::sync::Arc;

// =============================================================================
// Opaque Handle Types
// =============================================================================

/// Opaque handle to the engine side of a bridge.
pub struct FramebridgeBridge(Bridge<CallbackHost>);

/// Opaque handle for host-originated calls. Usable from any thread.
pub struct FramebridgeHost(HostHandle);

// =============================================================================
// Result and Error Codes
// =============================================================================

/// Result codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebridgeResult {
    /// Operation succeeded (or the host does not take this call).
    Ok = 0,
    /// Null pointer passed.
    NullPointer = 1,
    /// Operation not valid in the current lifecycle phase.
    InvalidPhase = 2,
    /// Graphics were already initialized.
    AlreadyInitialized = 3,
    /// Size, index or geometry argument out of range.
    InvalidArgument = 4,
    /// A required callback is missing or the host refused to start.
    HostUnavailable = 5,
    /// The host failed this update; the engine should carry on.
    Skipped = 6,
    /// The engine event queue is closed.
    QueueClosed = 7,
    /// A frame is being rendered.
    FrameInProgress = 8,
}

impl From<&BridgeError> for FramebridgeResult {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::InvalidPhase { .. } => Self::InvalidPhase,
            BridgeError::AlreadyInitialized => Self::AlreadyInitialized,
            BridgeError::InvalidDimensions { .. }
            | BridgeError::PlaneOutOfRange { .. }
            | BridgeError::SizeMismatch { .. }
            | BridgeError::Config(_) => Self::InvalidArgument,
            BridgeError::FrameInProgress { .. } => Self::FrameInProgress,
            BridgeError::QueueClosed => Self::QueueClosed,
            BridgeError::HostInit(_) | BridgeError::Io(_) => Self::HostUnavailable,
        }
    }
}

impl From<&Delivery> for FramebridgeResult {
    fn from(delivery: &Delivery) -> Self {
        match delivery {
            Delivery::Delivered | Delivery::Unsupported => Self::Ok,
            Delivery::Skipped(_) => Self::Skipped,
        }
    }
}

fn status<T>(result: &crate::error::Result<T>) -> FramebridgeResult {
    match result {
        Ok(_) => FramebridgeResult::Ok,
        Err(err) => err.into(),
    }
}

fn delivered(result: &crate::error::Result<Delivery>) -> FramebridgeResult {
    match result {
        Ok(delivery) => delivery.into(),
        Err(err) => err.into(),
    }
}

// Palette layout constants
/// 3 bytes per entry, R G B.
pub const FRAMEBRIDGE_LAYOUT_RGB: c_int = 0;
/// 3 bytes per entry, B G R.
pub const FRAMEBRIDGE_LAYOUT_BGR: c_int = 1;
/// 4 bytes per entry, R G B 0xFF.
pub const FRAMEBRIDGE_LAYOUT_RGBA: c_int = 2;
/// 4 bytes per entry, B G R 0xFF.
pub const FRAMEBRIDGE_LAYOUT_BGRA: c_int = 3;

const fn layout_from_c(layout: c_int) -> Option<PaletteLayout> {
    match layout {
        FRAMEBRIDGE_LAYOUT_RGB => Some(PaletteLayout::Rgb),
        FRAMEBRIDGE_LAYOUT_BGR => Some(PaletteLayout::Bgr),
        FRAMEBRIDGE_LAYOUT_RGBA => Some(PaletteLayout::Rgba),
        FRAMEBRIDGE_LAYOUT_BGRA => Some(PaletteLayout::Bgra),
        _ => None,
    }
}

// =============================================================================
// Bridge Functions
// =============================================================================

/// Create a bridge with `planes` screen planes and no callbacks registered.
///
/// Returns NULL if `planes` is zero or `layout` is unknown.
#[unsafe(no_mangle)]
pub extern "C" fn framebridge_new(planes: c_uint, layout: c_int) -> *mut FramebridgeBridge {
    let Some(layout) = layout_from_c(layout) else {
        return ptr::null_mut();
    };
    if planes == 0 {
        return ptr::null_mut();
    }
    let host = CallbackHost::new().with_layout(layout);
    let bridge = Bridge::with_queue(host, planes as usize, EventQueue::unbounded());
    Box::into_raw(Box::new(FramebridgeBridge(bridge)))
}

/// Destroy a bridge. Shuts graphics down first if they are still live.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_destroy(bridge: *mut FramebridgeBridge) {
    if !bridge.is_null() {
        drop(Box::from_raw(bridge));
    }
}

/// Register the init-graphics callback (NULL clears it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_callback_init_graphics(
    bridge: *mut FramebridgeBridge,
    callback: Option<InitGraphicsFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    (*bridge).0.host_mut().set_init_graphics(callback);
    FramebridgeResult::Ok
}

/// Register the palette callback (NULL clears it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_callback_set_palette(
    bridge: *mut FramebridgeBridge,
    callback: Option<SetPaletteFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    (*bridge).0.host_mut().set_palette_callback(callback);
    FramebridgeResult::Ok
}

/// Register the start-frame callback (NULL clears it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_callback_start_frame(
    bridge: *mut FramebridgeBridge,
    callback: Option<StartFrameFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    (*bridge).0.host_mut().set_start_frame(callback);
    FramebridgeResult::Ok
}

/// Register the finish-update callback (NULL clears it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_callback_finish_update(
    bridge: *mut FramebridgeBridge,
    callback: Option<FinishUpdateFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    (*bridge).0.host_mut().set_finish_update(callback);
    FramebridgeResult::Ok
}

/// Register the shutdown callback (NULL clears it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_callback_shutdown(
    bridge: *mut FramebridgeBridge,
    callback: Option<ShutdownFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    (*bridge).0.host_mut().set_shutdown(callback);
    FramebridgeResult::Ok
}

/// Wrap every callback in an attach/detach pair.
///
/// Pass NULL for both `attach` and `detach` to remove the runtime.
/// `is_attached` may be NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_set_runtime(
    bridge: *mut FramebridgeBridge,
    attach: Option<AttachFn>,
    detach: Option<DetachFn>,
    is_attached: Option<IsAttachedFn>,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    let host = (*bridge).0.host_mut();
    match (attach, detach) {
        (Some(attach), Some(detach)) => {
            host.set_runtime(Some(Arc::new(CallbackRuntime::new(attach, detach, is_attached))));
            FramebridgeResult::Ok
        }
        (None, None) => {
            host.set_runtime(None);
            FramebridgeResult::Ok
        }
        _ => FramebridgeResult::InvalidArgument,
    }
}

/// Allocate the planes and call the shell's init-graphics callback.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_init_graphics(
    bridge: *mut FramebridgeBridge,
    width: c_uint,
    height: c_uint,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    status(&(*bridge).0.init_graphics(width, height))
}

/// Tear graphics down. Terminal for this bridge.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_shutdown_graphics(
    bridge: *mut FramebridgeBridge,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    status(&(*bridge).0.shutdown_graphics())
}

/// Begin a frame.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_start_frame(bridge: *mut FramebridgeBridge) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    delivered(&(*bridge).0.start_frame())
}

/// Present plane 0 to the shell.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_finish_update(
    bridge: *mut FramebridgeBridge,
) -> FramebridgeResult {
    if bridge.is_null() {
        return FramebridgeResult::NullPointer;
    }
    delivered(&(*bridge).0.finish_update())
}

/// Convert a 768-byte RGB palette and hand it to the shell.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_set_palette(
    bridge: *mut FramebridgeBridge,
    palette: *const u8,
) -> FramebridgeResult {
    if bridge.is_null() || palette.is_null() {
        return FramebridgeResult::NullPointer;
    }
    let raw = &*palette.cast::<[u8; PALETTE_BYTES]>();
    delivered(&(*bridge).0.set_palette(raw))
}

/// Writable pointer to a plane, for the engine renderer.
///
/// Writes `width * height` to `len_out` if non-NULL. Returns NULL when
/// the bridge is not live or `index` is out of range.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_plane(
    bridge: *mut FramebridgeBridge,
    index: c_uint,
    len_out: *mut usize,
) -> *mut u8 {
    if bridge.is_null() {
        return ptr::null_mut();
    }
    match (*bridge).0.plane_mut(index as usize) {
        Ok(plane) => {
            if !len_out.is_null() {
                *len_out = plane.len();
            }
            plane.as_mut_ptr()
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Pop the next pending input event.
///
/// Returns false when the queue is empty.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_next_event(
    bridge: *const FramebridgeBridge,
    event_out: *mut InputEvent,
) -> bool {
    if bridge.is_null() || event_out.is_null() {
        return false;
    }
    let Some(event) = (*bridge).0.event_queue().and_then(|queue| queue.try_next()) else {
        return false;
    };
    *event_out = event;
    true
}

// =============================================================================
// Host Handle Functions
// =============================================================================

/// Take a host handle. Destroy it with `framebridge_host_destroy`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_host_handle(
    bridge: *const FramebridgeBridge,
) -> *mut FramebridgeHost {
    if bridge.is_null() {
        return ptr::null_mut();
    }
    Box::into_raw(Box::new(FramebridgeHost((*bridge).0.handle())))
}

/// Destroy a host handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_host_destroy(host: *mut FramebridgeHost) {
    if !host.is_null() {
        drop(Box::from_raw(host));
    }
}

/// Post a key press.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_on_key_down(
    host: *const FramebridgeHost,
    code: c_int,
) -> FramebridgeResult {
    if host.is_null() {
        return FramebridgeResult::NullPointer;
    }
    status(&(*host).0.on_key_down(code))
}

/// Post a key release.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_on_key_up(
    host: *const FramebridgeHost,
    code: c_int,
) -> FramebridgeResult {
    if host.is_null() {
        return FramebridgeResult::NullPointer;
    }
    status(&(*host).0.on_key_up(code))
}

/// Screen width, or -1 before initialization or after shutdown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_screen_width(host: *const FramebridgeHost) -> c_int {
    if host.is_null() {
        return -1;
    }
    (*host)
        .0
        .screen_width()
        .ok()
        .and_then(|w| c_int::try_from(w).ok())
        .unwrap_or(-1)
}

/// Screen height, or -1 before initialization or after shutdown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_screen_height(host: *const FramebridgeHost) -> c_int {
    if host.is_null() {
        return -1;
    }
    (*host)
        .0
        .screen_height()
        .ok()
        .and_then(|h| c_int::try_from(h).ok())
        .unwrap_or(-1)
}

/// Read-only pointer to a plane; `size` must be `width * height`.
///
/// Returns NULL on a wrong size, bad index or a bridge that is not live.
/// The pointer stays valid until `framebridge_shutdown_graphics`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_screen_buffer(
    host: *const FramebridgeHost,
    index: c_uint,
    size: usize,
) -> *const u8 {
    if host.is_null() {
        return ptr::null();
    }
    match (*host).0.screen_buffer(index as usize, size) {
        Ok(view) => view.as_ptr(),
        Err(_) => ptr::null(),
    }
}

/// Copy a stable plane into `out` (`size` bytes, `width * height`).
///
/// Returns `FrameInProgress` while the engine is writing; retry after the
/// next frame.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_read_stable(
    host: *const FramebridgeHost,
    index: c_uint,
    out: *mut u8,
    size: usize,
) -> FramebridgeResult {
    if host.is_null() || out.is_null() {
        return FramebridgeResult::NullPointer;
    }
    let out = std::slice::from_raw_parts_mut(out, size);
    status(&(*host).0.read_stable(index as usize, out))
}

/// Frame fence sequence. Odd while a frame is being rendered.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framebridge_frame_sequence(host: *const FramebridgeHost) -> u64 {
    if host.is_null() {
        return 0;
    }
    (*host).0.frame_sequence()
}

// =============================================================================
// Version Information
// =============================================================================

/// Get the Framebridge version string.
#[unsafe(no_mangle)]
pub extern "C" fn framebridge_version() -> *const c_char {
    static VERSION: &[u8] = b"0.1.0\0";
    VERSION.as_ptr().cast::<c_char>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    static INIT_WIDTH: AtomicI32 = AtomicI32::new(0);
    static FINISHED: AtomicUsize = AtomicUsize::new(0);
    static PALETTE_FIRST: AtomicI32 = AtomicI32::new(-1);

    extern "C" fn on_init(width: c_int, _height: c_int) {
        INIT_WIDTH.store(width, Ordering::SeqCst);
    }

    extern "C" fn on_finish(screen: *const u8) {
        if !screen.is_null() {
            FINISHED.fetch_add(1, Ordering::SeqCst);
        }
    }

    extern "C" fn on_palette(palette: *const u8) {
        // SAFETY: the bridge passes at least one palette entry.
        let first = unsafe { *palette.add(2) };
        PALETTE_FIRST.store(i32::from(first), Ordering::SeqCst);
    }

    #[test]
    fn test_new_rejects_bad_arguments() {
        assert!(framebridge_new(0, FRAMEBRIDGE_LAYOUT_RGB).is_null());
        assert!(framebridge_new(1, 42).is_null());
    }

    #[test]
    fn test_null_pointers_reported() {
        unsafe {
            assert_eq!(
                framebridge_init_graphics(ptr::null_mut(), 320, 200),
                FramebridgeResult::NullPointer
            );
            assert_eq!(
                framebridge_on_key_down(ptr::null(), 27),
                FramebridgeResult::NullPointer
            );
            assert_eq!(framebridge_screen_width(ptr::null()), -1);
            assert!(framebridge_screen_buffer(ptr::null(), 0, 64_000).is_null());
            framebridge_destroy(ptr::null_mut());
            framebridge_host_destroy(ptr::null_mut());
        }
    }

    #[test]
    fn test_missing_callbacks_refuse_init() {
        unsafe {
            let bridge = framebridge_new(1, FRAMEBRIDGE_LAYOUT_RGB);
            assert_eq!(
                framebridge_init_graphics(bridge, 320, 200),
                FramebridgeResult::HostUnavailable
            );
            framebridge_destroy(bridge);
        }
    }

    #[test]
    fn test_full_session() {
        unsafe {
            let bridge = framebridge_new(1, FRAMEBRIDGE_LAYOUT_BGR);
            framebridge_callback_init_graphics(bridge, Some(on_init));
            framebridge_callback_finish_update(bridge, Some(on_finish));
            framebridge_callback_set_palette(bridge, Some(on_palette));

            let host = framebridge_host_handle(bridge);
            assert_eq!(framebridge_screen_width(host), -1);

            assert_eq!(
                framebridge_init_graphics(bridge, 320, 200),
                FramebridgeResult::Ok
            );
            assert_eq!(INIT_WIDTH.load(Ordering::SeqCst), 320);
            assert_eq!(
                framebridge_init_graphics(bridge, 320, 200),
                FramebridgeResult::AlreadyInitialized
            );
            assert_eq!(framebridge_screen_width(host), 320);
            assert_eq!(framebridge_screen_height(host), 200);

            let mut palette = [0u8; PALETTE_BYTES];
            palette[0] = 200;
            assert_eq!(
                framebridge_set_palette(bridge, palette.as_ptr()),
                FramebridgeResult::Ok
            );
            assert_eq!(PALETTE_FIRST.load(Ordering::SeqCst), 200);

            // No start-frame callback: the bracket still advances.
            assert_eq!(framebridge_start_frame(bridge), FramebridgeResult::Ok);
            assert_eq!(framebridge_frame_sequence(host), 1);

            let mut len = 0usize;
            let plane = framebridge_plane(bridge, 0, &mut len);
            assert_eq!(len, 64_000);
            *plane.add(5) = 77;

            assert_eq!(framebridge_on_key_down(host, 27), FramebridgeResult::Ok);
            assert_eq!(framebridge_finish_update(bridge), FramebridgeResult::Ok);
            assert_eq!(FINISHED.load(Ordering::SeqCst), 1);

            let screen = framebridge_screen_buffer(host, 0, 64_000);
            assert_eq!(screen, plane.cast_const());
            assert_eq!(*screen.add(5), 77);
            assert!(framebridge_screen_buffer(host, 0, 100).is_null());

            let mut copy = vec![0u8; 64_000];
            assert_eq!(
                framebridge_read_stable(host, 0, copy.as_mut_ptr(), copy.len()),
                FramebridgeResult::Ok
            );
            assert_eq!(copy[5], 77);
            assert_eq!(
                framebridge_read_stable(host, 0, copy.as_mut_ptr(), 10),
                FramebridgeResult::InvalidArgument
            );
            assert!(framebridge_screen_buffer(host, 1, 64_000).is_null());

            let mut event = InputEvent::key_up(0);
            assert!(framebridge_next_event(bridge, &mut event));
            assert_eq!(event.kind, EventKind::KeyDown);
            assert_eq!(event.code, 27);
            assert!(!framebridge_next_event(bridge, &mut event));

            assert_eq!(framebridge_shutdown_graphics(bridge), FramebridgeResult::Ok);
            assert_eq!(
                framebridge_on_key_up(host, 27),
                FramebridgeResult::InvalidPhase
            );
            assert!(framebridge_screen_buffer(host, 0, 64_000).is_null());

            framebridge_host_destroy(host);
            framebridge_destroy(bridge);
        }
    }

    #[test]
    fn test_runtime_needs_both_halves() {
        extern "C" fn attach() -> c_int {
            0
        }
        unsafe {
            let bridge = framebridge_new(1, FRAMEBRIDGE_LAYOUT_RGB);
            assert_eq!(
                framebridge_set_runtime(bridge, Some(attach), None, None),
                FramebridgeResult::InvalidArgument
            );
            assert_eq!(
                framebridge_set_runtime(bridge, None, None, None),
                FramebridgeResult::Ok
            );
            framebridge_destroy(bridge);
        }
    }

    #[test]
    fn test_framebridge_version() {
        unsafe {
            let version = framebridge_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, "0.1.0");
        }
    }
}
