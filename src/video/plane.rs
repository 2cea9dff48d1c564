//! Screen planes: engine-owned indexed-color frame buffers.
//!
//! Each plane is `width * height` bytes in row-major order, one palette
//! index per pixel. Planes are allocated once and never move, so a
//! [`PlaneView`] handed to the host stays valid until the planes are
//! dropped.

// Planes are exposed to the host as raw (address, length) pairs.
#![allow(unsafe_code)]

use crate::error::{BridgeError, Result};
use std::ptr::NonNull;

/// A zero-copy view of one plane: address plus length.
///
/// The view aliases engine memory. It does not borrow the planes, so the
/// host must stop using it once the bridge has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneView {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the view is an address into a heap allocation owned by
// `ScreenPlanes`; moving the address between threads is sound. Reads
// through it are governed by the frame fence contract.
unsafe impl Send for PlaneView {}
// SAFETY: see above.
unsafe impl Sync for PlaneView {}

impl PlaneView {
    /// Address of the first pixel.
    #[inline]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Length of the plane in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the plane has no pixels (never true for allocated planes).
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether this view points at exactly the memory of `slice`.
    pub fn aliases(&self, slice: &[u8]) -> bool {
        std::ptr::eq(self.as_ptr(), slice.as_ptr()) && self.len == slice.len()
    }

    /// Borrow the plane contents.
    ///
    /// # Safety
    ///
    /// The planes this view was taken from must still be alive, and the
    /// engine must not be writing to the plane for the duration of the
    /// borrow (i.e. the frame fence is stable).
    #[inline]
    pub const unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }

    /// Copy the plane into `out` with volatile reads.
    ///
    /// The copy may be torn if the engine writes concurrently; callers
    /// validate it against the frame fence afterwards.
    ///
    /// # Safety
    ///
    /// The planes this view was taken from must still be alive, and
    /// `out.len()` must equal [`len`](Self::len).
    pub unsafe fn copy_volatile(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.len);
        let src = self.ptr.as_ptr().cast_const();
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = std::ptr::read_volatile(src.add(i));
        }
    }
}

/// One heap allocation, owned through its raw pointer so that views and
/// mutable borrows derive from the same base address.
struct RawPlane {
    ptr: NonNull<u8>,
    len: usize,
}

impl RawPlane {
    fn zeroed(len: usize) -> Self {
        let boxed = vec![0u8; len].into_boxed_slice();
        let raw = Box::into_raw(boxed);
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(raw.cast::<u8>()) };
        Self { ptr, len }
    }
}

impl Drop for RawPlane {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        // SAFETY: `ptr`/`len` came from `Box::into_raw` in `zeroed` and are
        // released exactly once.
        drop(unsafe { Box::from_raw(slice) });
    }
}

/// Fixed set of numbered frame-buffer planes.
pub struct ScreenPlanes {
    width: u32,
    height: u32,
    planes: Vec<RawPlane>,
}

// SAFETY: `ScreenPlanes` uniquely owns its allocations.
unsafe impl Send for ScreenPlanes {}

impl ScreenPlanes {
    /// Allocate `count` zeroed planes of `width * height` bytes.
    pub fn new(width: u32, height: u32, count: usize) -> Result<Self> {
        let invalid = || BridgeError::InvalidDimensions {
            width,
            height,
            planes: count,
        };
        if width == 0 || height == 0 || count == 0 {
            return Err(invalid());
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(invalid)?;

        Ok(Self {
            width,
            height,
            planes: (0..count).map(|_| RawPlane::zeroed(len)).collect(),
        })
    }

    /// Plane width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Plane height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per plane.
    #[inline]
    pub const fn plane_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of planes.
    #[inline]
    pub fn count(&self) -> usize {
        self.planes.len()
    }

    fn raw(&self, index: usize) -> Result<&RawPlane> {
        self.planes.get(index).ok_or(BridgeError::PlaneOutOfRange {
            index,
            planes: self.planes.len(),
        })
    }

    /// Read access to a plane.
    pub fn plane(&self, index: usize) -> Result<&[u8]> {
        let raw = self.raw(index)?;
        // SAFETY: the allocation is live for `&self` and no `&mut` exists
        // while `&self` is held.
        Ok(unsafe { std::slice::from_raw_parts(raw.ptr.as_ptr(), raw.len) })
    }

    /// Write access to a plane.
    pub fn plane_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        let raw = self.raw(index)?;
        // SAFETY: `&mut self` guarantees no other Rust borrow of the plane.
        Ok(unsafe { std::slice::from_raw_parts_mut(raw.ptr.as_ptr(), raw.len) })
    }

    /// Zero-copy view of a plane.
    pub fn view(&self, index: usize) -> Result<PlaneView> {
        let raw = self.raw(index)?;
        Ok(PlaneView {
            ptr: raw.ptr,
            len: raw.len,
        })
    }

    /// Views of every plane, in index order.
    pub fn views(&self) -> Vec<PlaneView> {
        self.planes
            .iter()
            .map(|raw| PlaneView {
                ptr: raw.ptr,
                len: raw.len,
            })
            .collect()
    }

    /// Convert (x, y) to a linear index, or `None` if out of bounds.
    #[inline]
    pub const fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Write one pixel. Returns `false` if out of bounds.
    pub fn set_pixel(&mut self, plane: usize, x: u32, y: u32, color: u8) -> Result<bool> {
        let Some(idx) = self.index_of(x, y) else {
            return Ok(false);
        };
        self.plane_mut(plane)?[idx] = color;
        Ok(true)
    }

    /// Read one pixel.
    pub fn pixel(&self, plane: usize, x: u32, y: u32) -> Result<Option<u8>> {
        let plane = self.plane(plane)?;
        Ok(self.index_of(x, y).map(|idx| plane[idx]))
    }
}

impl std::fmt::Debug for ScreenPlanes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenPlanes")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("planes", &self.planes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planes_new() {
        let planes = ScreenPlanes::new(320, 200, 2).unwrap();
        assert_eq!(planes.width(), 320);
        assert_eq!(planes.height(), 200);
        assert_eq!(planes.plane_len(), 64_000);
        assert_eq!(planes.count(), 2);
        assert!(planes.plane(1).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_planes_reject_zero() {
        assert!(matches!(
            ScreenPlanes::new(0, 200, 1),
            Err(BridgeError::InvalidDimensions { .. })
        ));
        assert!(ScreenPlanes::new(320, 200, 0).is_err());
    }

    #[test]
    fn test_plane_out_of_range() {
        let planes = ScreenPlanes::new(4, 4, 1).unwrap();
        assert!(matches!(
            planes.view(1),
            Err(BridgeError::PlaneOutOfRange { index: 1, planes: 1 })
        ));
    }

    #[test]
    fn test_view_aliases_plane() {
        let mut planes = ScreenPlanes::new(320, 200, 1).unwrap();
        let view = planes.view(0).unwrap();
        assert!(view.aliases(planes.plane(0).unwrap()));

        assert!(planes.set_pixel(0, 17, 42, 0xA5).unwrap());
        let idx = planes.index_of(17, 42).unwrap();
        // SAFETY: planes are alive and nothing writes during the read.
        let seen = unsafe { view.as_slice() }[idx];
        assert_eq!(seen, 0xA5);
    }

    #[test]
    fn test_views_are_stable_across_writes() {
        let mut planes = ScreenPlanes::new(8, 8, 3).unwrap();
        let before = planes.views();
        planes.plane_mut(2).unwrap().fill(7);
        assert_eq!(before, planes.views());
        assert_eq!(planes.pixel(2, 7, 7).unwrap(), Some(7));
        assert_eq!(planes.pixel(2, 8, 7).unwrap(), None);
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let mut planes = ScreenPlanes::new(8, 8, 1).unwrap();
        assert!(!planes.set_pixel(0, 8, 0, 1).unwrap());
    }
}
