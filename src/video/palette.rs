//! Palette: the engine's 256-entry color lookup table and its host layouts.
//!
//! The engine hands over 768 bytes (`[r, g, b]` × 256). Hosts want those
//! bytes in their own channel order, sometimes padded to four bytes per
//! entry. Conversion writes into a fixed array so palette changes never
//! allocate.
//!
//! ```text
//! engine:  R G B | R G B | ...                 768 bytes
//! Rgb:     R G B | R G B | ...                 768 bytes
//! Bgr:     B G R | B G R | ...                 768 bytes
//! Rgba:    R G B FF | R G B FF | ...          1024 bytes
//! Bgra:    B G R FF | B G R FF | ...          1024 bytes
//! ```

use serde::{Deserialize, Serialize};

/// Number of palette entries.
pub const PALETTE_ENTRIES: usize = 256;

/// Size in bytes of an engine palette (256 RGB triples).
pub const PALETTE_BYTES: usize = PALETTE_ENTRIES * 3;

/// Largest host palette (four bytes per entry).
pub const MAX_HOST_PALETTE_BYTES: usize = PALETTE_ENTRIES * 4;

/// True-color RGB representation.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White (255, 255, 255)
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Pack into a 24-bit hex color.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// Byte layout a host expects for palette entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(C)]
pub enum PaletteLayout {
    /// Packed `R G B` triples (the engine's own order).
    #[default]
    Rgb,
    /// Packed `B G R` triples.
    Bgr,
    /// `R G B A` with opaque alpha.
    Rgba,
    /// `B G R A` with opaque alpha.
    Bgra,
}

impl PaletteLayout {
    /// Bytes per palette entry.
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    /// Total bytes for a full palette.
    #[inline]
    pub const fn byte_len(self) -> usize {
        self.stride() * PALETTE_ENTRIES
    }

    #[inline]
    const fn swaps_red_blue(self) -> bool {
        matches!(self, Self::Bgr | Self::Bgra)
    }
}

/// The engine's active color lookup table.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgb; PALETTE_ENTRIES],
}

impl Palette {
    /// All-black palette.
    pub const fn new() -> Self {
        Self {
            entries: [Rgb::BLACK; PALETTE_ENTRIES],
        }
    }

    /// Build from the engine's 768-byte `[r, g, b]` table.
    pub fn from_raw(raw: &[u8; PALETTE_BYTES]) -> Self {
        let mut entries = [Rgb::BLACK; PALETTE_ENTRIES];
        for (entry, rgb) in entries.iter_mut().zip(raw.chunks_exact(3)) {
            *entry = Rgb::new(rgb[0], rgb[1], rgb[2]);
        }
        Self { entries }
    }

    /// Build from a byte slice, which must hold exactly 768 bytes.
    pub fn from_slice(raw: &[u8]) -> Option<Self> {
        let raw: &[u8; PALETTE_BYTES] = raw.try_into().ok()?;
        Some(Self::from_raw(raw))
    }

    /// Color for a palette index.
    #[inline]
    pub const fn get(&self, index: u8) -> Rgb {
        self.entries[index as usize]
    }

    /// Replace one entry.
    #[inline]
    pub fn set(&mut self, index: u8, color: Rgb) {
        self.entries[index as usize] = color;
    }

    /// All 256 entries.
    #[inline]
    pub const fn entries(&self) -> &[Rgb; PALETTE_ENTRIES] {
        &self.entries
    }

    /// Back to the engine's 768-byte layout.
    pub fn to_raw(&self) -> [u8; PALETTE_BYTES] {
        let mut raw = [0u8; PALETTE_BYTES];
        for (rgb, entry) in raw.chunks_exact_mut(3).zip(self.entries.iter()) {
            rgb.copy_from_slice(&[entry.r, entry.g, entry.b]);
        }
        raw
    }

    /// Convert to the byte layout a host expects.
    pub fn encode(&self, layout: PaletteLayout) -> HostPalette {
        let stride = layout.stride();
        let mut bytes = [0u8; MAX_HOST_PALETTE_BYTES];

        for (out, entry) in bytes
            .chunks_exact_mut(stride)
            .zip(self.entries.iter())
        {
            let (first, last) = if layout.swaps_red_blue() {
                (entry.b, entry.r)
            } else {
                (entry.r, entry.b)
            };
            out[0] = first;
            out[1] = entry.g;
            out[2] = last;
            if stride == 4 {
                out[3] = 0xFF;
            }
        }

        HostPalette { layout, bytes }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("first", &self.entries[0])
            .field("last", &self.entries[PALETTE_ENTRIES - 1])
            .finish_non_exhaustive()
    }
}

/// A palette converted to a host layout.
///
/// This is an independent copy: the host may retain it after the engine
/// has moved on to a different palette.
#[derive(Clone, PartialEq, Eq)]
pub struct HostPalette {
    layout: PaletteLayout,
    bytes: [u8; MAX_HOST_PALETTE_BYTES],
}

impl HostPalette {
    /// Layout of the bytes.
    #[inline]
    pub const fn layout(&self) -> PaletteLayout {
        self.layout
    }

    /// The encoded bytes (768 or 1024 depending on layout).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.layout.byte_len()]
    }

    /// Byte length of the encoded palette.
    #[inline]
    pub const fn len(&self) -> usize {
        self.layout.byte_len()
    }

    /// Always false; a host palette holds all 256 entries.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Recover the engine palette from the host bytes.
    pub fn decode(&self) -> Palette {
        let mut palette = Palette::new();
        let swap = self.layout.swaps_red_blue();
        for (index, chunk) in self.as_bytes().chunks_exact(self.layout.stride()).enumerate() {
            let (r, b) = if swap {
                (chunk[2], chunk[0])
            } else {
                (chunk[0], chunk[2])
            };
            palette.entries[index] = Rgb::new(r, chunk[1], b);
        }
        palette
    }
}

impl std::fmt::Debug for HostPalette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostPalette")
            .field("layout", &self.layout)
            .field("len", &self.len())
            .finish()
    }
}
