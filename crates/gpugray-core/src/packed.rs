//! Header-prefixed word buffer used for device transfer.
//!
//! # Layout
//!
//! ```text
//! word 0          width
//! word 1          height
//! word 2 + i      pixel i = y * width + x, encoded as (a<<24)|(b<<16)|(g<<8)|r
//! ```
//!
//! The encoding is the little-endian view of an `[r, g, b, a]` byte quad,
//! so the byte image of the payload equals the interleaved RGBA bytes.

use rayon::prelude::*;

use crate::error::{Error, Result, checked_pixel_count};
use crate::surface::{PixelSurface, Rgba8};

/// Number of header words preceding the pixel payload.
pub const HEADER_WORDS: usize = 2;

/// Surfaces with at least this many pixels are packed on the rayon pool.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Encodes one pixel as `(a<<24)|(b<<16)|(g<<8)|r`.
#[inline]
pub fn pack_pixel(p: Rgba8) -> u32 {
    ((p.a as u32) << 24) | ((p.b as u32) << 16) | ((p.g as u32) << 8) | p.r as u32
}

/// Decodes one payload word.
#[inline]
pub fn unpack_pixel(word: u32) -> Rgba8 {
    Rgba8 {
        r: (word & 0xFF) as u8,
        g: ((word >> 8) & 0xFF) as u8,
        b: ((word >> 16) & 0xFF) as u8,
        a: ((word >> 24) & 0xFF) as u8,
    }
}

/// Linear `width * height + 2` word buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedBuffer {
    words: Vec<u32>,
}

impl PackedBuffer {
    /// Wraps raw words, validating the header against the length.
    pub fn from_words(words: Vec<u32>) -> Result<Self> {
        if words.len() < HEADER_WORDS {
            return Err(Error::size_mismatch(HEADER_WORDS, words.len()));
        }
        let expected = checked_pixel_count(words[0], words[1])? + HEADER_WORDS;
        if words.len() != expected {
            return Err(Error::size_mismatch(expected, words.len()));
        }
        Ok(Self { words })
    }

    /// Reads little-endian words from a byte buffer, e.g. a mapped readback range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(Error::MisalignedBytes(bytes.len()));
        }
        // Mapped ranges carry no alignment guarantee for u32 casts.
        let words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_words(words)
    }

    /// Image width from header word 0.
    #[inline]
    pub fn width(&self) -> u32 {
        self.words[0]
    }

    /// Image height from header word 1.
    #[inline]
    pub fn height(&self) -> u32 {
        self.words[1]
    }

    /// The two header words.
    #[inline]
    pub fn header(&self) -> [u32; HEADER_WORDS] {
        [self.words[0], self.words[1]]
    }

    /// Pixel words after the header.
    #[inline]
    pub fn payload(&self) -> &[u32] {
        &self.words[HEADER_WORDS..]
    }

    /// All words including the header.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Byte view of all words, ready for upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Length in bytes; identical for input, output and readback buffers.
    #[inline]
    pub fn byte_len(&self) -> u64 {
        (self.words.len() * std::mem::size_of::<u32>()) as u64
    }

    /// Consumes the buffer, returning its words.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }
}

impl std::fmt::Debug for PackedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

/// Packs a surface into its device layout.
pub fn pack(surface: &PixelSurface) -> PackedBuffer {
    let pixels = surface.pixels();
    let mut words = vec![0u32; pixels.len() + HEADER_WORDS];
    words[0] = surface.width();
    words[1] = surface.height();

    let payload = &mut words[HEADER_WORDS..];
    if pixels.len() >= PARALLEL_THRESHOLD {
        payload
            .par_iter_mut()
            .zip(pixels.par_iter())
            .for_each(|(w, &p)| *w = pack_pixel(p));
    } else {
        for (w, &p) in payload.iter_mut().zip(pixels) {
            *w = pack_pixel(p);
        }
    }
    PackedBuffer { words }
}

/// Unpacks a buffer back into a surface using its own header.
pub fn unpack(packed: &PackedBuffer) -> PixelSurface {
    // header and length were validated when the buffer was built
    PixelSurface::from_parts(packed.width(), packed.height(), decode_words(packed.payload()))
}

/// Unpacks `width * height` payload words, ignoring anything past them.
///
/// `payload` must start at pixel 0, i.e. with the header already stripped.
pub fn unpack_payload(width: u32, height: u32, payload: &[u32]) -> Result<PixelSurface> {
    let count = checked_pixel_count(width, height)?;
    if payload.len() < count {
        return Err(Error::size_mismatch(count, payload.len()));
    }
    PixelSurface::new(width, height, decode_words(&payload[..count]))
}

fn decode_words(words: &[u32]) -> Vec<Rgba8> {
    if words.len() >= PARALLEL_THRESHOLD {
        words.par_iter().map(|&w| unpack_pixel(w)).collect()
    } else {
        words.iter().map(|&w| unpack_pixel(w)).collect()
    }
}
