//! Host-side RGBA8 pixel surface.

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result, checked_pixel_count};

/// A single 8-bit-per-channel RGBA pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Creates a pixel from its four channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray pixel with all color channels set to `v`.
    #[inline]
    pub const fn gray(v: u8, a: u8) -> Self {
        Self { r: v, g: v, b: v, a }
    }

    /// Returns `true` when red, green and blue are equal.
    #[inline]
    pub fn is_gray(&self) -> bool {
        self.r == self.g && self.g == self.b
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(p: Rgba8) -> Self {
        [p.r, p.g, p.b, p.a]
    }
}

/// Image of `width * height` RGBA8 pixels in row-major order.
///
/// Dimensions are always non-zero and the pixel vector always holds exactly
/// `width * height` entries; every constructor enforces this.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelSurface {
    /// Creates a surface from owned pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba8>) -> Result<Self> {
        let expected = checked_pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(Error::size_mismatch(expected, pixels.len()));
        }
        Ok(Self { width, height, pixels })
    }

    /// Builds a surface whose dimensions and length are already known to agree.
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<Rgba8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self { width, height, pixels }
    }

    /// Creates a surface from interleaved RGBA bytes (4 bytes per pixel).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = checked_pixel_count(width, height)?;
        let expected_bytes = expected * 4;
        if bytes.len() != expected_bytes {
            return Err(Error::size_mismatch(expected_bytes, bytes.len()));
        }
        let pixels = bytes.chunks_exact(4).map(|c| Rgba8::new(c[0], c[1], c[2], c[3])).collect();
        Ok(Self { width, height, pixels })
    }

    /// Creates a surface with every pixel set to `fill`.
    pub fn filled(width: u32, height: u32, fill: Rgba8) -> Result<Self> {
        let count = checked_pixel_count(width, height)?;
        Ok(Self { width, height, pixels: vec![fill; count] })
    }

    /// Re-checks the dimension and length invariants.
    pub fn validate(&self) -> Result<()> {
        let expected = checked_pixel_count(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(Error::size_mismatch(expected, self.pixels.len()));
        }
        Ok(())
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always `false`: surfaces cannot be empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel slice.
    #[inline]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Mutable row-major pixel slice. Length is fixed.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Rgba8] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Interleaved RGBA bytes as a borrowed slice.
    #[inline]
    pub fn as_rgba_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Interleaved RGBA bytes, copied.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.as_rgba_bytes().to_vec()
    }

    /// Consumes the surface, returning its pixels.
    pub fn into_pixels(self) -> Vec<Rgba8> {
        self.pixels
    }

    /// Byte size of the pixel data.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * 4
    }
}

impl std::fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_pixel_count() {
        let err = PixelSurface::new(2, 2, vec![Rgba8::default(); 3]).unwrap_err();
        assert_eq!(err, Error::size_mismatch(4, 3));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(PixelSurface::new(0, 3, Vec::new()).unwrap_err().is_dimension_error());
        assert!(PixelSurface::filled(3, 0, Rgba8::default()).unwrap_err().is_dimension_error());
        assert!(PixelSurface::from_rgba_bytes(0, 0, &[]).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_rgba_bytes_roundtrip() {
        let bytes: Vec<u8> = (0..24).collect();
        let surface = PixelSurface::from_rgba_bytes(3, 2, &bytes).unwrap();
        assert_eq!(surface.pixel(1, 0), Some(Rgba8::new(4, 5, 6, 7)));
        assert_eq!(surface.pixel(0, 1), Some(Rgba8::new(12, 13, 14, 15)));
        assert_eq!(surface.to_rgba_bytes(), bytes);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let surface = PixelSurface::filled(2, 2, Rgba8::gray(9, 255)).unwrap();
        assert_eq!(surface.pixel(2, 0), None);
        assert_eq!(surface.pixel(0, 2), None);
        assert!(surface.pixel(1, 1).unwrap().is_gray());
    }

    #[test]
    fn test_from_rgba_bytes_wrong_length() {
        let err = PixelSurface::from_rgba_bytes(2, 1, &[0; 7]).unwrap_err();
        assert_eq!(err, Error::size_mismatch(8, 7));
    }
}
