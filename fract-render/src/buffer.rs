use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::RenderError;
use crate::tile::Tile;

/// Opaque black, the colour of a pixel no pass has reached yet.
pub const OPAQUE_BLACK: u32 = 0xff00_0000;

/// The shared ARGB pixel buffer of a render target.
///
/// Workers store into disjoint tiles while the display thread reads the
/// whole buffer, so every pixel is an `AtomicU32` accessed with relaxed
/// ordering: a reader may see a mix of old and new pixels mid-pass, never a
/// torn one.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Box<[AtomicU32]>,
}

impl PixelBuffer {
    /// Allocate a `width × height` buffer filled with opaque black.
    ///
    /// Allocation is fallible so a resize to an absurd size can be refused
    /// without aborting the process.
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::Allocation { width, height })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation { width, height })?;
        pixels.extend((0..len).map(|_| AtomicU32::new(OPAQUE_BLACK)));
        Ok(Self {
            width,
            height,
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the buffer.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Store one pixel. Out-of-range coordinates are a logic error.
    #[inline]
    pub fn store(&self, x: u32, y: u32, argb: u32) {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[y as usize * self.width as usize + x as usize].store(argb, Ordering::Relaxed);
    }

    /// Read one pixel.
    #[inline]
    pub fn load(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize].load(Ordering::Relaxed)
    }

    /// Whether `tile` lies fully inside this buffer.
    pub fn contains(&self, tile: &Tile) -> bool {
        tile.x as u64 + tile.width as u64 <= self.width as u64
            && tile.y as u64 + tile.height as u64 <= self.height as u64
    }

    /// Copy the current contents as ARGB words, row-major.
    pub fn to_argb(&self) -> Vec<u32> {
        self.pixels.iter().map(|p| p.load(Ordering::Relaxed)).collect()
    }

    /// Copy the current contents as RGBA bytes, row-major, for texture upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in self.pixels.iter() {
            let [a, r, g, b] = p.load(Ordering::Relaxed).to_be_bytes();
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }
}
