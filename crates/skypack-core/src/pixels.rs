use image::{ImageBuffer, Rgba, RgbaImage};

/// RGBA8 pixel access used by trimming, checksumming and compositing.
///
/// Implementations must treat `(x, y)` as image space with the origin at the top-left.
/// Callers never pass coordinates outside `width() x height()`.
pub trait PixelBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> [u8; 4];
    fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]);
}

impl PixelBuffer for RgbaImage {
    #[inline]
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }
    #[inline]
    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }
    #[inline]
    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        ImageBuffer::get_pixel(self, x, y).0
    }
    #[inline]
    fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        ImageBuffer::put_pixel(self, x, y, Rgba(px));
    }
}

/// Zero alpha means "transparent", whatever the colour channels hold.
#[inline]
pub fn canonical(px: [u8; 4]) -> [u8; 4] {
    if px[3] == 0 { [0, 0, 0, 0] } else { px }
}
