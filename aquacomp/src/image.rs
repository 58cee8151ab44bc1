use rgb::RGBA8;
use tiny_skia::Pixmap;

use crate::pixel;

/// A read-only view of a compositor's raster.
///
/// The view borrows the compositor, so the raster cannot be reallocated or
/// modified while the view is alive.
#[derive(Debug, Clone, Copy)]
pub struct RasterImage<'a> {
    data: &'a [u32],
    width: usize,
    height: usize,
    scale_factor: u32,
}

impl<'a> RasterImage<'a> {
    /// Construct a view. `data` must hold exactly `width * height` pixels.
    pub(crate) fn new(data: &'a [u32], width: usize, height: usize, scale_factor: u32) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
            scale_factor,
        }
    }

    /// The width in raster pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The height in raster pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scale_factor(&self) -> u32 {
        self.scale_factor
    }

    /// The size in points.
    pub fn size(&self) -> [f32; 2] {
        let sf = self.scale_factor as f32;
        [self.width as f32 / sf, self.height as f32 / sf]
    }

    /// Premultiplied ARGB pixels in row-major order.
    pub fn pixels(&self) -> &'a [u32] {
        self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u32]> + 'a {
        self.data.chunks_exact(self.width.max(1))
    }

    /// Convert to straight-alpha RGBA.
    pub fn to_rgba8(&self) -> Vec<RGBA8> {
        self.data
            .iter()
            .map(|&p| {
                let [r, g, b, a] = pixel::unpremultiply(p);
                RGBA8::new(r as u8, g as u8, b as u8, a as u8)
            })
            .collect()
    }

    /// Copy into a `tiny_skia::Pixmap`, which stores premultiplied RGBA.
    pub fn to_pixmap(&self) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(self.width as u32, self.height as u32)?;
        for (&p, out) in self.data.iter().zip(pixmap.data_mut().chunks_exact_mut(4)) {
            out.copy_from_slice(&[
                pixel::red(p) as u8,
                pixel::green(p) as u8,
                pixel::blue(p) as u8,
                pixel::alpha(p) as u8,
            ]);
        }
        Some(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let data = [0xff00_0000, 0x8080_0000, 0, 0xffff_ffff, 1, 2];
        let im = RasterImage::new(&data, 3, 2, 2);
        assert_eq!(im.size(), [1.5, 1.0]);
        assert_eq!(im.pixel(1, 0), Some(0x8080_0000));
        assert_eq!(im.pixel(3, 0), None);
        assert_eq!(im.rows().count(), 2);
        assert_eq!(im.to_rgba8()[1], RGBA8::new(255, 0, 0, 128));
    }
}
