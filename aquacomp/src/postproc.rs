//! Renderers that transform the output of another renderer pixel by pixel.
use rgb::RGBA8;
use std::{cell::RefCell, fmt, sync::Arc};

use crate::{pixel, renderer::BasicRenderer};

thread_local! {
    static SCRATCH: RefCell<Vec<u32>> = RefCell::new(Vec::new());
}

/// Call `f` with a cleared scratch raster of `len` pixels.
///
/// The per-thread buffer is reused across calls. A nested call (a
/// post-processed renderer wrapping another one) gets a fresh buffer.
fn with_scratch<R>(len: usize, f: impl FnOnce(&mut [u32]) -> R) -> R {
    SCRATCH.with(|cell| match cell.try_borrow_mut() {
        Ok(mut buf) => {
            if buf.len() < len {
                buf.resize(len, 0);
            }
            let buf = &mut buf[..len];
            for p in buf.iter_mut() {
                *p = 0;
            }
            f(buf)
        }
        Err(_) => f(&mut vec![0; len]),
    })
}

/// Transforms straight-alpha pixels.
pub trait PixelProcessor: Send + Sync {
    /// Produce the replacement for a non-transparent pixel. The components
    /// have been converted from premultiplied alpha but not clamped. Return a
    /// premultiplied pixel, usually through [`create_pixel`].
    fn process_pixel(&self, row: usize, col: usize, red: i32, green: i32, blue: i32, alpha: i32) -> u32;
}

/// Make a premultiplied pixel from straight-alpha components, clamping each
/// to `0..=255`.
pub fn create_pixel(red: i32, green: i32, blue: i32, alpha: i32) -> u32 {
    let fix = |v: i32| v.max(0).min(255) as u32;
    let (r, g, b, a) = (fix(red), fix(green), fix(blue), fix(alpha));
    argb_premultiplied(r, g, b, a)
}

fn argb_premultiplied(r: u32, g: u32, b: u32, a: u32) -> u32 {
    if a == 0 {
        return pixel::argb(0, r, g, b);
    }
    pixel::argb(a, r * a / 255, g * a / 255, b * a / 255)
}

/// Make a premultiplied gray pixel.
pub fn create_gray_pixel(value: i32, alpha: i32) -> u32 {
    create_pixel(value, value, value, alpha)
}

fn process_raw_pixel(processor: &dyn PixelProcessor, row: usize, col: usize, p: u32) -> u32 {
    let alpha = pixel::alpha(p) as i32;
    if alpha == 0 {
        return p;
    }
    let un = |c: u32| {
        let c = c as i32;
        if c > 0 {
            c * 255 / alpha
        } else {
            c
        }
    };
    processor.process_pixel(
        row,
        col,
        un(pixel::red(p)),
        un(pixel::green(p)),
        un(pixel::blue(p)),
        alpha,
    )
}

/// Renders with another renderer, then passes every non-transparent pixel
/// through a [`PixelProcessor`]. The destination is overwritten.
#[derive(Clone)]
pub struct PostProcessedRenderer<P> {
    renderer: Arc<dyn BasicRenderer>,
    processor: P,
}

impl<P: fmt::Debug> fmt::Debug for PostProcessedRenderer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessedRenderer")
            .field("processor", &self.processor)
            .finish()
    }
}

impl<P: PixelProcessor> PostProcessedRenderer<P> {
    pub fn new(renderer: Arc<dyn BasicRenderer>, processor: P) -> Self {
        Self { renderer, processor }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }
}

impl<P: PixelProcessor> BasicRenderer for PostProcessedRenderer<P> {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32) {
        let len = raster_width * raster_height;
        if len == 0 {
            return;
        }
        with_scratch(len, |buf| {
            self.renderer.render(buf, raster_width, raster_height, width, height);
            for (i, p) in buf.iter_mut().enumerate() {
                *p = process_raw_pixel(&self.processor, i / raster_width, i % raster_width, *p);
            }
            data[..len].copy_from_slice(buf);
        });
    }
}

/// Inverts the color and scales the alpha (truncating).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invert {
    pub alpha_multiplier: f32,
}

impl PixelProcessor for Invert {
    fn process_pixel(&self, _row: usize, _col: usize, red: i32, green: i32, blue: i32, alpha: i32) -> u32 {
        let alpha = (alpha as f32 * self.alpha_multiplier) as i32;
        create_pixel(255 - red, 255 - green, 255 - blue, alpha)
    }
}

/// Scales the alpha (rounding half up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleAlpha {
    pub multiplier: f32,
}

impl PixelProcessor for ScaleAlpha {
    fn process_pixel(&self, _row: usize, _col: usize, red: i32, green: i32, blue: i32, alpha: i32) -> u32 {
        if alpha <= 0 {
            return 0;
        }
        let alpha = (alpha as f32 * self.multiplier + 0.5).floor() as i32;
        create_pixel(red, green, blue, alpha)
    }
}

/// Uses the rendered alpha as a mask through which a solid color is
/// painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintUsingMask {
    pub color: RGBA8,
}

impl PixelProcessor for PaintUsingMask {
    fn process_pixel(&self, _row: usize, _col: usize, _red: i32, _green: i32, _blue: i32, alpha: i32) -> u32 {
        if alpha <= 0 {
            return 0;
        }
        let c = self.color;
        let alpha = alpha * i32::from(c.a) / 255;
        create_pixel(i32::from(c.r), i32::from(c.g), i32::from(c.b), alpha)
    }
}

/// Brightens the opaque dark background of a toolbar button rendered in dark
/// mode, leaving its translucent border alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjustDarkToolbarButton;

impl PixelProcessor for AdjustDarkToolbarButton {
    fn process_pixel(&self, _row: usize, _col: usize, red: i32, green: i32, blue: i32, alpha: i32) -> u32 {
        if alpha > 250 && red < 60 {
            let new_alpha = alpha * 220 / 255;
            // Active buttons are a little lighter than inactive ones
            let lift = if red > 30 { 67 } else { 49 };
            return create_gray_pixel(red + lift, new_alpha);
        }
        create_pixel(red, green, blue, alpha)
    }
}

pub type InvertRenderer = PostProcessedRenderer<Invert>;
pub type ScaledAlphaRenderer = PostProcessedRenderer<ScaleAlpha>;
pub type PaintUsingMaskRenderer = PostProcessedRenderer<PaintUsingMask>;
pub type AdjustDarkToolbarButtonRenderer = PostProcessedRenderer<AdjustDarkToolbarButton>;

/// Renders with another renderer and composites the result upside down onto
/// the destination.
#[derive(Clone)]
pub struct FlipVerticalRenderer {
    renderer: Arc<dyn BasicRenderer>,
}

impl fmt::Debug for FlipVerticalRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlipVerticalRenderer").finish()
    }
}

impl FlipVerticalRenderer {
    pub fn new(renderer: Arc<dyn BasicRenderer>) -> Self {
        Self { renderer }
    }
}

impl BasicRenderer for FlipVerticalRenderer {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32) {
        let len = raster_width * raster_height;
        if len == 0 {
            return;
        }
        with_scratch(len, |buf| {
            self.renderer.render(buf, raster_width, raster_height, width, height);
            let src_rows = buf.chunks_exact(raster_width);
            let dst_rows = data[..len].chunks_exact_mut(raster_width).rev();
            for (src, dst) in src_rows.zip(dst_rows) {
                for (d, &s) in dst.iter_mut().zip(src.iter()) {
                    pixel::compose_over(d, s);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(pixel: u32) -> Arc<dyn BasicRenderer> {
        Arc::new(move |data: &mut [u32], _: usize, _: usize, _: f32, _: f32| {
            for p in data.iter_mut() {
                *p = pixel;
            }
        })
    }

    fn run(r: &dyn BasicRenderer, w: usize, h: usize) -> Vec<u32> {
        let mut data = vec![0; w * h];
        r.render(&mut data, w, h, w as f32, h as f32);
        data
    }

    #[test]
    fn invert_opaque() {
        let r = InvertRenderer::new(fill(0xff10_2030), Invert { alpha_multiplier: 0.5 });
        // alpha 127, colors (239, 223, 207) premultiplied
        assert_eq!(run(&r, 1, 1), vec![pixel::argb(127, 119, 111, 103)]);
    }

    #[test]
    fn transparent_pixels_pass_through() {
        let r = InvertRenderer::new(fill(0), Invert { alpha_multiplier: 1.0 });
        assert_eq!(run(&r, 2, 2), vec![0; 4]);
    }

    #[test]
    fn scale_alpha_rounds() {
        let r = ScaledAlphaRenderer::new(fill(0xffff_ffff), ScaleAlpha { multiplier: 0.5 });
        // 255 * 0.5 = 127.5 rounds to 128
        assert_eq!(run(&r, 1, 1), vec![0x8080_8080]);
    }

    #[test]
    fn paint_using_mask() {
        let r = PaintUsingMaskRenderer::new(
            fill(0x8000_0000),
            PaintUsingMask {
                color: RGBA8::new(255, 0, 0, 255),
            },
        );
        assert_eq!(run(&r, 1, 1), vec![0x8080_0000]);
    }

    #[test]
    fn adjust_dark_toolbar_button() {
        let p = AdjustDarkToolbarButton;
        // Active: 40 + 67 = 107 at alpha 220
        assert_eq!(p.process_pixel(0, 0, 40, 40, 40, 255), create_gray_pixel(107, 220));
        // Inactive: 20 + 49 = 69
        assert_eq!(p.process_pixel(0, 0, 20, 20, 20, 255), create_gray_pixel(69, 220));
        // Translucent pixels are kept
        assert_eq!(p.process_pixel(0, 0, 20, 20, 20, 100), create_pixel(20, 20, 20, 100));
    }

    #[test]
    fn create_pixel_clamps() {
        assert_eq!(create_pixel(300, -5, 255, 255), 0xffff_00ff);
        assert_eq!(create_pixel(255, 255, 255, 0), 0x00ff_ffff);
    }

    #[test]
    fn flip_vertical() {
        let top_only = Arc::new(|data: &mut [u32], w: usize, _: usize, _: f32, _: f32| {
            for p in data[..w].iter_mut() {
                *p = 0xff00_00ff;
            }
        });
        let r = FlipVerticalRenderer::new(top_only);
        assert_eq!(run(&r, 2, 3), vec![0, 0, 0, 0, 0xff00_00ff, 0xff00_00ff]);
    }

    #[test]
    fn nested_post_processing() {
        let inner = Arc::new(InvertRenderer::new(fill(0xff00_0000), Invert { alpha_multiplier: 1.0 }));
        let outer = InvertRenderer::new(inner, Invert { alpha_multiplier: 1.0 });
        assert_eq!(run(&outer, 3, 1), vec![0xff00_0000; 3]);
    }
}
