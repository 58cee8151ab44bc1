//! Premultiplied ARGB pixel arithmetic.
//!
//! A pixel is a `u32` laid out as `0xAARRGGBB` where each color channel has
//! already been multiplied by alpha. Every function here uses the exact
//! integer arithmetic the rest of the crate's golden images depend on.
use aquageom::Rect;
use cgmath::Point2;

/// Pack four channels into a pixel. Each channel is masked to eight bits.
#[inline]
pub fn argb(a: u32, r: u32, g: u32, b: u32) -> u32 {
    ((a & 0xff) << 24) | ((r & 0xff) << 16) | ((g & 0xff) << 8) | (b & 0xff)
}

#[inline]
pub fn alpha(pixel: u32) -> u32 {
    pixel >> 24
}

#[inline]
pub fn red(pixel: u32) -> u32 {
    (pixel >> 16) & 0xff
}

#[inline]
pub fn green(pixel: u32) -> u32 {
    (pixel >> 8) & 0xff
}

#[inline]
pub fn blue(pixel: u32) -> u32 {
    pixel & 0xff
}

/// Composite `new` over `old` ("source over" on premultiplied pixels).
///
/// A fully transparent `new` yields `old`. Otherwise color channels are
/// attenuated with `>> 8` while alpha uses an exact division by 255. The
/// resulting rounding bias is part of the output format and must not be
/// corrected.
#[inline]
pub fn combine(old: u32, new: u32) -> u32 {
    let na = alpha(new);
    if na == 0 {
        return old;
    }
    let f = 255 - na;

    let r = (red(new) + ((red(old) * f) >> 8)) & 0xff;
    let g = (green(new) + ((green(old) * f) >> 8)) & 0xff;
    let b = (blue(new) + ((blue(old) * f) >> 8)) & 0xff;
    let a = ((255 * na + alpha(old) * f) / 255) & 0xff;

    (a << 24) | (r << 16) | (g << 8) | b
}

/// Apply a source pixel to a destination pixel with the shortcuts used by
/// every compositing loop: a fully transparent source leaves the destination
/// untouched and an opaque source replaces it.
#[inline]
pub fn compose_over(dst: &mut u32, src: u32) {
    match alpha(src) {
        0 => {}
        0xff => *dst = src,
        _ => *dst = combine(*dst, src),
    }
}

/// Composite a single pixel into a row-major raster. Coordinates outside the
/// raster are ignored.
pub fn compose_pixel(data: &mut [u32], raster_width: usize, raster_height: usize, x: i32, y: i32, pixel: u32) {
    let bounds = Rect::from_size(raster_width as i64, raster_height as i64);
    if !bounds.contains_point(Point2::new(i64::from(x), i64::from(y))) {
        return;
    }
    if let Some(dst) = data.get_mut(y as usize * raster_width + x as usize) {
        compose_over(dst, pixel);
    }
}

/// Convert a straight-alpha color to a premultiplied pixel. Channels are
/// rounded to nearest.
#[inline]
pub fn premultiply(a: u32, r: u32, g: u32, b: u32) -> u32 {
    if a == 0xff {
        argb(a, r, g, b)
    } else {
        let mul = |c: u32| (c * a + 127) / 255;
        argb(a, mul(r), mul(g), mul(b))
    }
}

/// Convert a premultiplied pixel to straight-alpha `[r, g, b, a]`.
#[inline]
pub fn unpremultiply(pixel: u32) -> [u32; 4] {
    let a = alpha(pixel);
    let un = |c: u32| if c > 0 && a > 0 { (c * 255 / a).min(255) } else { c };
    [un(red(pixel)), un(green(pixel)), un(blue(pixel)), a]
}

/// A per-pixel blending function used by
/// [`ReusableCompositor::blend_from`](crate::ReusableCompositor::blend_from).
pub trait PixelOperator {
    /// Compute the new destination pixel from the existing destination pixel
    /// and a source pixel.
    fn combine(&self, dst: u32, src: u32) -> u32;
}

impl<F: Fn(u32, u32) -> u32> PixelOperator for F {
    fn combine(&self, dst: u32, src: u32) -> u32 {
        self(dst, src)
    }
}

/// The standard "source over" operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOver;

impl PixelOperator for SourceOver {
    fn combine(&self, dst: u32, src: u32) -> u32 {
        let mut dst = dst;
        compose_over(&mut dst, src);
        dst
    }
}

/// Turns a coverage mask into a dark gray overlay.
///
/// The mask's alpha is boosted five times (saturating), and the resulting
/// gray is composited over the destination. Pixels the mask does not cover
/// are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromMaskOperator;

impl PixelOperator for FromMaskOperator {
    fn combine(&self, dst: u32, src: u32) -> u32 {
        let a = alpha(src);
        if a == 0 {
            return dst;
        }
        let a = (a * 5).min(255);
        let v = 73 * a / 255;
        combine(dst, argb(a, v, v, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    const OPAQUE_RED: u32 = 0xffff_0000;

    #[test]
    fn combine_half_blue_over_red() {
        // Premultiplied blue at alpha 128
        assert_eq!(combine(OPAQUE_RED, 0x8000_0080), 0xff7e_0080);
        // The same channels taken literally (blue = 255)
        assert_eq!(combine(OPAQUE_RED, 0x8000_00ff), 0xff7e_00ff);
    }

    #[test]
    fn combine_channel_uses_shift() {
        // 255 * 1 >> 8 truncates to 0 where / 255 would give 1
        assert_eq!(combine(0xffff_ffff, 0xfe00_0000), 0xff00_0000);
    }

    #[quickcheck]
    fn combine_transparent_is_identity(old: u32, rgb: u32) -> bool {
        let new = rgb & 0x00ff_ffff;
        let mut dst = old;
        compose_over(&mut dst, new);
        combine(old, new) == old && dst == old
    }

    #[quickcheck]
    fn combine_opaque_replaces(old: u32, rgb: u32) -> bool {
        let new = 0xff00_0000 | (rgb & 0x00ff_ffff);
        combine(old, new) == new
    }

    #[test]
    fn compose_pixel_ignores_out_of_bounds() {
        let mut data = vec![0u32; 4];
        compose_pixel(&mut data, 2, 2, -1, 0, OPAQUE_RED);
        compose_pixel(&mut data, 2, 2, 2, 0, OPAQUE_RED);
        compose_pixel(&mut data, 2, 2, 0, 2, OPAQUE_RED);
        assert_eq!(data, vec![0; 4]);
        compose_pixel(&mut data, 2, 2, 1, 1, OPAQUE_RED);
        assert_eq!(data, vec![0, 0, 0, OPAQUE_RED]);
    }

    #[test]
    fn from_mask_boosts_alpha() {
        assert_eq!(FromMaskOperator.combine(0x1234_5678, 0), 0x1234_5678);
        // alpha 10 -> 50, gray 73 * 50 / 255 = 14
        assert_eq!(FromMaskOperator.combine(0, 0x0a00_0000), argb(50, 14, 14, 14));
        // alpha 100 -> 255, fully opaque gray 73
        assert_eq!(FromMaskOperator.combine(OPAQUE_RED, 0x6400_0000), argb(255, 73, 73, 73));
    }

    #[test]
    fn premultiply_round_trip() {
        let p = premultiply(128, 255, 0, 64);
        assert_eq!(p, argb(128, 128, 0, 32));
        assert_eq!(unpremultiply(p), [255, 0, 63, 128]);
    }

    #[test]
    fn premultiply_rounds_to_nearest() {
        // 170 * 127 / 255 = 84.67
        assert_eq!(premultiply(127, 170, 170, 170), argb(127, 85, 85, 85));
        assert_eq!(premultiply(1, 127, 128, 255), argb(1, 0, 1, 1));
        assert_eq!(premultiply(0, 200, 200, 200), 0);
    }
}
