//! The raster compositing engine.
use aquageom::{prelude::*, Rect};
use cgmath::{Matrix3, Point2, Vector2};
use itertools::iproduct;
use log::trace;
use quick_error::quick_error;
use std::convert::TryFrom;

use crate::{
    canvas::{Canvas, PainterExtension, SkiaCanvas},
    pixel::{self, PixelOperator},
    renderer::BasicRenderer,
    RasterImage,
};

/// The largest supported scale factor.
pub const MAX_SCALE_FACTOR: u32 = 8;

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CompositorError {
        InvalidSize(width: i64, height: i64) {
            display("invalid raster size: {}x{}", width, height)
        }
        InvalidScaleFactor(scale_factor: u32) {
            display("scale factor {} is out of range 1..={}", scale_factor, MAX_SCALE_FACTOR)
        }
    }
}

/// Something that can be composited onto a [`ReusableCompositor`].
pub trait PixelSource {
    /// Composite `self` onto `compositor`, whose size and scale factor are
    /// already set.
    fn compose_to(&self, compositor: &mut ReusableCompositor);
}

/// A resizable premultiplied ARGB raster that accumulates renderings.
///
/// `reset` only records the new configuration. The buffer is (re)allocated
/// and cleared the first time pixels are touched, so a compositor that is
/// reset but never drawn into costs nothing. A buffer that is already large
/// enough is reused.
///
/// A compositor is not meant to be shared. Mutating it while a
/// [`RasterImage`] borrowed from it is alive is rejected by the borrow
/// checker.
#[derive(Debug, Clone)]
pub struct ReusableCompositor {
    data: Vec<u32>,
    raster_width: usize,
    raster_height: usize,
    scale_factor: u32,
    is_configured: bool,
    /// `true` if no pixels have been written since the last reset. Only used
    /// to skip blending.
    is_empty: bool,
}

impl Default for ReusableCompositor {
    fn default() -> Self {
        Self::new()
    }
}

fn check_config(raster_width: i32, raster_height: i32, scale_factor: u32) -> Result<(), CompositorError> {
    if raster_width < 0 || raster_height < 0 {
        return Err(CompositorError::InvalidSize(
            i64::from(raster_width),
            i64::from(raster_height),
        ));
    }
    if scale_factor < 1 || scale_factor > MAX_SCALE_FACTOR {
        return Err(CompositorError::InvalidScaleFactor(scale_factor));
    }
    Ok(())
}

/// The pixel rectangle of a `width` × `height` raster.
fn raster_bounds(width: usize, height: usize) -> Rect<i64> {
    Rect::from_size(width as i64, height as i64)
}

fn region(x: i32, y: i32, width: i32, height: i32) -> Rect<i64> {
    Rect::new(i64::from(x), i64::from(y), i64::from(width), i64::from(height))
}

impl ReusableCompositor {
    /// Construct an empty compositor with a zero-sized raster.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            raster_width: 0,
            raster_height: 0,
            scale_factor: 1,
            is_configured: false,
            is_empty: true,
        }
    }

    pub fn with_size(raster_width: i32, raster_height: i32, scale_factor: u32) -> Result<Self, CompositorError> {
        let mut this = Self::new();
        this.reset(raster_width, raster_height, scale_factor)?;
        Ok(this)
    }

    /// Wrap existing premultiplied ARGB pixels.
    pub fn from_pixels(
        data: Vec<u32>,
        raster_width: usize,
        raster_height: usize,
        scale_factor: u32,
    ) -> Result<Self, CompositorError> {
        let too_large = || CompositorError::InvalidSize(raster_width as i64, raster_height as i64);
        let w = i32::try_from(raster_width).map_err(|_| too_large())?;
        let h = i32::try_from(raster_height).map_err(|_| too_large())?;
        check_config(w, h, scale_factor)?;
        if data.len() < raster_width * raster_height {
            return Err(too_large());
        }
        Ok(Self {
            data,
            raster_width,
            raster_height,
            scale_factor,
            is_configured: true,
            is_empty: false,
        })
    }

    /// Take the pixel buffer, trimmed to the raster size.
    pub fn into_pixels(mut self) -> Vec<u32> {
        self.ensure_configured();
        let n = self.pixel_count();
        self.data.truncate(n);
        self.data
    }

    pub fn raster_width(&self) -> usize {
        self.raster_width
    }

    pub fn raster_height(&self) -> usize {
        self.raster_height
    }

    pub fn scale_factor(&self) -> u32 {
        self.scale_factor
    }

    /// The width in points.
    pub fn width(&self) -> f32 {
        self.raster_width as f32 / self.scale_factor as f32
    }

    /// The height in points.
    pub fn height(&self) -> f32 {
        self.raster_height as f32 / self.scale_factor as f32
    }

    /// Returns `true` if nothing has been drawn since the last reset.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    fn pixel_count(&self) -> usize {
        self.raster_width * self.raster_height
    }

    /// Change the raster size and scale factor. The contents are discarded,
    /// but the buffer is only reallocated or cleared when next needed.
    pub fn reset(&mut self, raster_width: i32, raster_height: i32, scale_factor: u32) -> Result<(), CompositorError> {
        check_config(raster_width, raster_height, scale_factor)?;
        self.reset_unchecked(raster_width as usize, raster_height as usize, scale_factor);
        Ok(())
    }

    fn reset_unchecked(&mut self, raster_width: usize, raster_height: usize, scale_factor: u32) {
        self.raster_width = raster_width;
        self.raster_height = raster_height;
        self.scale_factor = scale_factor;
        self.is_configured = false;
        self.is_empty = true;
    }

    /// Make the buffer match the current configuration and clear it. Does
    /// nothing if already done since the last reset.
    pub fn ensure_configured(&mut self) {
        if self.is_configured {
            return;
        }
        self.is_configured = true;

        let required = self.pixel_count();
        if required == 0 {
            return;
        }
        if self.data.len() >= required {
            for p in self.data.iter_mut() {
                *p = 0;
            }
        } else {
            trace!(
                "ReusableCompositor: allocating {}x{} pixels (had {})",
                self.raster_width,
                self.raster_height,
                self.data.len()
            );
            self.data = vec![0; required];
        }
    }

    /// Get the configured pixels. Returns `None` if the raster has no pixels
    /// or has not been touched since the last reset, in both cases meaning
    /// there is nothing to read.
    fn source_pixels(&self) -> Option<&[u32]> {
        let n = self.pixel_count();
        if self.is_configured && n > 0 {
            Some(&self.data[..n])
        } else {
            None
        }
    }

    /// Configure the buffer and get the live pixels. Returns `None` for a
    /// zero-sized raster.
    fn live_pixels(&mut self) -> Option<&mut [u32]> {
        self.ensure_configured();
        let n = self.pixel_count();
        if n > 0 {
            Some(&mut self.data[..n])
        } else {
            None
        }
    }

    /// Reset and render `r` as the only content.
    pub fn render(
        &mut self,
        r: &dyn BasicRenderer,
        raster_width: i32,
        raster_height: i32,
        scale_factor: u32,
    ) -> Result<(), CompositorError> {
        self.reset(raster_width, raster_height, scale_factor)?;
        self.render_from(r);
        Ok(())
    }

    /// Composite any pixel source.
    pub fn compose(&mut self, source: &dyn PixelSource) {
        source.compose_to(self);
    }

    /// Render `r` over the whole raster, compositing with existing contents.
    pub fn compose_renderer(&mut self, r: &dyn BasicRenderer) {
        self.ensure_configured();
        if self.pixel_count() == 0 {
            return;
        }
        if self.is_empty {
            // Compositing onto a cleared raster is a plain copy
            self.render_from(r);
        } else {
            let (w, h) = (self.raster_width as i32, self.raster_height as i32);
            self.compose_renderer_in(r, 0, 0, w, h);
        }
    }

    /// Render `r` into a `dw` × `dh` raster at the same scale factor, then
    /// composite it at `(dx, dy)`.
    pub fn compose_renderer_in(&mut self, r: &dyn BasicRenderer, dx: i32, dy: i32, dw: i32, dh: i32) {
        if dw <= 0 || dh <= 0 {
            return;
        }
        trace!("ReusableCompositor: temporary {}x{} raster for a renderer", dw, dh);
        let mut temp = Self::new();
        temp.reset_unchecked(dw as usize, dh as usize, self.scale_factor);
        temp.render_from(r);
        self.compose_from(&temp, dx, dy, dw, dh);
    }

    /// Paint `px` directly into the raster. `(x, y)` is the origin of the
    /// painter's coordinate space, in points.
    pub fn compose_painter(&mut self, px: &dyn PainterExtension, x: f32, y: f32) {
        self.ensure_configured();
        let n = self.pixel_count();
        if n == 0 {
            return;
        }
        self.is_empty = false;

        let mut canvas = match SkiaCanvas::from_argb(
            &self.data[..n],
            self.raster_width as u32,
            self.raster_height as u32,
        ) {
            Some(canvas) => canvas,
            None => return,
        };
        canvas.mult_transform(
            Matrix3::from_scale_2d(self.scale_factor as f32) * Matrix3::from_translation(Vector2::new(x, y)),
        );
        px.paint(&mut canvas, self.width(), self.height());
        canvas.write_argb(&mut self.data[..n]);
    }

    /// Paint `px` into a `dw` × `dh` raster at the same scale factor, then
    /// composite it at `(dx, dy)`.
    pub fn compose_painter_in(&mut self, px: &dyn PainterExtension, dx: i32, dy: i32, dw: i32, dh: i32) {
        if dw <= 0 || dh <= 0 {
            return;
        }
        trace!("ReusableCompositor: temporary {}x{} raster for a painter", dw, dh);
        let mut temp = Self::new();
        temp.reset_unchecked(dw as usize, dh as usize, self.scale_factor);
        temp.compose_painter(px, 0.0, 0.0);
        self.compose_from(&temp, dx, dy, dw, dh);
    }

    /// Composite the top-left `dw` × `dh` pixels of `source` at `(dx, dy)`.
    pub fn compose_from(&mut self, source: &ReusableCompositor, dx: i32, dy: i32, dw: i32, dh: i32) {
        self.compose_from_region(source, 0, 0, dx, dy, dw, dh);
    }

    /// Composite the `dw` × `dh` region of `source` at `(sx, sy)` onto this
    /// raster at `(dx, dy)`.
    ///
    /// Transparent source pixels are skipped, opaque ones are copied, and the
    /// rest are blended with [`pixel::combine`]. Pixels outside either raster
    /// are ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn compose_from_region(
        &mut self,
        source: &ReusableCompositor,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
    ) {
        self.for_each_overlap(source, sx, sy, dx, dy, dw, dh, pixel::compose_over);
    }

    /// Like [`compose_from_region`](Self::compose_from_region), but combines
    /// every overlapping pixel pair with `op`.
    #[allow(clippy::too_many_arguments)]
    pub fn blend_from(
        &mut self,
        source: &ReusableCompositor,
        op: &dyn PixelOperator,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
    ) {
        self.for_each_overlap(source, sx, sy, dx, dy, dw, dh, |dst, src| *dst = op.combine(*dst, src));
    }

    #[allow(clippy::too_many_arguments)]
    fn for_each_overlap(
        &mut self,
        source: &ReusableCompositor,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
        mut f: impl FnMut(&mut u32, u32),
    ) {
        self.ensure_configured();
        if self.pixel_count() == 0 {
            return;
        }
        let src = match source.source_pixels() {
            Some(src) => src,
            None => return,
        };
        self.is_empty = false;

        let (w, h) = (self.raster_width, self.raster_height);
        let sw = source.raster_width;
        // Source coordinates plus `shift` give destination coordinates
        let shift = Vector2::new(i64::from(dx) - i64::from(sx), i64::from(dy) - i64::from(sy));
        let clipped = match region(dx, dy, dw, dh)
            .intersection(&raster_bounds(w, h))
            .and_then(|r| r.intersection(&raster_bounds(sw, source.raster_height).translate(shift)))
        {
            Some(r) => r,
            None => return,
        };
        let span = clipped.width() as usize;
        let col = clipped.x() as usize;
        let source_col = (clipped.x() - shift.x) as usize;

        for y in clipped.y()..clipped.max().y {
            let (row, source_row) = (y as usize, (y - shift.y) as usize);

            let dst_line = &mut self.data[row * w + col..][..span];
            let src_line = &src[source_row * sw + source_col..][..span];
            for (d, &s) in dst_line.iter_mut().zip(src_line.iter()) {
                f(d, s);
            }
        }
    }

    /// Let `r` write the live pixels directly. Nothing is blended; `r` sees
    /// (and may overwrite) the existing contents.
    pub fn render_from(&mut self, r: &dyn BasicRenderer) {
        let (w, h) = (self.width(), self.height());
        let (rw, rh) = (self.raster_width, self.raster_height);
        if let Some(data) = self.live_pixels() {
            r.render(data, rw, rh, w, h);
            self.is_empty = false;
        }
    }

    /// Clear a rectangle to transparent. Pixels outside the raster are
    /// ignored.
    pub fn erase(&mut self, dx: i32, dy: i32, dw: i32, dh: i32) {
        if dw <= 0 || dh <= 0 {
            return;
        }
        let w = self.raster_width;
        let clipped = match region(dx, dy, dw, dh).intersection(&raster_bounds(w, self.raster_height)) {
            Some(r) => r,
            None => return,
        };
        let data = match self.live_pixels() {
            Some(data) => data,
            None => return,
        };
        let (start, span) = (clipped.x() as usize, clipped.width() as usize);
        for row in clipped.y() as usize..clipped.max().y as usize {
            for p in data[row * w + start..][..span].iter_mut() {
                *p = 0;
            }
        }
    }

    /// Copy `source` mirrored left to right. Transparent source pixels leave
    /// the destination unchanged.
    pub fn copy_horizontally_flipped_from(&mut self, source: &ReusableCompositor) {
        let sw = source.raster_width;
        self.copy_mapped_from(source, |col, row| (sw - 1 - col, row));
    }

    /// Copy `source` mirrored top to bottom. Transparent source pixels leave
    /// the destination unchanged.
    pub fn copy_vertically_flipped_from(&mut self, source: &ReusableCompositor) {
        let sh = source.raster_height;
        self.copy_mapped_from(source, |col, row| (col, sh - 1 - row));
    }

    fn copy_mapped_from(&mut self, source: &ReusableCompositor, map: impl Fn(usize, usize) -> (usize, usize)) {
        let (sw, sh) = (source.raster_width, source.raster_height);
        let (w, h) = (self.raster_width.min(sw), self.raster_height.min(sh));
        let stride = self.raster_width;
        let src = match source.source_pixels() {
            Some(src) => src,
            None => return,
        };
        let data = match self.live_pixels() {
            Some(data) => data,
            None => return,
        };
        for (row, col) in iproduct!(0..h, 0..w) {
            let (source_col, source_row) = map(col, row);
            let p = src[source_row * sw + source_col];
            if pixel::alpha(p) != 0 {
                data[row * stride + col] = p;
            }
        }
        self.is_empty = false;
    }

    /// Create a compositor of the same configuration holding a mirrored
    /// copy of the contents.
    pub fn create_horizontally_flipped_copy(&self) -> ReusableCompositor {
        let mut copy = Self::new();
        copy.reset_unchecked(self.raster_width, self.raster_height, self.scale_factor);
        copy.copy_horizontally_flipped_from(self);
        copy
    }

    pub fn create_vertically_flipped_copy(&self) -> ReusableCompositor {
        let mut copy = Self::new();
        copy.reset_unchecked(self.raster_width, self.raster_height, self.scale_factor);
        copy.copy_vertically_flipped_from(self);
        copy
    }

    /// Get a view of the raster. Returns `None` for a zero-sized raster.
    pub fn image(&mut self) -> Option<RasterImage<'_>> {
        self.ensure_configured();
        let (w, h, sf) = (self.raster_width, self.raster_height, self.scale_factor);
        self.source_pixels().map(|data| RasterImage::new(data, w, h, sf))
    }

    /// Draw the raster onto `canvas` with its top-left corner at `(x, y)`
    /// points.
    pub fn paint(&mut self, canvas: &mut dyn Canvas, x: f32, y: f32) {
        if let Some(image) = self.image() {
            canvas.draw_image(&image, Point2::new(x, y));
        }
    }
}

impl PixelSource for ReusableCompositor {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        let (w, h) = (compositor.raster_width as i32, compositor.raster_height as i32);
        compositor.compose_from(self, 0, 0, w, h);
    }
}
