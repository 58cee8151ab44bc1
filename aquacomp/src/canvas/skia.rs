//! `Canvas` implementation backed by `tiny-skia`.
use aquageom::{prelude::*, PathSegment};
use cgmath::{Matrix3, Point2, SquareMatrix, Vector2};
use std::fmt;
use tiny_skia::{FillRule, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use super::{Canvas, RGBAF32};
use crate::{pixel, RasterImage};

#[derive(Clone)]
struct State {
    transform: Matrix3<f32>,
    fill: RGBAF32,
    stroke: RGBAF32,
    line_width: f32,
    clip: Option<Mask>,
}

/// A software canvas drawing into a premultiplied RGBA pixmap.
///
/// Path points are mapped to device space as they are added, so changing the
/// transformation in the middle of a path only affects the points added
/// afterwards.
pub struct SkiaCanvas {
    pixmap: Pixmap,
    path: Vec<PathSegment<f32>>,
    state: State,
    stack: Vec<State>,
}

impl fmt::Debug for SkiaCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkiaCanvas")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("path_len", &self.path.len())
            .field("stack_depth", &self.stack.len())
            .finish()
    }
}

impl SkiaCanvas {
    /// Construct a transparent canvas. Returns `None` if either dimension is
    /// zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self::with_pixmap(Pixmap::new(width, height)?))
    }

    /// Construct a canvas initialized with the contents of a premultiplied
    /// ARGB raster.
    pub fn from_argb(data: &[u32], width: u32, height: u32) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        argb_to_rgba(data, pixmap.data_mut());
        Some(Self::with_pixmap(pixmap))
    }

    fn with_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            path: Vec::new(),
            state: State {
                transform: Matrix3::identity(),
                fill: RGBAF32::new(0.0, 0.0, 0.0, 1.0),
                stroke: RGBAF32::new(0.0, 0.0, 0.0, 1.0),
                line_width: 1.0,
                clip: None,
            },
            stack: Vec::new(),
        }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Write the contents back as premultiplied ARGB.
    pub fn write_argb(&self, out: &mut [u32]) {
        for (dst, src) in out.iter_mut().zip(self.pixmap.data().chunks_exact(4)) {
            *dst = pixel::argb(
                u32::from(src[3]),
                u32::from(src[0]),
                u32::from(src[1]),
                u32::from(src[2]),
            );
        }
    }

    fn device_point(&self, p: Point2<f32>) -> Point2<f32> {
        self.state.transform.transform_point_2d(p)
    }

    fn build_path(&self) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::new();
        for segment in self.path.iter() {
            match *segment {
                PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
                PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
                PathSegment::CubicTo(c1, c2, p) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
                PathSegment::Close => pb.close(),
            }
        }
        pb.finish()
    }
}

fn argb_to_rgba(data: &[u32], out: &mut [u8]) {
    for (src, dst) in data.iter().zip(out.chunks_exact_mut(4)) {
        dst[0] = pixel::red(*src) as u8;
        dst[1] = pixel::green(*src) as u8;
        dst[2] = pixel::blue(*src) as u8;
        dst[3] = pixel::alpha(*src) as u8;
    }
}

fn solid_paint(color: RGBAF32) -> Paint<'static> {
    let to_u8 = |x: f32| (x.max(0.0).min(1.0) * 255.0 + 0.5) as u8;
    let mut paint = Paint::default();
    paint.set_color_rgba8(to_u8(color.r), to_u8(color.g), to_u8(color.b), to_u8(color.a));
    paint.anti_alias = true;
    paint
}

fn skia_transform(m: &Matrix3<f32>) -> Transform {
    Transform::from_row(m.x.x, m.x.y, m.y.x, m.y.y, m.z.x, m.z.y)
}

impl Canvas for SkiaCanvas {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        } else {
            log::warn!("SkiaCanvas::restore: the state stack is empty");
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn close_path(&mut self) {
        self.path.push(PathSegment::Close);
    }

    fn move_to(&mut self, p: Point2<f32>) {
        let p = self.device_point(p);
        self.path.push(PathSegment::MoveTo(p));
    }

    fn line_to(&mut self, p: Point2<f32>) {
        let p = self.device_point(p);
        self.path.push(PathSegment::LineTo(p));
    }

    fn cubic_bezier_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>) {
        let segment = PathSegment::CubicTo(self.device_point(cp1), self.device_point(cp2), self.device_point(p));
        self.path.push(segment);
    }

    fn fill(&mut self) {
        if let Some(path) = self.build_path() {
            let paint = solid_paint(self.state.fill);
            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                self.state.clip.as_ref(),
            );
        }
    }

    fn stroke(&mut self) {
        if let Some(path) = self.build_path() {
            let paint = solid_paint(self.state.stroke);
            let stroke = Stroke {
                width: self.state.line_width * self.state.transform.mean_scale_2d(),
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &path,
                &paint,
                &stroke,
                Transform::identity(),
                self.state.clip.as_ref(),
            );
        }
    }

    fn clip(&mut self) {
        let path = match self.build_path() {
            Some(path) => path,
            None => return,
        };
        match &mut self.state.clip {
            Some(mask) => mask.intersect_path(&path, FillRule::Winding, true, Transform::identity()),
            clip @ None => {
                if let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) {
                    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
                    *clip = Some(mask);
                }
            }
        }
    }

    fn set_fill_rgb(&mut self, rgb: RGBAF32) {
        self.state.fill = rgb;
    }

    fn set_stroke_rgb(&mut self, rgb: RGBAF32) {
        self.state.stroke = rgb;
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
    }

    fn mult_transform(&mut self, m: Matrix3<f32>) {
        self.state.transform = self.state.transform * m;
    }

    fn draw_image(&mut self, image: &RasterImage<'_>, origin: Point2<f32>) {
        let src = match image.to_pixmap() {
            Some(src) => src,
            None => return,
        };
        let m = self.state.transform
            * Matrix3::from_translation(Vector2::new(origin.x, origin.y))
            * Matrix3::from_scale_2d(1.0 / image.scale_factor() as f32);
        self.pixmap.draw_pixmap(
            0,
            0,
            src.as_ref(),
            &PixmapPaint::default(),
            skia_transform(&m),
            self.state.clip.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquageom::Rect;

    #[test]
    fn fill_rect_is_pixel_aligned() {
        let mut canvas = SkiaCanvas::new(4, 4).unwrap();
        canvas.set_fill_rgb(RGBAF32::new(1.0, 0.0, 0.0, 1.0));
        canvas.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0));

        let mut out = vec![0u32; 16];
        canvas.write_argb(&mut out);
        assert_eq!(out[0], 0);
        assert_eq!(out[5], 0xffff_0000);
        assert_eq!(out[10], 0xffff_0000);
        assert_eq!(out[15], 0);
    }

    #[test]
    fn transform_scales_points() {
        let mut canvas = SkiaCanvas::new(4, 4).unwrap();
        canvas.mult_transform(Matrix3::from_scale_2d(2.0));
        canvas.set_fill_rgb(RGBAF32::new(0.0, 0.0, 1.0, 1.0));
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));

        let mut out = vec![0u32; 16];
        canvas.write_argb(&mut out);
        assert_eq!(out[5], 0xff00_00ff);
        assert_eq!(out[6], 0);
    }

    #[test]
    fn clip_limits_fill() {
        let mut canvas = SkiaCanvas::new(4, 4).unwrap();
        canvas.clip_rect(Rect::new(0.0, 0.0, 2.0, 4.0));
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0));

        let mut out = vec![0u32; 16];
        canvas.write_argb(&mut out);
        assert_eq!(out[1], 0xff00_0000);
        assert_eq!(out[2], 0);
    }

    #[test]
    fn argb_round_trip() {
        let data = [0x8040_2010u32, 0, 0xff00_ff00, 0x0101_0101];
        let canvas = SkiaCanvas::from_argb(&data, 2, 2).unwrap();
        let mut out = [0u32; 4];
        canvas.write_argb(&mut out);
        assert_eq!(out, data);
    }
}
