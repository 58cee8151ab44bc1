//! Vector drawing used by painter extensions.
use aquageom::{ExpandableOutline, PathSegment, Rect, Shape};
use cgmath::{Matrix3, Point2};
use std::fmt::Debug;

use crate::RasterImage;

mod skia;

pub use self::skia::SkiaCanvas;

/// A straight-alpha color with components in `[0, 1]`.
pub type RGBAF32 = rgb::RGBA<f32>;

/// A drawing context.
///
/// Coordinates are in points. The current transformation maps them to the
/// raster pixels of the destination.
pub trait Canvas: Debug {
    /// Push a copy of the current graphics state onto the state stack.
    fn save(&mut self);
    /// Pop a graphics state from the state stack.
    fn restore(&mut self);

    /// Start a new empty path.
    fn begin_path(&mut self);
    /// Close the current figure of the current path.
    fn close_path(&mut self);

    /// Begin a new subpath at the specified point.
    fn move_to(&mut self, p: Point2<f32>);
    /// Append a straight line to the specified point.
    fn line_to(&mut self, p: Point2<f32>);
    /// Append a cubic Bézier curve to the specified point, using the provided
    /// control points.
    fn cubic_bezier_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>);

    /// Add a rectangle to the current path.
    fn rect(&mut self, r: Rect<f32>) {
        canvas_rect(self, r)
    }
    /// Add the outline of a shape to the current path.
    fn shape(&mut self, shape: &Shape) {
        canvas_shape(self, shape)
    }

    /// Fill the area within the current path, using the non-zero winding number
    /// rule.
    fn fill(&mut self);
    /// Draw a line along the current path.
    fn stroke(&mut self);
    /// Set the current clipping region to its intersection with the area within
    /// current path.
    fn clip(&mut self);

    /// Stroke the specified rectangle.
    ///
    /// The implementation of this method may invalidate the current path.
    fn stroke_rect(&mut self, r: Rect<f32>) {
        self.begin_path();
        self.rect(r);
        self.stroke();
    }
    /// Fill the specified rectangle.
    ///
    /// The implementation of this method may invalidate the current path.
    fn fill_rect(&mut self, r: Rect<f32>) {
        self.begin_path();
        self.rect(r);
        self.fill();
    }
    /// Set the current clipping region to its intersection with the specified
    /// rectangle.
    ///
    /// The implementation of this method may invalidate the current path.
    fn clip_rect(&mut self, r: Rect<f32>) {
        self.begin_path();
        self.rect(r);
        self.clip();
    }

    /// Set the current fill brush to a solid color.
    fn set_fill_rgb(&mut self, rgb: RGBAF32);
    /// Set the current stroke brush to a solid color.
    fn set_stroke_rgb(&mut self, rgb: RGBAF32);
    /// Set the line width in points. Defaults to `1.0`.
    fn set_line_width(&mut self, width: f32);

    /// Transform the local coordinate system.
    ///
    /// Only affine transformations are supported.
    fn mult_transform(&mut self, m: Matrix3<f32>);

    /// Draw a raster with its top-left corner at `origin`. The raster is
    /// scaled down by its scale factor so that it covers its size in points.
    fn draw_image(&mut self, image: &RasterImage<'_>, origin: Point2<f32>);
}

pub fn canvas_rect(canvas: &mut (impl Canvas + ?Sized), r: Rect<f32>) {
    let (min, max) = (r.origin, r.max());
    canvas.move_to(min);
    canvas.line_to(Point2::new(max.x, min.y));
    canvas.line_to(max);
    canvas.line_to(Point2::new(min.x, max.y));
    canvas.close_path();
}

pub fn canvas_shape(canvas: &mut (impl Canvas + ?Sized), shape: &Shape) {
    let cast = |p: Point2<f64>| Point2::new(p.x as f32, p.y as f32);
    for segment in shape.segments(None) {
        match segment {
            PathSegment::MoveTo(p) => canvas.move_to(cast(p)),
            PathSegment::LineTo(p) => canvas.line_to(cast(p)),
            PathSegment::CubicTo(c1, c2, p) => canvas.cubic_bezier_to(cast(c1), cast(c2), cast(p)),
            PathSegment::Close => canvas.close_path(),
        }
    }
}

/// Renders by issuing vector drawing commands instead of writing pixels.
pub trait PainterExtension: Send + Sync {
    /// Paint a `width` × `height` point area starting at the origin of
    /// `canvas`.
    fn paint(&self, canvas: &mut dyn Canvas, width: f32, height: f32);
}

impl<F: Fn(&mut dyn Canvas, f32, f32) + Send + Sync> PainterExtension for F {
    fn paint(&self, canvas: &mut dyn Canvas, width: f32, height: f32) {
        self(canvas, width, height)
    }
}

/// Strokes a ring just outside an outline.
#[derive(Debug, Clone)]
pub struct FocusRingPainter {
    pub outline: ExpandableOutline,
    /// The gap between the outline and the inner edge of the ring.
    pub offset: f64,
    pub width: f32,
    pub color: RGBAF32,
}

impl PainterExtension for FocusRingPainter {
    fn paint(&self, canvas: &mut dyn Canvas, _width: f32, _height: f32) {
        // Stroke along the center line of the ring
        let shape = self.outline.shape(self.offset + f64::from(self.width) / 2.0);
        canvas.save();
        canvas.set_stroke_rgb(self.color);
        canvas.set_line_width(self.width);
        canvas.begin_path();
        canvas.shape(&shape);
        canvas.stroke();
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records path commands.
    #[derive(Debug, Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl Canvas for Recorder {
        fn save(&mut self) {
            self.log.push("save".to_owned());
        }
        fn restore(&mut self) {
            self.log.push("restore".to_owned());
        }
        fn begin_path(&mut self) {
            self.log.push("begin".to_owned());
        }
        fn close_path(&mut self) {
            self.log.push("close".to_owned());
        }
        fn move_to(&mut self, p: Point2<f32>) {
            self.log.push(format!("move {} {}", p.x, p.y));
        }
        fn line_to(&mut self, p: Point2<f32>) {
            self.log.push(format!("line {} {}", p.x, p.y));
        }
        fn cubic_bezier_to(&mut self, _: Point2<f32>, _: Point2<f32>, p: Point2<f32>) {
            self.log.push(format!("cubic {} {}", p.x, p.y));
        }
        fn fill(&mut self) {
            self.log.push("fill".to_owned());
        }
        fn stroke(&mut self) {
            self.log.push("stroke".to_owned());
        }
        fn clip(&mut self) {}
        fn set_fill_rgb(&mut self, _: RGBAF32) {}
        fn set_stroke_rgb(&mut self, _: RGBAF32) {}
        fn set_line_width(&mut self, w: f32) {
            self.log.push(format!("width {}", w));
        }
        fn mult_transform(&mut self, _: Matrix3<f32>) {}
        fn draw_image(&mut self, _: &RasterImage<'_>, _: Point2<f32>) {}
    }

    #[test]
    fn fill_rect_emits_closed_path() {
        let mut c = Recorder::default();
        c.fill_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            c.log,
            ["begin", "move 1 2", "line 4 2", "line 4 6", "line 1 6", "close", "fill"]
        );
    }

    #[test]
    fn focus_ring_strokes_center_line() {
        let painter = FocusRingPainter {
            outline: ExpandableOutline::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
            offset: 1.0,
            width: 2.0,
            color: RGBAF32::new(0.0, 0.0, 1.0, 1.0),
        };
        let mut c = Recorder::default();
        painter.paint(&mut c, 10.0, 10.0);
        assert_eq!(c.log[1], "width 2");
        assert_eq!(c.log[3], "move -2 -2");
        assert_eq!(c.log[5], "line 12 12");
        assert_eq!(c.log[c.log.len() - 2], "stroke");
    }
}
