use cgmath::{Matrix3, Point2, Vector2};
use quick_error::quick_error;
use std::f64::consts::FRAC_PI_4;

use super::{Matrix3TwoDimExt, PathSegment, Rect};

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PathIterError {
        /// The iterator has already produced its final segment.
        Exhausted {
            display("path iteration has finished")
        }
    }
}

/// Identifies a corner of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

/// A rectangle whose four corners have independent arc sizes.
///
/// Like the classic round rectangle, an arc size is the full width and height
/// of the ellipse the corner is cut from, not its radius. A zero arc leaves
/// the corner square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralRoundRect {
    pub bounds: Rect<f64>,
    /// Arc sizes indexed by [`Corner`].
    pub arcs: [Vector2<f64>; 4],
}

impl GeneralRoundRect {
    pub fn new(
        bounds: Rect<f64>,
        top_left: Vector2<f64>,
        top_right: Vector2<f64>,
        bottom_right: Vector2<f64>,
        bottom_left: Vector2<f64>,
    ) -> Self {
        Self {
            bounds,
            arcs: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Construct a shape with the same arc on every corner.
    pub fn uniform(bounds: Rect<f64>, arc: Vector2<f64>) -> Self {
        Self {
            bounds,
            arcs: [arc; 4],
        }
    }

    pub fn arc(&self, corner: Corner) -> Vector2<f64> {
        self.arcs[corner as usize]
    }

    /// Grow the shape outward by `offset`, keeping the gap between the old
    /// and new outlines uniform. Rounded corners grow with the edges; square
    /// corners stay square.
    pub fn expanded(&self, offset: f64) -> Self {
        let mut arcs = self.arcs;
        for arc in arcs.iter_mut() {
            *arc = expand_arc(*arc, offset);
        }
        Self {
            bounds: self.bounds.expanded(offset),
            arcs,
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            bounds: self.bounds.translate(Vector2::new(dx, dy)),
            arcs: self.arcs,
        }
    }

    /// Iterate over the outline, optionally mapping it through `transform`.
    pub fn path_iter(&self, transform: Option<Matrix3<f64>>) -> GeneralRoundRectIter {
        GeneralRoundRectIter::new(self, transform)
    }
}

/// Expand one arc dimension pair. Components that are not positive become
/// zero, so square corners stay square.
pub(crate) fn expand_arc(arc: Vector2<f64>, offset: f64) -> Vector2<f64> {
    let grow = |v: f64| if v > 0.0 { v + offset } else { 0.0 };
    Vector2::new(grow(arc.x), grow(arc.y))
}

// Bézier approximation of a quarter circle: a control point sits at `CV` of
// the way from the arc end towards the corner.
const ANGLE: f64 = FRAC_PI_4;

fn control_value() -> f64 {
    let a = 1.0 - ANGLE.cos();
    let b = ANGLE.tan();
    let c = (1.0 + b * b).sqrt() - 1.0 + a;
    4.0 / 3.0 * a * b / c
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Move,
    Line,
    Cubic,
    Close,
}

const SEGMENT_KINDS: [SegmentKind; 10] = [
    SegmentKind::Move,
    SegmentKind::Line,
    SegmentKind::Cubic,
    SegmentKind::Line,
    SegmentKind::Cubic,
    SegmentKind::Line,
    SegmentKind::Cubic,
    SegmentKind::Line,
    SegmentKind::Cubic,
    SegmentKind::Close,
];

/// Iterates over the segments of a [`GeneralRoundRect`] counter-clockwise,
/// starting on the left edge below the top-left corner.
///
/// The sequence is one move, four line/cubic pairs (bottom-left,
/// bottom-right, top-right, top-left corners), and a close.
#[derive(Debug, Clone)]
pub struct GeneralRoundRectIter {
    origin: Point2<f64>,
    size: Vector2<f64>,
    /// Clamped arc sizes, in traversal order: top-left, bottom-left,
    /// bottom-right, top-right.
    arcs: [Vector2<f64>; 4],
    transform: Option<Matrix3<f64>>,
    acv: f64,
    index: usize,
    corner: usize,
}

impl GeneralRoundRectIter {
    fn new(shape: &GeneralRoundRect, transform: Option<Matrix3<f64>>) -> Self {
        let r = &shape.bounds;
        let (w, h) = (r.width(), r.height());
        let clamp = |arc: Vector2<f64>| Vector2::new(w.min(arc.x.abs()), h.min(arc.y.abs()));
        let arcs = [
            clamp(shape.arc(Corner::TopLeft)),
            clamp(shape.arc(Corner::BottomLeft)),
            clamp(shape.arc(Corner::BottomRight)),
            clamp(shape.arc(Corner::TopRight)),
        ];
        Self {
            origin: r.origin,
            size: r.size,
            arcs,
            transform,
            acv: (1.0 - control_value()) / 2.0,
            // A shape with a negative size has no outline
            index: if w < 0.0 || h < 0.0 {
                SEGMENT_KINDS.len()
            } else {
                0
            },
            corner: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.index >= SEGMENT_KINDS.len()
    }

    /// Advance to the next segment.
    pub fn advance(&mut self) {
        self.index += 1;
        if self.index % 2 == 1 {
            self.corner = (self.corner + 1) % 4;
        }
    }

    /// Get the segment at the current position.
    pub fn current_segment(&self) -> Result<PathSegment<f64>, PathIterError> {
        if self.is_done() {
            return Err(PathIterError::Exhausted);
        }

        let acv = self.acv;
        let z = [0.0; 4];
        // Each entry is `[w factor, arc w factor, h factor, arc h factor]`
        let coefs: [[f64; 4]; 3] = match self.index {
            0 => [[0.0, 0.0, 0.0, 0.5], z, z],
            1 => [[0.0, 0.0, 1.0, -0.5], z, z],
            2 => [
                [0.0, 0.0, 1.0, -acv],
                [0.0, acv, 1.0, 0.0],
                [0.0, 0.5, 1.0, 0.0],
            ],
            3 => [[1.0, -0.5, 1.0, 0.0], z, z],
            4 => [
                [1.0, -acv, 1.0, 0.0],
                [1.0, 0.0, 1.0, -acv],
                [1.0, 0.0, 1.0, -0.5],
            ],
            5 => [[1.0, 0.0, 0.0, 0.5], z, z],
            6 => [
                [1.0, 0.0, 0.0, acv],
                [1.0, -acv, 0.0, 0.0],
                [1.0, -0.5, 0.0, 0.0],
            ],
            7 => [[0.0, 0.5, 0.0, 0.0], z, z],
            8 => [
                [0.0, acv, 0.0, 0.0],
                [0.0, 0.0, 0.0, acv],
                [0.0, 0.0, 0.0, 0.5],
            ],
            _ => [z, z, z],
        };

        let arc = self.arcs[self.corner];
        let point = |c: &[f64; 4]| {
            let p = Point2::new(
                self.origin.x + c[0] * self.size.x + c[1] * arc.x,
                self.origin.y + c[2] * self.size.y + c[3] * arc.y,
            );
            match &self.transform {
                Some(m) => m.transform_point_2d(p),
                None => p,
            }
        };

        Ok(match SEGMENT_KINDS[self.index] {
            SegmentKind::Move => PathSegment::MoveTo(point(&coefs[0])),
            SegmentKind::Line => PathSegment::LineTo(point(&coefs[0])),
            SegmentKind::Cubic => {
                PathSegment::CubicTo(point(&coefs[0]), point(&coefs[1]), point(&coefs[2]))
            }
            SegmentKind::Close => PathSegment::Close,
        })
    }
}

impl Iterator for GeneralRoundRectIter {
    type Item = PathSegment<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.current_segment().ok()?;
        self.advance();
        Some(segment)
    }
}
