use cgmath::{Matrix3, Point2, Vector2};

use super::{expand_arc, GeneralRoundRect, GeneralRoundRectIter, Matrix3TwoDimExt, Path, PathSegment, Rect};

/// A closed shape in point space.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Rect<f64>),
    /// A rounded rectangle. `arc` is the full size of the corner ellipse.
    RoundRect {
        bounds: Rect<f64>,
        arc: Vector2<f64>,
    },
    Ellipse(Rect<f64>),
    GeneralRoundRect(GeneralRoundRect),
    Path(Path),
}

impl Shape {
    /// The bounding box. For a path this includes control points.
    pub fn bounds(&self) -> Rect<f64> {
        match self {
            Shape::Rect(r) | Shape::Ellipse(r) => *r,
            Shape::RoundRect { bounds, .. } => *bounds,
            Shape::GeneralRoundRect(s) => s.bounds,
            Shape::Path(p) => p.bounds().unwrap_or_else(Rect::zero),
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let d = Vector2::new(dx, dy);
        match self {
            Shape::Rect(r) => Shape::Rect(r.translate(d)),
            Shape::Ellipse(r) => Shape::Ellipse(r.translate(d)),
            Shape::RoundRect { bounds, arc } => Shape::RoundRect {
                bounds: bounds.translate(d),
                arc: *arc,
            },
            Shape::GeneralRoundRect(s) => Shape::GeneralRoundRect(s.translated(dx, dy)),
            Shape::Path(p) => Shape::Path(p.transformed(&Matrix3::from_translation(d))),
        }
    }

    /// Iterate over the path segments of the outline.
    pub fn segments(&self, transform: Option<Matrix3<f64>>) -> ShapeSegments {
        let owned = |segments: Vec<PathSegment<f64>>| match transform {
            Some(m) => segments.iter().map(|s| s.transform(&m)).collect::<Vec<_>>(),
            None => segments,
        };
        match self {
            Shape::Rect(r) => {
                let (min, max) = (r.origin, r.max());
                ShapeSegments::Owned(
                    owned(vec![
                        PathSegment::MoveTo(min),
                        PathSegment::LineTo(Point2::new(max.x, min.y)),
                        PathSegment::LineTo(max),
                        PathSegment::LineTo(Point2::new(min.x, max.y)),
                        PathSegment::Close,
                    ])
                    .into_iter(),
                )
            }
            Shape::RoundRect { bounds, arc } => ShapeSegments::RoundRect(
                GeneralRoundRect::uniform(*bounds, *arc).path_iter(transform),
            ),
            Shape::Ellipse(r) => ShapeSegments::RoundRect(
                GeneralRoundRect::uniform(*r, r.size).path_iter(transform),
            ),
            Shape::GeneralRoundRect(s) => ShapeSegments::RoundRect(s.path_iter(transform)),
            Shape::Path(p) => ShapeSegments::Owned(owned(p.segments().to_vec()).into_iter()),
        }
    }
}

/// The iterator returned by [`Shape::segments`].
#[derive(Debug, Clone)]
pub enum ShapeSegments {
    RoundRect(GeneralRoundRectIter),
    Owned(std::vec::IntoIter<PathSegment<f64>>),
}

impl Iterator for ShapeSegments {
    type Item = PathSegment<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ShapeSegments::RoundRect(it) => it.next(),
            ShapeSegments::Owned(it) => it.next(),
        }
    }
}

/// An outline that can be grown to produce a concentric shape, e.g., the
/// outer edge of a focus ring.
///
/// For every variant except `Generic`, `shape(d)` moves each edge outward by
/// exactly `d` and grows each rounded corner's arc by `d`. Square corners
/// stay square. `shape(0.0)` reproduces the original geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandableOutline {
    Rect(Rect<f64>),
    RoundRect { bounds: Rect<f64>, arc: Vector2<f64> },
    Ellipse(Rect<f64>),
    GeneralRoundRect(GeneralRoundRect),
    /// An arbitrary path, expanded by scaling about the center of its
    /// bounding box. The gap is only uniform for shapes that are symmetric
    /// enough.
    Generic(Path),
}

impl ExpandableOutline {
    pub fn from_shape(shape: Shape) -> Self {
        match shape {
            Shape::Rect(r) => ExpandableOutline::Rect(r),
            Shape::RoundRect { bounds, arc } => ExpandableOutline::RoundRect { bounds, arc },
            Shape::Ellipse(r) => ExpandableOutline::Ellipse(r),
            Shape::GeneralRoundRect(s) => ExpandableOutline::GeneralRoundRect(s),
            Shape::Path(p) => ExpandableOutline::Generic(p),
        }
    }

    /// Get the outline expanded by `offset` points.
    pub fn shape(&self, offset: f64) -> Shape {
        match self {
            ExpandableOutline::Rect(r) => Shape::Rect(r.expanded(offset)),
            ExpandableOutline::Ellipse(r) => Shape::Ellipse(r.expanded(offset)),
            ExpandableOutline::RoundRect { bounds, arc } => Shape::RoundRect {
                bounds: bounds.expanded(offset),
                arc: expand_arc(*arc, offset),
            },
            ExpandableOutline::GeneralRoundRect(s) => Shape::GeneralRoundRect(s.expanded(offset)),
            ExpandableOutline::Generic(path) => {
                let bounds = match path.bounds() {
                    Some(b) if b.width() > 0.0 && b.height() > 0.0 && offset != 0.0 => b,
                    _ => return Shape::Path(path.clone()),
                };
                let c = bounds.center();
                let m = Matrix3::from_translation(Vector2::new(c.x, c.y))
                    * Matrix3::from_nonuniform_scale_2d(
                        (bounds.width() + 2.0 * offset) / bounds.width(),
                        (bounds.height() + 2.0 * offset) / bounds.height(),
                    )
                    * Matrix3::from_translation(Vector2::new(-c.x, -c.y));
                Shape::Path(path.transformed(&m))
            }
        }
    }

    /// The bounding box of the unexpanded outline.
    pub fn bounds(&self) -> Rect<f64> {
        self.shape(0.0).bounds()
    }
}
