use cgmath::{BaseFloat, Matrix3, Point2};

use super::{Matrix3TwoDimExt, Rect};

/// A single path construction command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment<S> {
    MoveTo(Point2<S>),
    LineTo(Point2<S>),
    /// A cubic Bézier curve: two control points, then the end point.
    CubicTo(Point2<S>, Point2<S>, Point2<S>),
    Close,
}

impl<S: BaseFloat> PathSegment<S> {
    /// Map every point of the segment through an affine transformation.
    pub fn transform(&self, m: &Matrix3<S>) -> Self {
        match *self {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(m.transform_point_2d(p)),
            PathSegment::LineTo(p) => PathSegment::LineTo(m.transform_point_2d(p)),
            PathSegment::CubicTo(c1, c2, p) => PathSegment::CubicTo(
                m.transform_point_2d(c1),
                m.transform_point_2d(c2),
                m.transform_point_2d(p),
            ),
            PathSegment::Close => PathSegment::Close,
        }
    }

    /// The points referenced by the segment, in order.
    pub fn points(&self) -> impl Iterator<Item = Point2<S>> {
        let mut buf = arrayvec::ArrayVec::<[Point2<S>; 3]>::new();
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => buf.push(p),
            PathSegment::CubicTo(c1, c2, p) => {
                buf.push(c1);
                buf.push(c2);
                buf.push(p);
            }
            PathSegment::Close => {}
        }
        buf.into_iter()
    }
}

/// An arbitrary recorded path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    segments: Vec<PathSegment<f64>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::LineTo(p));
        self
    }

    pub fn cubic_to(&mut self, c1: Point2<f64>, c2: Point2<f64>, p: Point2<f64>) -> &mut Self {
        self.segments.push(PathSegment::CubicTo(c1, c2, p));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self
    }

    pub fn segments(&self) -> &[PathSegment<f64>] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Compute the bounding box of all points, including control points.
    /// Returns `None` for a path without points.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let mut points = self.segments.iter().flat_map(|s| s.points());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Rect::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    pub fn transformed(&self, m: &Matrix3<f64>) -> Self {
        Self {
            segments: self.segments.iter().map(|s| s.transform(m)).collect(),
        }
    }
}

impl std::iter::FromIterator<PathSegment<f64>> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment<f64>>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_include_control_points() {
        let mut path = Path::new();
        path.move_to(Point2::new(0.0, 0.0))
            .cubic_to(Point2::new(-2.0, 5.0), Point2::new(4.0, 6.0), Point2::new(3.0, 1.0))
            .close();
        assert_eq!(path.bounds(), Some(Rect::new(-2.0, 0.0, 6.0, 6.0)));
    }

    #[test]
    fn empty_path_has_no_bounds() {
        assert_eq!(Path::new().bounds(), None);
    }
}
