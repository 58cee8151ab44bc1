use cgmath::{BaseFloat, Matrix3, Point2, Vector2};

/// 2D affine transformations expressed as homogeneous `Matrix3`s.
///
/// `cgmath` treats `Matrix3` as a non-translating 3D transformation, so the
/// 2D constructors live in this extension trait instead. Matrices are
/// column-major; the third column holds the translation.
pub trait Matrix3TwoDimExt<S>: Sized {
    /// Create a homogeneous transformation matrix from a translation vector.
    fn from_translation(v: Vector2<S>) -> Self;
    /// Create a homogeneous transformation matrix from a scale value.
    fn from_scale_2d(value: S) -> Self;
    /// Create a homogeneous transformation matrix from a set of scale values.
    fn from_nonuniform_scale_2d(x: S, y: S) -> Self;
    /// Apply the transformation to a point.
    fn transform_point_2d(&self, p: Point2<S>) -> Point2<S>;
    /// Apply the linear part of the transformation to a vector.
    fn transform_vector_2d(&self, v: Vector2<S>) -> Vector2<S>;
    /// The geometric mean of the axis scale factors, used to convert a
    /// user-space line width to device space.
    fn mean_scale_2d(&self) -> S;
}

impl<S: BaseFloat> Matrix3TwoDimExt<S> for Matrix3<S> {
    #[inline]
    fn from_translation(v: Vector2<S>) -> Self {
        #[cfg_attr(rustfmt, rustfmt_skip)]
        Self::new(
            S::one(), S::zero(), S::zero(),
            S::zero(), S::one(), S::zero(),
            v.x, v.y, S::one(),
        )
    }

    #[inline]
    fn from_scale_2d(value: S) -> Self {
        Self::from_nonuniform_scale_2d(value, value)
    }

    #[inline]
    fn from_nonuniform_scale_2d(x: S, y: S) -> Self {
        #[cfg_attr(rustfmt, rustfmt_skip)]
        Self::new(
            x, S::zero(), S::zero(),
            S::zero(), y, S::zero(),
            S::zero(), S::zero(), S::one(),
        )
    }

    #[inline]
    fn transform_point_2d(&self, p: Point2<S>) -> Point2<S> {
        Point2::new(
            self.x.x * p.x + self.y.x * p.y + self.z.x,
            self.x.y * p.x + self.y.y * p.y + self.z.y,
        )
    }

    #[inline]
    fn transform_vector_2d(&self, v: Vector2<S>) -> Vector2<S> {
        Vector2::new(
            self.x.x * v.x + self.y.x * v.y,
            self.x.y * v.x + self.y.y * v.y,
        )
    }

    #[inline]
    fn mean_scale_2d(&self) -> S {
        (self.x.x * self.y.y - self.x.y * self.y.x).abs().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_then_translate() {
        // Points are translated first, then scaled
        let m = Matrix3::from_scale_2d(2.0) * Matrix3::from_translation(Vector2::new(1.0, 3.0));
        assert_eq!(m.transform_point_2d(Point2::new(1.0, 1.0)), Point2::new(4.0, 8.0));
        assert_eq!(m.mean_scale_2d(), 2.0);
    }
}
