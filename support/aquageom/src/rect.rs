use cgmath::{num_traits::NumCast, BaseFloat, BaseNum, Point2, Vector2};

/// An axis-aligned rectangle represented by its origin and size.
///
/// This is the shape of every target rectangle handled by the compositor.
/// Unlike a min/max box, the size is stored as given, so a width computed as
/// `target.width + adjustment` survives without being re-derived from two
/// rounded edges.
#[repr(C)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Rect<S> {
    /// The top-left corner.
    pub origin: Point2<S>,

    /// The width (`x`) and height (`y`). May be negative, in which case the
    /// rectangle is empty.
    pub size: Vector2<S>,
}

impl<S: BaseNum> Rect<S> {
    #[inline]
    pub fn new(x: S, y: S, width: S, height: S) -> Self {
        Self {
            origin: Point2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    /// Construct a rectangle at the origin.
    #[inline]
    pub fn from_size(width: S, height: S) -> Self {
        Self::new(S::zero(), S::zero(), width, height)
    }

    #[inline]
    pub fn zero() -> Self {
        Self::from_size(S::zero(), S::zero())
    }

    #[inline]
    pub fn x(&self) -> S {
        self.origin.x
    }
    #[inline]
    pub fn y(&self) -> S {
        self.origin.y
    }
    #[inline]
    pub fn width(&self) -> S {
        self.size.x
    }
    #[inline]
    pub fn height(&self) -> S {
        self.size.y
    }

    /// The bottom-right corner (exclusive).
    #[inline]
    pub fn max(&self) -> Point2<S> {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.x <= S::zero() || self.size.y <= S::zero()
    }

    #[inline]
    pub fn contains_point(&self, point: Point2<S>) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.y >= self.origin.y && point.x < max.x && point.y < max.y
    }

    #[inline]
    pub fn translate(&self, displacement: Vector2<S>) -> Self {
        Self {
            origin: self.origin + displacement,
            size: self.size,
        }
    }

    /// Compute the overlapping region. Returns `None` if the rectangles do not
    /// overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (max1, max2) = (self.max(), other.max());
        let x = partial_max(self.origin.x, other.origin.x);
        let y = partial_max(self.origin.y, other.origin.y);
        let s = Self::new(
            x,
            y,
            partial_min(max1.x, max2.x) - x,
            partial_min(max1.y, max2.y) - y,
        );
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

impl<S: BaseFloat> Rect<S> {
    #[inline]
    pub fn center(&self) -> Point2<S> {
        let two = S::one() + S::one();
        self.origin + self.size / two
    }

    /// Grow every edge outward by `offset`. A negative offset shrinks the
    /// rectangle.
    #[inline]
    pub fn expanded(&self, offset: S) -> Self {
        let two = S::one() + S::one();
        Self::new(
            self.origin.x - offset,
            self.origin.y - offset,
            self.size.x + offset * two,
            self.size.y + offset * two,
        )
    }
}

impl<S: NumCast + Copy> Rect<S> {
    /// Component-wise casting to another type
    #[inline]
    pub fn cast<T: NumCast>(&self) -> Option<Rect<T>> {
        Some(Rect {
            origin: self.origin.cast()?,
            size: self.size.cast()?,
        })
    }
}

#[inline]
fn partial_min<S: PartialOrd>(a: S, b: S) -> S {
    if b < a {
        b
    } else {
        a
    }
}

#[inline]
fn partial_max<S: PartialOrd>(a: S, b: S) -> S {
    if b > a {
        b
    } else {
        a
    }
}

#[cfg(feature = "quickcheck")]
mod arbitrary {
    use super::Rect;
    use quickcheck::{Arbitrary, Gen};

    // Coordinates land on quarter points, which is what widget layouts
    // produce in practice.
    fn coord<G: Gen>(g: &mut G) -> i16 {
        i16::arbitrary(g) % 2048
    }

    impl Arbitrary for Rect<f32> {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Rect::new(
                f32::from(coord(g)) / 4.0,
                f32::from(coord(g)) / 4.0,
                f32::from(coord(g).abs()) / 4.0,
                f32::from(coord(g).abs()) / 4.0,
            )
        }
    }

    impl Arbitrary for Rect<f64> {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Rect::<f32>::arbitrary(g).cast().unwrap_or_else(Rect::zero)
        }
    }
}
