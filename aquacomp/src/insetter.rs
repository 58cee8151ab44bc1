//! Placement of a sub-region inside a component of variable size.
//!
//! An [`Insetter1`] handles one axis. [`CombinedInsetter`] pairs a horizontal
//! and a vertical one into an [`Insetter`], which maps component bounds to
//! region bounds and, when every axis allows it, region sizes back to
//! component sizes.
use aquageom::Rect;
use cgmath::Vector2;
use quick_error::quick_error;
use std::{fmt, sync::Arc};

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum InsetterError {
        InvalidArgument(reason: &'static str) {
            display("invalid insetter argument: {}", reason)
        }
        NotInvertible {
            display("insetter is not invertible")
        }
    }
}

/// A one-dimensional region placement.
pub trait Insetter1: fmt::Debug + Send + Sync {
    fn region_origin(&self, component_size: f32) -> f32;

    fn region_size(&self, component_size: f32) -> f32;

    /// Whether [`component_size`](Insetter1::component_size) is available.
    fn is_invertible(&self) -> bool;

    /// The component size that yields the given region size.
    fn component_size(&self, region_size: f32) -> Result<f32, InsetterError>;

    /// The distance from the start of the component to the region, if it is
    /// independent of the component size.
    fn fixed_inset1(&self) -> Option<f32> {
        None
    }

    /// The distance from the end of the region to the end of the component,
    /// if it is independent of the component size.
    fn fixed_inset2(&self) -> Option<f32> {
        None
    }

    /// The region size, if it is independent of the component size.
    fn fixed_region_size(&self) -> Option<f32> {
        None
    }

    fn apply(&self, component_size: f32) -> LinearBounds {
        LinearBounds {
            origin: self.region_origin(component_size),
            length: self.region_size(component_size),
        }
    }
}

/// An origin and a length along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearBounds {
    pub origin: f32,
    pub length: f32,
}

impl LinearBounds {
    pub fn end(&self) -> f32 {
        self.origin + self.length
    }
}

fn check_non_negative(v: f32, reason: &'static str) -> Result<(), InsetterError> {
    if v < 0.0 {
        Err(InsetterError::InvalidArgument(reason))
    } else {
        Ok(())
    }
}

/// Fixed distances from both ends; the region takes up the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedInsetter1 {
    d1: f32,
    d2: f32,
}

impl FixedInsetter1 {
    pub fn new(d1: f32, d2: f32) -> Result<Self, InsetterError> {
        check_non_negative(d1, "negative inset")?;
        check_non_negative(d2, "negative inset")?;
        Ok(Self { d1, d2 })
    }
}

impl Insetter1 for FixedInsetter1 {
    fn region_origin(&self, _: f32) -> f32 {
        self.d1
    }

    fn region_size(&self, component_size: f32) -> f32 {
        component_size - (self.d1 + self.d2)
    }

    fn is_invertible(&self) -> bool {
        true
    }

    fn component_size(&self, region_size: f32) -> Result<f32, InsetterError> {
        Ok(region_size + self.d1 + self.d2)
    }

    fn fixed_inset1(&self) -> Option<f32> {
        Some(self.d1)
    }

    fn fixed_inset2(&self) -> Option<f32> {
        Some(self.d2)
    }
}

/// A fixed-size region centered in the component, optionally displaced.
///
/// Centering uses the alignment size, which may differ from the region
/// size when the visible part of the region is asymmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredInsetter1 {
    region: f32,
    alignment_region: f32,
    offset: f32,
}

impl CenteredInsetter1 {
    pub fn centered(region: f32) -> Result<Self, InsetterError> {
        Self::new(region, region, 0.0)
    }

    pub fn centered_with_offset(region: f32, offset: f32) -> Result<Self, InsetterError> {
        Self::new(region, region, offset)
    }

    pub fn new(region: f32, alignment_region: f32, offset: f32) -> Result<Self, InsetterError> {
        check_non_negative(region, "negative region size")?;
        Ok(Self {
            region,
            alignment_region,
            offset,
        })
    }
}

impl Insetter1 for CenteredInsetter1 {
    fn region_origin(&self, component_size: f32) -> f32 {
        (component_size - self.alignment_region) / 2.0 + self.offset
    }

    fn region_size(&self, _: f32) -> f32 {
        self.region
    }

    fn is_invertible(&self) -> bool {
        false
    }

    fn component_size(&self, _: f32) -> Result<f32, InsetterError> {
        Err(InsetterError::NotInvertible)
    }

    fn fixed_region_size(&self) -> Option<f32> {
        Some(self.region)
    }
}

/// The edge a [`FloatingInsetter1`] keeps its region against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Left or top.
    Start,
    /// Right or bottom.
    End,
    Center,
}

/// A fixed-size region kept at a minimum distance from the component
/// edges, anchored to one edge or centered in the excess space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingInsetter1 {
    region: f32,
    d1: f32,
    d2: f32,
    alignment: Alignment,
}

impl FloatingInsetter1 {
    pub fn left_top_aligned(region: f32, d1: f32) -> Result<Self, InsetterError> {
        Self::new(region, d1, 0.0, Alignment::Start)
    }

    pub fn right_bottom_aligned(region: f32, d2: f32) -> Result<Self, InsetterError> {
        Self::new(region, 0.0, d2, Alignment::End)
    }

    pub fn centered(region: f32, d1: f32, d2: f32) -> Result<Self, InsetterError> {
        Self::new(region, d1, d2, Alignment::Center)
    }

    fn new(region: f32, d1: f32, d2: f32, alignment: Alignment) -> Result<Self, InsetterError> {
        check_non_negative(region, "negative region size")?;
        check_non_negative(d1, "negative inset")?;
        check_non_negative(d2, "negative inset")?;
        Ok(Self {
            region,
            d1,
            d2,
            alignment,
        })
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
}

impl Insetter1 for FloatingInsetter1 {
    fn region_origin(&self, component_size: f32) -> f32 {
        match self.alignment {
            Alignment::Start => self.d1,
            Alignment::End => component_size - (self.region + self.d2),
            Alignment::Center => {
                let excess = component_size - (self.region + self.d1 + self.d2);
                self.d1 + excess / 2.0
            }
        }
    }

    fn region_size(&self, _: f32) -> f32 {
        self.region
    }

    fn is_invertible(&self) -> bool {
        true
    }

    fn component_size(&self, region_size: f32) -> Result<f32, InsetterError> {
        Ok(region_size + self.d1 + self.d2)
    }

    fn fixed_inset1(&self) -> Option<f32> {
        match self.alignment {
            Alignment::Start | Alignment::Center => Some(self.d1),
            Alignment::End => None,
        }
    }

    fn fixed_inset2(&self) -> Option<f32> {
        match self.alignment {
            Alignment::End | Alignment::Center => Some(self.d2),
            Alignment::Start => None,
        }
    }

    fn fixed_region_size(&self) -> Option<f32> {
        Some(self.region)
    }
}

/// Both the region and the component have fixed sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidInsetter1 {
    region: f32,
    component: f32,
    d1: f32,
}

impl RigidInsetter1 {
    pub fn new(region: f32, component: f32, d1: f32) -> Result<Self, InsetterError> {
        if region < 0.0 || component < 0.0 {
            return Err(InsetterError::InvalidArgument(
                "negative region or component size",
            ));
        }
        if region > component {
            return Err(InsetterError::InvalidArgument(
                "region size exceeds component size",
            ));
        }
        if d1 < 0.0 || d1 > component - region {
            return Err(InsetterError::InvalidArgument("offset out of range"));
        }
        Ok(Self {
            region,
            component,
            d1,
        })
    }

    fn d2(&self) -> f32 {
        self.component - self.region - self.d1
    }
}

impl Insetter1 for RigidInsetter1 {
    fn region_origin(&self, _: f32) -> f32 {
        self.d1
    }

    fn region_size(&self, _: f32) -> f32 {
        self.region
    }

    fn is_invertible(&self) -> bool {
        true
    }

    fn component_size(&self, region_size: f32) -> Result<f32, InsetterError> {
        Ok(self.component.max(region_size + self.d1 + self.d2()))
    }

    fn fixed_inset1(&self) -> Option<f32> {
        Some(self.d1)
    }

    fn fixed_inset2(&self) -> Option<f32> {
        Some(self.d2())
    }

    fn fixed_region_size(&self) -> Option<f32> {
        Some(self.region)
    }
}

/// A fixed-size region whose center is computed from the component size.
pub struct DynamicInsetter1 {
    region: f32,
    alignment_region: f32,
    center: Box<dyn Fn(f32) -> f32 + Send + Sync>,
}

impl fmt::Debug for DynamicInsetter1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicInsetter1")
            .field("region", &self.region)
            .field("alignment_region", &self.alignment_region)
            .finish()
    }
}

impl DynamicInsetter1 {
    pub fn new(
        region: f32,
        alignment_region: f32,
        center: impl Fn(f32) -> f32 + Send + Sync + 'static,
    ) -> Result<Self, InsetterError> {
        check_non_negative(region, "negative region size")?;
        Ok(Self {
            region,
            alignment_region,
            center: Box::new(center),
        })
    }
}

impl Insetter1 for DynamicInsetter1 {
    fn region_origin(&self, component_size: f32) -> f32 {
        (self.center)(component_size) - self.alignment_region / 2.0
    }

    fn region_size(&self, _: f32) -> f32 {
        self.region
    }

    fn is_invertible(&self) -> bool {
        false
    }

    fn component_size(&self, _: f32) -> Result<f32, InsetterError> {
        Err(InsetterError::NotInvertible)
    }

    fn fixed_region_size(&self) -> Option<f32> {
        Some(self.region)
    }
}

/// Insets in points, in `top, left, bottom, right` order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets2D {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Insets2D {
    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Round every inset up to a whole point.
    pub fn to_insets(&self) -> Insets {
        Insets {
            top: self.top.ceil() as i32,
            left: self.left.ceil() as i32,
            bottom: self.bottom.ceil() as i32,
            right: self.right.ceil() as i32,
        }
    }
}

/// Whole-point insets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Insets {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

/// A two-dimensional region placement.
pub trait Insetter: fmt::Debug + Send + Sync {
    fn apply_to_bounds(&self, bounds: Rect<f32>) -> Rect<f32>;

    /// Apply to integer bounds, shrinking the result to whole points.
    fn apply_to_int_bounds(&self, bounds: Rect<i32>) -> Rect<i32>;

    fn apply(&self, width: f32, height: f32) -> Rect<f32> {
        self.apply_to_bounds(Rect::from_size(width, height))
    }

    fn apply_int(&self, width: i32, height: i32) -> Rect<i32> {
        self.apply_to_int_bounds(Rect::from_size(width, height))
    }

    fn is_invertible(&self) -> bool;

    /// The smallest whole-point component size whose region has the given
    /// size.
    fn expand(&self, region_size: Vector2<f32>) -> Result<Vector2<i32>, InsetterError>;

    /// Describe the insetter as fixed insets, if it is that simple.
    fn as_insets2d(&self) -> Option<Insets2D> {
        None
    }

    fn as_insets(&self) -> Option<Insets> {
        self.as_insets2d().map(|i| i.to_insets())
    }
}

/// An independent [`Insetter1`] for each axis.
#[derive(Debug, Clone)]
pub struct CombinedInsetter {
    horizontal: Arc<dyn Insetter1>,
    vertical: Arc<dyn Insetter1>,
}

impl CombinedInsetter {
    pub fn new(horizontal: impl Insetter1 + 'static, vertical: impl Insetter1 + 'static) -> Self {
        Self {
            horizontal: Arc::new(horizontal),
            vertical: Arc::new(vertical),
        }
    }

    pub fn from_shared(horizontal: Arc<dyn Insetter1>, vertical: Arc<dyn Insetter1>) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn horizontal(&self) -> &dyn Insetter1 {
        &*self.horizontal
    }

    pub fn vertical(&self) -> &dyn Insetter1 {
        &*self.vertical
    }

    pub fn fixed_region_width(&self) -> Option<f32> {
        self.horizontal.fixed_region_size()
    }

    pub fn fixed_region_height(&self) -> Option<f32> {
        self.vertical.fixed_region_size()
    }
}

/// Place `ins` within `[start, start + size)` and shrink the result to whole
/// units.
fn apply_int_axis(ins: &dyn Insetter1, start: i32, size: i32) -> (i32, i32) {
    let size = size as f32;
    let xx = f64::from(start) + f64::from(ins.region_origin(size));
    let mut ww = f64::from(ins.region_size(size));
    let x = xx.ceil();
    ww -= x - xx;
    (x as i32, ww.floor() as i32)
}

fn non_negative(v: Option<f32>) -> Option<f32> {
    v.filter(|&v| v >= 0.0)
}

impl Insetter for CombinedInsetter {
    fn apply_to_bounds(&self, bounds: Rect<f32>) -> Rect<f32> {
        let (w, h) = (bounds.width(), bounds.height());
        Rect::new(
            bounds.x() + self.horizontal.region_origin(w),
            bounds.y() + self.vertical.region_origin(h),
            self.horizontal.region_size(w),
            self.vertical.region_size(h),
        )
    }

    fn apply_to_int_bounds(&self, bounds: Rect<i32>) -> Rect<i32> {
        let (x, w) = apply_int_axis(&*self.horizontal, bounds.x(), bounds.width());
        let (y, h) = apply_int_axis(&*self.vertical, bounds.y(), bounds.height());
        Rect::new(x, y, w, h)
    }

    fn is_invertible(&self) -> bool {
        self.horizontal.is_invertible() && self.vertical.is_invertible()
    }

    fn expand(&self, region_size: Vector2<f32>) -> Result<Vector2<i32>, InsetterError> {
        let w = self.horizontal.component_size(region_size.x)?;
        let h = self.vertical.component_size(region_size.y)?;
        Ok(Vector2::new(w.ceil() as i32, h.ceil() as i32))
    }

    fn as_insets2d(&self) -> Option<Insets2D> {
        let left = non_negative(self.horizontal.fixed_inset1())?;
        let right = non_negative(self.horizontal.fixed_inset2())?;
        let top = non_negative(self.vertical.fixed_inset1())?;
        let bottom = non_negative(self.vertical.fixed_inset2())?;
        Some(Insets2D::new(top, left, bottom, right))
    }
}

/// Two insetters applied one after the other: the second works on the
/// region produced by the first.
#[derive(Debug, Clone)]
pub struct InsetterSequence {
    first: Arc<dyn Insetter>,
    second: Arc<dyn Insetter>,
}

impl InsetterSequence {
    pub fn new(first: impl Insetter + 'static, second: impl Insetter + 'static) -> Self {
        Self {
            first: Arc::new(first),
            second: Arc::new(second),
        }
    }
}

impl Insetter for InsetterSequence {
    fn apply_to_bounds(&self, bounds: Rect<f32>) -> Rect<f32> {
        self.second.apply_to_bounds(self.first.apply_to_bounds(bounds))
    }

    fn apply_to_int_bounds(&self, bounds: Rect<i32>) -> Rect<i32> {
        self.second
            .apply_to_int_bounds(self.first.apply_to_int_bounds(bounds))
    }

    fn is_invertible(&self) -> bool {
        self.first.is_invertible() && self.second.is_invertible()
    }

    fn expand(&self, region_size: Vector2<f32>) -> Result<Vector2<i32>, InsetterError> {
        let inner = self.second.expand(region_size)?;
        self.first
            .expand(Vector2::new(inner.x as f32, inner.y as f32))
    }
}

/// Common insetter shapes.
pub mod insetters {
    use super::*;
    use crate::layout::LayoutInfo;

    /// Fixed insets on all four sides.
    pub fn fixed(
        top: f32,
        left: f32,
        bottom: f32,
        right: f32,
    ) -> Result<CombinedInsetter, InsetterError> {
        Ok(CombinedInsetter::new(
            FixedInsetter1::new(left, right)?,
            FixedInsetter1::new(top, bottom)?,
        ))
    }

    /// Fixed insets, except that an axis whose component size is fixed by
    /// `layout` gets a rigid insetter.
    pub fn fixed_with_layout(
        top: f32,
        left: f32,
        bottom: f32,
        right: f32,
        layout: Option<&LayoutInfo>,
    ) -> Result<CombinedInsetter, InsetterError> {
        let axis = |fixed: f32, d1: f32, d2: f32| -> Result<Arc<dyn Insetter1>, InsetterError> {
            if fixed > 0.0 {
                Ok(Arc::new(RigidInsetter1::new(fixed - (d1 + d2), fixed, d1)?))
            } else {
                Ok(Arc::new(FixedInsetter1::new(d1, d2)?))
            }
        };
        let (fw, fh) = layout.map_or((0.0, 0.0), |l| {
            (l.fixed_visual_width(), l.fixed_visual_height())
        });
        Ok(CombinedInsetter::from_shared(
            axis(fw, left, right)?,
            axis(fh, top, bottom)?,
        ))
    }

    /// A region of fixed width at a fixed distance from the left edge.
    pub fn left_aligned(
        width: f32,
        left: f32,
        top: f32,
        bottom: f32,
    ) -> Result<CombinedInsetter, InsetterError> {
        Ok(CombinedInsetter::new(
            FloatingInsetter1::left_top_aligned(width, left)?,
            FixedInsetter1::new(top, bottom)?,
        ))
    }

    /// A region of fixed width at a fixed distance from the right edge.
    pub fn right_aligned(
        width: f32,
        right: f32,
        top: f32,
        bottom: f32,
    ) -> Result<CombinedInsetter, InsetterError> {
        Ok(CombinedInsetter::new(
            FloatingInsetter1::right_bottom_aligned(width, right)?,
            FixedInsetter1::new(top, bottom)?,
        ))
    }

    pub fn top_aligned(
        height: f32,
        top: f32,
        left: f32,
        right: f32,
    ) -> Result<CombinedInsetter, InsetterError> {
        Ok(CombinedInsetter::new(
            FixedInsetter1::new(left, right)?,
            FloatingInsetter1::left_top_aligned(height, top)?,
        ))
    }

    pub fn bottom_aligned(
        height: f32,
        bottom: f32,
        left: f32,
        right: f32,
    ) -> Result<CombinedInsetter, InsetterError> {
        Ok(CombinedInsetter::new(
            FixedInsetter1::new(left, right)?,
            FloatingInsetter1::right_bottom_aligned(height, bottom)?,
        ))
    }
}
