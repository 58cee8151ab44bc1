//! Mapping target rectangles to the rasters a renderer actually needs.
use aquageom::Rect;
use quick_error::quick_error;
use std::fmt;

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AdjustError {
        /// The description has no basic form the adjustment can be applied
        /// to.
        Unsupported {
            display("renderer description cannot be adjusted")
        }
    }
}

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RenderInsetsError {
        NegativeLeft {
            display("left inset must not be negative")
        }
        NegativeTop {
            display("top inset must not be negative")
        }
    }
}

/// The location and size of a raster in points, aligned to raster pixels for
/// some scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterDescription {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RasterDescription {
    /// Convert to raster pixels: origins are rounded, sizes are rounded up so
    /// that a renderer never receives a raster smaller than it asked for.
    pub fn to_raster_region(&self, scale_factor: u32) -> RasterRegion {
        let sf = scale_factor as f32;
        RasterRegion {
            x: round_to_pixel(sf * self.x),
            y: round_to_pixel(sf * self.y),
            width: (sf * self.width).ceil() as i32,
            height: (sf * self.height).ceil() as i32,
        }
    }
}

/// A rectangle in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Round half up to the nearest integer.
#[inline]
pub(crate) fn round_to_pixel(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Round `v` to the nearest multiple of `1 / scale_factor` (half up).
#[inline]
fn round_for_scale(v: f64, scale_factor: u32) -> f32 {
    (v * f64::from(scale_factor) + 0.5).floor() as f32 / scale_factor as f32
}

/// Fixed offsets and size adjustments applied to the target rectangle.
///
/// Negative offsets place the raster above or to the left of the target,
/// which is how a renderer that draws outside the nominal widget bounds is
/// described.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BasicRendererDescription {
    pub x_offset: f32,
    pub y_offset: f32,
    pub width_adjustment: f32,
    pub height_adjustment: f32,
}

impl BasicRendererDescription {
    pub fn new(x_offset: f32, y_offset: f32, width_adjustment: f32, height_adjustment: f32) -> Self {
        Self {
            x_offset,
            y_offset,
            width_adjustment,
            height_adjustment,
        }
    }

    pub fn raster_bounds(&self, target: &Rect<f32>, scale_factor: u32) -> RasterDescription {
        RasterDescription {
            x: round_for_scale(f64::from(target.x()) + f64::from(self.x_offset), scale_factor),
            y: round_for_scale(f64::from(target.y()) + f64::from(self.y_offset), scale_factor),
            width: round_for_scale(
                f64::from(target.width()) + f64::from(self.width_adjustment),
                scale_factor,
            ),
            height: round_for_scale(
                f64::from(target.height()) + f64::from(self.height_adjustment),
                scale_factor,
            ),
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.x_offset == 0.0
            && self.y_offset == 0.0
            && self.width_adjustment == 0.0
            && self.height_adjustment == 0.0
    }

    pub fn with_adjustments(&self, dx: f32, dy: f32, dw: f32, dh: f32) -> Self {
        Self::new(
            self.x_offset + dx,
            self.y_offset + dy,
            self.width_adjustment + dw,
            self.height_adjustment + dh,
        )
    }

    fn with_change(&self, change: &DescriptionChange) -> Self {
        Self::new(
            change.x_offset.unwrap_or(self.x_offset),
            change.y_offset.unwrap_or(self.y_offset),
            change.width_adjustment.unwrap_or(self.width_adjustment),
            change.height_adjustment.unwrap_or(self.height_adjustment),
        )
    }
}

/// Chooses between two descriptions depending on whether the raster is
/// rendered at 1x or at a higher scale factor.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiResolutionRendererDescription {
    pub low_resolution: RendererDescription,
    pub high_resolution: RendererDescription,
}

/// Describes how a renderer's raster relates to the target rectangle.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererDescription {
    /// The raster is the target rectangle.
    Trivial,
    Basic(BasicRendererDescription),
    MultiResolution(Box<MultiResolutionRendererDescription>),
}

impl Default for RendererDescription {
    fn default() -> Self {
        RendererDescription::Trivial
    }
}

impl From<BasicRendererDescription> for RendererDescription {
    fn from(x: BasicRendererDescription) -> Self {
        RendererDescription::Basic(x)
    }
}

impl RendererDescription {
    pub fn basic(x_offset: f32, y_offset: f32, width_adjustment: f32, height_adjustment: f32) -> Self {
        RendererDescription::Basic(BasicRendererDescription::new(
            x_offset,
            y_offset,
            width_adjustment,
            height_adjustment,
        ))
    }

    pub fn multi_resolution(low_resolution: RendererDescription, high_resolution: RendererDescription) -> Self {
        RendererDescription::MultiResolution(Box::new(MultiResolutionRendererDescription {
            low_resolution,
            high_resolution,
        }))
    }

    /// Compute the raster needed to render `target` at `scale_factor`.
    ///
    /// The result depends only on the arguments, so it may be used as part
    /// of a cache key.
    pub fn raster_bounds(&self, target: &Rect<f32>, scale_factor: u32) -> RasterDescription {
        match self {
            RendererDescription::Trivial => RasterDescription {
                x: target.x(),
                y: target.y(),
                width: target.width(),
                height: target.height(),
            },
            RendererDescription::Basic(d) => d.raster_bounds(target, scale_factor),
            RendererDescription::MultiResolution(m) => m
                .for_scale_factor(scale_factor)
                .raster_bounds(target, scale_factor),
        }
    }

    /// Returns `true` if the raster always coincides with the target. Callers
    /// use this to skip the description math entirely.
    pub fn is_trivial(&self) -> bool {
        match self {
            RendererDescription::Trivial => true,
            RendererDescription::Basic(_) => false,
            RendererDescription::MultiResolution(m) => {
                m.low_resolution.is_trivial() && m.high_resolution.is_trivial()
            }
        }
    }

    /// Get the basic form of the description. A trivial description is
    /// equivalent to an all-zero basic description.
    pub fn as_basic(&self) -> Option<BasicRendererDescription> {
        match self {
            RendererDescription::Trivial => Some(BasicRendererDescription::default()),
            RendererDescription::Basic(d) => Some(*d),
            RendererDescription::MultiResolution(_) => None,
        }
    }

    /// Get the basic form of the description in effect at `scale_factor`.
    pub fn to_basic(&self, scale_factor: u32) -> Option<BasicRendererDescription> {
        match self {
            RendererDescription::MultiResolution(m) => m.for_scale_factor(scale_factor).to_basic(scale_factor),
            _ => self.as_basic(),
        }
    }

    /// Add offsets and size adjustments.
    ///
    /// Fails if the adjustment cannot be represented. Dropping it instead
    /// would misplace the rendering by a few pixels.
    pub fn adjusted(&self, dx: f32, dy: f32, dw: f32, dh: f32) -> Result<Self, AdjustError> {
        if dx == 0.0 && dy == 0.0 && dw == 0.0 && dh == 0.0 {
            return Ok(self.clone());
        }
        self.map_basic(|d| d.with_adjustments(dx, dy, dw, dh))
    }

    /// Replace selected fields.
    pub fn changed(&self, change: &DescriptionChange) -> Result<Self, AdjustError> {
        if change.is_empty() {
            return Ok(self.clone());
        }
        self.map_basic(|d| d.with_change(change))
    }

    fn map_basic(
        &self,
        f: impl Fn(&BasicRendererDescription) -> BasicRendererDescription,
    ) -> Result<Self, AdjustError> {
        if let Some(d) = self.as_basic() {
            return Ok(RendererDescription::Basic(f(&d)));
        }
        if let RendererDescription::MultiResolution(m) = self {
            if let (Some(d1), Some(d2)) = (m.low_resolution.as_basic(), m.high_resolution.as_basic()) {
                return Ok(Self::multi_resolution(
                    RendererDescription::Basic(f(&d1)),
                    RendererDescription::Basic(f(&d2)),
                ));
            }
        }
        Err(AdjustError::Unsupported)
    }
}

impl MultiResolutionRendererDescription {
    pub fn for_scale_factor(&self, scale_factor: u32) -> &RendererDescription {
        if scale_factor == 1 {
            &self.low_resolution
        } else {
            &self.high_resolution
        }
    }
}

/// A partial replacement of the fields of a basic description. `None` keeps
/// the existing value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DescriptionChange {
    pub x_offset: Option<f32>,
    pub y_offset: Option<f32>,
    pub width_adjustment: Option<f32>,
    pub height_adjustment: Option<f32>,
}

impl DescriptionChange {
    pub fn is_empty(&self) -> bool {
        self.x_offset.is_none()
            && self.y_offset.is_none()
            && self.width_adjustment.is_none()
            && self.height_adjustment.is_none()
    }
}

/// Extra space a renderer paints around the nominal widget bounds.
///
/// `left` and `top` are the amounts the raster extends beyond the top-left
/// corner; the adjustments are the total growth of each dimension.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderInsets {
    left: f32,
    top: f32,
    width_adjust: f32,
    height_adjust: f32,
}

impl RenderInsets {
    pub fn new(left: f32, top: f32, width_adjust: f32, height_adjust: f32) -> Result<Self, RenderInsetsError> {
        if left < 0.0 {
            return Err(RenderInsetsError::NegativeLeft);
        }
        if top < 0.0 {
            return Err(RenderInsetsError::NegativeTop);
        }
        Ok(Self {
            left,
            top,
            width_adjust,
            height_adjust,
        })
    }

    pub fn left(&self) -> f32 {
        self.left
    }
    pub fn top(&self) -> f32 {
        self.top
    }
    pub fn width_adjust(&self) -> f32 {
        self.width_adjust
    }
    pub fn height_adjust(&self) -> f32 {
        self.height_adjust
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.width_adjust == 0.0 && self.height_adjust == 0.0
    }

    /// Convert to raster pixels. The origin insets are rounded to whole
    /// pixels.
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            left: round_to_pixel(self.left * scale) as f32,
            top: round_to_pixel(self.top * scale) as f32,
            width_adjust: self.width_adjust * scale,
            height_adjust: self.height_adjust * scale,
        }
    }

    pub fn to_description(&self) -> BasicRendererDescription {
        BasicRendererDescription::new(-self.left, -self.top, self.width_adjust, self.height_adjust)
    }
}

impl fmt::Display for RenderInsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "NULL")
        } else {
            write!(
                f,
                "Left={} Top={} W={:+} H={:+}",
                self.left, self.top, self.width_adjust, self.height_adjust
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn basic_rounds_per_scale_factor() {
        let d = BasicRendererDescription::new(-0.25, 0.5, 0.3, 1.0);
        let target = Rect::new(0.0, 0.0, 20.0, 10.0);

        let r1 = d.raster_bounds(&target, 1);
        assert_eq!(r1, RasterDescription { x: 0.0, y: 1.0, width: 20.0, height: 11.0 });

        let r2 = d.raster_bounds(&target, 2);
        assert_eq!(r2, RasterDescription { x: 0.0, y: 0.5, width: 20.5, height: 11.0 });

        // -0.25 * 4 = -1 exactly
        let r4 = d.raster_bounds(&target, 4);
        assert_eq!(r4.x, -0.25);
    }

    #[quickcheck]
    fn basic_width_matches_rounding_formula(target: Rect<f32>, adjust: i8) -> bool {
        let adjust = f32::from(adjust) / 8.0;
        let d = BasicRendererDescription::new(0.0, 0.0, adjust, 0.0);
        [1u32, 2].iter().all(|&sf| {
            let r = d.raster_bounds(&target, sf);
            let expected = ((f64::from(target.width()) + f64::from(adjust)) * f64::from(sf) + 0.5).floor() as f32
                / sf as f32;
            r == d.raster_bounds(&target, sf) && r.width == expected
        })
    }

    #[test]
    fn multi_resolution_selects_by_scale() {
        let d = RendererDescription::multi_resolution(
            RendererDescription::basic(-1.0, 0.0, 2.0, 0.0),
            RendererDescription::basic(-2.0, 0.0, 4.0, 0.0),
        );
        let target = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(d.raster_bounds(&target, 1).x, -1.0);
        assert_eq!(d.raster_bounds(&target, 2).x, -2.0);
        assert_eq!(d.raster_bounds(&target, 3).width, 14.0);
        assert!(!d.is_trivial());
    }

    #[test]
    fn trivial_is_identity() {
        let target = Rect::new(1.5, 2.0, 3.25, 4.0);
        let r = RendererDescription::Trivial.raster_bounds(&target, 2);
        assert_eq!(r, RasterDescription { x: 1.5, y: 2.0, width: 3.25, height: 4.0 });
        assert!(RendererDescription::multi_resolution(
            RendererDescription::Trivial,
            RendererDescription::Trivial
        )
        .is_trivial());
    }

    #[test]
    fn adjust_multi_resolution() {
        let d = RendererDescription::multi_resolution(
            RendererDescription::basic(-1.0, 0.0, 2.0, 0.0),
            RendererDescription::Trivial,
        );
        let adjusted = d.adjusted(1.0, 1.0, 0.0, -1.0).unwrap();
        assert_eq!(
            adjusted,
            RendererDescription::multi_resolution(
                RendererDescription::basic(0.0, 1.0, 2.0, -1.0),
                RendererDescription::basic(1.0, 1.0, 0.0, -1.0),
            )
        );
    }

    #[test]
    fn adjust_nested_multi_resolution_fails() {
        let inner = RendererDescription::multi_resolution(
            RendererDescription::Trivial,
            RendererDescription::Trivial,
        );
        let d = RendererDescription::multi_resolution(inner, RendererDescription::Trivial);
        assert_eq!(d.adjusted(1.0, 0.0, 0.0, 0.0), Err(AdjustError::Unsupported));
        // A no-op adjustment always succeeds
        assert_eq!(d.adjusted(0.0, 0.0, 0.0, 0.0), Ok(d.clone()));
    }

    #[test]
    fn change_keeps_unspecified_fields() {
        let d = RendererDescription::basic(1.0, 2.0, 3.0, 4.0);
        let change = DescriptionChange {
            y_offset: Some(0.0),
            ..Default::default()
        };
        assert_eq!(d.changed(&change), Ok(RendererDescription::basic(1.0, 0.0, 3.0, 4.0)));
    }

    #[test]
    fn to_basic_resolves_scale() {
        let d = RendererDescription::multi_resolution(
            RendererDescription::basic(-1.0, 0.0, 0.0, 0.0),
            RendererDescription::basic(-2.0, 0.0, 0.0, 0.0),
        );
        assert_eq!(d.to_basic(2), Some(BasicRendererDescription::new(-2.0, 0.0, 0.0, 0.0)));
        assert_eq!(d.as_basic(), None);
    }

    #[test]
    fn raster_region_rounds_and_ceils() {
        let r = RasterDescription { x: -0.5, y: 0.75, width: 10.25, height: 3.0 };
        assert_eq!(
            r.to_raster_region(2),
            RasterRegion { x: -1, y: 2, width: 21, height: 6 }
        );
    }

    #[test]
    fn render_insets() {
        assert_eq!(RenderInsets::new(-1.0, 0.0, 0.0, 0.0), Err(RenderInsetsError::NegativeLeft));
        let insets = RenderInsets::new(1.25, 2.0, 3.0, -1.0).unwrap();
        assert_eq!(insets.to_string(), "Left=1.25 Top=2 W=+3 H=-1");
        assert_eq!(RenderInsets::default().to_string(), "NULL");
        let scaled = insets.scaled(2.0);
        assert_eq!((scaled.left(), scaled.top()), (3.0, 4.0));
        assert_eq!(insets.to_description().x_offset, -1.25);
    }
}
