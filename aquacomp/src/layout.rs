//! Fixed and minimum visual dimensions of a widget.
use quick_error::quick_error;

quick_error! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LayoutError {
        Negative(what: &'static str) {
            display("invalid negative {}", what)
        }
        Inconsistent(what: &'static str) {
            display("incompatible fixed and minimum {}", what)
        }
    }
}

/// Layout constraints reported for a widget. A zero value means "no
/// constraint".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutInfo {
    fixed_width: f32,
    fixed_height: f32,
    minimum_width: f32,
    minimum_height: f32,
}

impl LayoutInfo {
    /// Construct a `LayoutInfo`.
    ///
    /// A minimum that is not given defaults to the fixed value of the same
    /// axis.
    pub fn new(
        fixed_width: f32,
        fixed_height: f32,
        minimum_width: f32,
        minimum_height: f32,
    ) -> Result<Self, LayoutError> {
        check_non_negative(fixed_width, "fixed width")?;
        check_non_negative(fixed_height, "fixed height")?;
        check_non_negative(minimum_width, "minimum width")?;
        check_non_negative(minimum_height, "minimum height")?;
        check_consistent(fixed_width, minimum_width, "width")?;
        check_consistent(fixed_height, minimum_height, "height")?;

        Ok(Self {
            fixed_width,
            fixed_height,
            minimum_width: if minimum_width > 0.0 {
                minimum_width
            } else {
                fixed_width
            },
            minimum_height: if minimum_height > 0.0 {
                minimum_height
            } else {
                fixed_height
            },
        })
    }

    /// No fixed or minimum dimensions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fixed(width: f32, height: f32) -> Result<Self, LayoutError> {
        Self::new(width, height, 0.0, 0.0)
    }

    pub fn fixed_width(width: f32) -> Result<Self, LayoutError> {
        Self::new(width, 0.0, 0.0, 0.0)
    }

    pub fn fixed_height(height: f32) -> Result<Self, LayoutError> {
        Self::new(0.0, height, 0.0, 0.0)
    }

    pub fn minimum(width: f32, height: f32) -> Result<Self, LayoutError> {
        Self::new(0.0, 0.0, width, height)
    }

    /// Each axis is either fixed or a minimum depending on the flag.
    pub fn with_axes(
        is_width_fixed: bool,
        width: f32,
        is_height_fixed: bool,
        height: f32,
    ) -> Result<Self, LayoutError> {
        let (fw, mw) = if is_width_fixed { (width, 0.0) } else { (0.0, width) };
        let (fh, mh) = if is_height_fixed { (height, 0.0) } else { (0.0, height) };
        Self::new(fw, fh, mw, mh)
    }

    pub fn fixed_visual_width(&self) -> f32 {
        self.fixed_width
    }

    pub fn fixed_visual_height(&self) -> f32 {
        self.fixed_height
    }

    pub fn minimum_visual_width(&self) -> f32 {
        self.minimum_width
    }

    pub fn minimum_visual_height(&self) -> f32 {
        self.minimum_height
    }
}

fn check_non_negative(v: f32, what: &'static str) -> Result<(), LayoutError> {
    if v < 0.0 {
        Err(LayoutError::Negative(what))
    } else {
        Ok(())
    }
}

fn check_consistent(fixed: f32, minimum: f32, what: &'static str) -> Result<(), LayoutError> {
    if fixed > 0.0 && minimum > 0.0 && fixed != minimum {
        Err(LayoutError::Inconsistent(what))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_defaults_to_fixed() {
        let info = LayoutInfo::fixed(20.0, 0.0).unwrap();
        assert_eq!(info.minimum_visual_width(), 20.0);
        assert_eq!(info.minimum_visual_height(), 0.0);
    }

    #[test]
    fn rejects_negative() {
        assert_eq!(
            LayoutInfo::minimum(-1.0, 0.0),
            Err(LayoutError::Negative("minimum width"))
        );
        assert_eq!(
            LayoutInfo::fixed_height(-0.5),
            Err(LayoutError::Negative("fixed height"))
        );
    }

    #[test]
    fn rejects_inconsistent() {
        assert_eq!(
            LayoutInfo::new(10.0, 0.0, 12.0, 0.0),
            Err(LayoutError::Inconsistent("width"))
        );
        assert!(LayoutInfo::new(10.0, 5.0, 10.0, 5.0).is_ok());
    }

    #[test]
    fn with_axes() {
        let info = LayoutInfo::with_axes(true, 30.0, false, 18.0).unwrap();
        assert_eq!(info.fixed_visual_width(), 30.0);
        assert_eq!(info.fixed_visual_height(), 0.0);
        assert_eq!(info.minimum_visual_width(), 30.0);
        assert_eq!(info.minimum_visual_height(), 18.0);
    }
}
