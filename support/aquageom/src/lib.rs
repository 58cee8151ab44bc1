//! Geometry for the widget compositor.
//!
//! Provides point-space rectangles, 2D affine helpers for `cgmath`, and the
//! expandable outlines used to build focus rings and masks.
pub extern crate cgmath;

mod outline;
mod path;
mod rect;
mod roundrect;
mod twodim;

pub use self::outline::*;
pub use self::path::*;
pub use self::rect::*;
pub use self::roundrect::*;
pub use self::twodim::*;

/// The prelude.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::Matrix3TwoDimExt;
}
