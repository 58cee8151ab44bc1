//! Compositing engine for natively rendered widgets.
//!
//! Widgets are drawn by [`Renderer`]s into a [`ReusableCompositor`], a
//! premultiplied ARGB raster with an integral scale factor. A renderer may
//! write raw pixels ([`BasicRenderer`]), draw vector graphics through a
//! [`Canvas`](canvas::Canvas) ([`PainterExtension`]), or be assembled from
//! other renderers placed by [`RendererDescription`]s and
//! [insetters](insetter).
//!
//! The native drawing services themselves are supplied by the embedder
//! through [`backend::NativeBackends`].
#![allow(clippy::float_cmp)]

pub mod backend;
pub mod canvas;
mod compositor;
mod description;
mod image;
pub mod insetter;
pub mod layout;
pub mod pixel;
pub mod postproc;
mod renderer;
pub mod widgets;

pub use self::{
    canvas::{FocusRingPainter, PainterExtension, SkiaCanvas},
    compositor::{CompositorError, PixelSource, ReusableCompositor, MAX_SCALE_FACTOR},
    description::{
        AdjustError, BasicRendererDescription, DescriptionChange, MultiResolutionRendererDescription,
        RasterDescription, RasterRegion, RenderInsets, RenderInsetsError, RendererDescription,
    },
    image::RasterImage,
    renderer::{
        composite_basic, BasicRenderer, CompositeBasicRenderer, FallibleRenderer, NullBasicRenderer,
        OffsetRenderer, RasterOffsetRenderer, Renderer,
    },
};

/// The prelude.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        canvas::Canvas, insetter::Insetter, insetter::Insetter1, BasicRenderer, PainterExtension,
        PixelSource,
    };
}
