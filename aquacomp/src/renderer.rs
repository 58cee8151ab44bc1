//! Composable units of rendering.
use aquageom::Rect;
use log::{debug, warn};
use std::{fmt, sync::Arc};

use crate::{
    canvas::PainterExtension,
    compositor::{PixelSource, ReusableCompositor, MAX_SCALE_FACTOR},
    description::{round_to_pixel, RasterRegion, RendererDescription},
};

/// Writes pixels into a raster.
///
/// `data` is a `raster_width` × `raster_height` premultiplied ARGB raster in
/// row-major order, and `width` × `height` is its size in points. The
/// implementation may read the existing contents.
pub trait BasicRenderer: Send + Sync {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32);
}

impl<F: Fn(&mut [u32], usize, usize, f32, f32) + Send + Sync> BasicRenderer for F {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32) {
        self(data, raster_width, raster_height, width, height)
    }
}

/// Renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBasicRenderer;

impl BasicRenderer for NullBasicRenderer {
    fn render(&self, _: &mut [u32], _: usize, _: usize, _: f32, _: f32) {}
}

/// Renders several renderers on top of each other, in order.
#[derive(Clone)]
pub struct CompositeBasicRenderer {
    renderers: Vec<Arc<dyn BasicRenderer>>,
}

impl fmt::Debug for CompositeBasicRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeBasicRenderer")
            .field("len", &self.renderers.len())
            .finish()
    }
}

impl BasicRenderer for CompositeBasicRenderer {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32) {
        // The scale factor is not passed to basic renderers, so recover it
        // from the two sizes
        let scale_factor = ((raster_width as f32 / width).ceil() as u32).max(1).min(MAX_SCALE_FACTOR);
        let n = raster_width * raster_height;
        let mut compositor =
            match ReusableCompositor::from_pixels(data[..n].to_vec(), raster_width, raster_height, scale_factor) {
                Ok(c) => c,
                Err(e) => {
                    warn!("CompositeBasicRenderer: {}", e);
                    return;
                }
            };
        for r in self.renderers.iter() {
            compositor.compose_renderer(&**r);
        }
        data[..n].copy_from_slice(&compositor.into_pixels());
    }
}

/// Combine basic renderers, dropping absent ones.
pub fn composite_basic(renderers: impl IntoIterator<Item = Option<Arc<dyn BasicRenderer>>>) -> Arc<dyn BasicRenderer> {
    let mut renderers: Vec<_> = renderers.into_iter().flatten().collect();
    match renderers.len() {
        0 => Arc::new(NullBasicRenderer),
        1 => renderers.remove(0),
        _ => Arc::new(CompositeBasicRenderer { renderers }),
    }
}

/// A basic renderer whose underlying call can fail, e.g., a call into a
/// native drawing service. A failure is logged and leaves whatever the call
/// managed to write.
pub struct FallibleRenderer<F> {
    label: String,
    call: F,
}

impl<F> FallibleRenderer<F> {
    pub fn new(label: impl Into<String>, call: F) -> Self {
        Self {
            label: label.into(),
            call,
        }
    }
}

impl<F> fmt::Debug for FallibleRenderer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallibleRenderer").field("label", &self.label).finish()
    }
}

impl<F, E> BasicRenderer for FallibleRenderer<F>
where
    F: Fn(&mut [u32], usize, usize, f32, f32) -> Result<(), E> + Send + Sync,
    E: fmt::Display,
{
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, width: f32, height: f32) {
        if let Err(e) = (self.call)(data, raster_width, raster_height, width, height) {
            warn!("{}: rendering failed, skipping the layer: {}", self.label, e);
        }
    }
}

/// Places a renderer's output in a rectangle specified in points.
#[derive(Debug, Clone)]
pub struct OffsetRenderer {
    pub source: Renderer,
    pub bounds: Rect<f32>,
}

/// Places a renderer's output in a rectangle specified in raster pixels.
#[derive(Debug, Clone)]
pub struct RasterOffsetRenderer {
    pub source: Renderer,
    pub region: RasterRegion,
}

/// A composable rendering.
///
/// A `Renderer` holds no mutable state. Composing it onto a compositor draws
/// it over the compositor's whole raster, at the compositor's scale factor.
#[derive(Clone)]
pub enum Renderer {
    /// Renders nothing.
    Null,
    /// A basic renderer whose raster is positioned by a description.
    Basic {
        renderer: Arc<dyn BasicRenderer>,
        description: RendererDescription,
    },
    Painter(Arc<dyn PainterExtension>),
    /// Renderers composited in order; later ones are on top.
    Composite(Vec<Renderer>),
    Offset(Box<OffsetRenderer>),
    RasterOffset(Box<RasterOffsetRenderer>),
    Custom(Arc<dyn PixelSource + Send + Sync>),
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::Null
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Null => write!(f, "Null"),
            Renderer::Basic { description, .. } => f.debug_struct("Basic").field("description", description).finish(),
            Renderer::Painter(_) => write!(f, "Painter"),
            Renderer::Composite(children) => f.debug_tuple("Composite").field(children).finish(),
            Renderer::Offset(x) => f.debug_tuple("Offset").field(x).finish(),
            Renderer::RasterOffset(x) => f.debug_tuple("RasterOffset").field(x).finish(),
            Renderer::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Renderer {
    pub fn basic(renderer: impl BasicRenderer + 'static, description: RendererDescription) -> Self {
        Renderer::Basic {
            renderer: Arc::new(renderer),
            description,
        }
    }

    pub fn painter(painter: impl PainterExtension + 'static) -> Self {
        Renderer::Painter(Arc::new(painter))
    }

    pub fn custom(source: impl PixelSource + Send + Sync + 'static) -> Self {
        Renderer::Custom(Arc::new(source))
    }

    /// Combine renderers, dropping absent ones. Collapses to `Null` or the
    /// sole remaining renderer when possible.
    pub fn composite(renderers: impl IntoIterator<Item = Option<Renderer>>) -> Self {
        let mut renderers: Vec<_> = renderers.into_iter().flatten().collect();
        match renderers.len() {
            0 => Renderer::Null,
            1 => renderers.remove(0),
            _ => Renderer::Composite(renderers),
        }
    }

    /// Place `source` in `bounds` (points).
    pub fn offset(source: Renderer, bounds: Rect<f32>) -> Self {
        Renderer::Offset(Box::new(OffsetRenderer { source, bounds }))
    }

    /// Place `source` in `region` (raster pixels).
    pub fn raster_offset(source: Renderer, region: RasterRegion) -> Self {
        Renderer::RasterOffset(Box::new(RasterOffsetRenderer { source, region }))
    }

    pub fn is_null(&self) -> bool {
        match self {
            Renderer::Null => true,
            _ => false,
        }
    }
}

/// Convert a point rectangle to raster pixels without a description.
fn region_for_points(bounds: &Rect<f32>, scale_factor: u32) -> RasterRegion {
    let sf = scale_factor as f32;
    RasterRegion {
        x: round_to_pixel(sf * bounds.x()),
        y: round_to_pixel(sf * bounds.y()),
        width: (sf * bounds.width()).ceil() as i32,
        height: (sf * bounds.height()).ceil() as i32,
    }
}

/// Compose `source` so that it fills `region`. `bounds` is the same
/// rectangle in points, which descriptions are applied to.
fn compose_in_region(source: &Renderer, compositor: &mut ReusableCompositor, bounds: &Rect<f32>, region: RasterRegion) {
    let sf = compositor.scale_factor();
    let RasterRegion { x, y, width, height } = region;
    match source {
        Renderer::Basic { renderer, description } => {
            let region = if description.is_trivial() {
                region
            } else {
                description.raster_bounds(bounds, sf).to_raster_region(sf)
            };
            compositor.compose_renderer_in(&**renderer, region.x, region.y, region.width, region.height);
        }
        Renderer::Painter(px) => compositor.compose_painter_in(&**px, x, y, width, height),
        Renderer::Null => {}
        _ => {
            if width <= 0 || height <= 0 {
                debug!("compose_in_region: skipping {:?} for an empty region", source);
                return;
            }
            let mut temp = ReusableCompositor::new();
            if let Err(e) = temp.reset(width, height, sf) {
                warn!("compose_in_region: {}", e);
                return;
            }
            source.compose_to(&mut temp);
            compositor.compose_from(&temp, x, y, width, height);
        }
    }
}

impl PixelSource for Renderer {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        match self {
            Renderer::Null => {}
            Renderer::Basic { renderer, description } => {
                if description.is_trivial() {
                    compositor.compose_renderer(&**renderer);
                } else {
                    let sf = compositor.scale_factor();
                    let bounds = Rect::from_size(compositor.width(), compositor.height());
                    let region = description.raster_bounds(&bounds, sf).to_raster_region(sf);
                    compositor.compose_renderer_in(&**renderer, region.x, region.y, region.width, region.height);
                }
            }
            Renderer::Painter(px) => compositor.compose_painter(&**px, 0.0, 0.0),
            Renderer::Composite(children) => {
                for child in children.iter() {
                    child.compose_to(compositor);
                }
            }
            Renderer::Offset(o) => {
                let region = region_for_points(&o.bounds, compositor.scale_factor());
                compose_in_region(&o.source, compositor, &o.bounds, region);
            }
            Renderer::RasterOffset(o) => {
                let sf = compositor.scale_factor() as f32;
                let r = o.region;
                let bounds = Rect::new(
                    r.x as f32 / sf,
                    r.y as f32 / sf,
                    r.width as f32 / sf,
                    r.height as f32 / sf,
                );
                compose_in_region(&o.source, compositor, &bounds, r);
            }
            Renderer::Custom(source) => source.compose_to(compositor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::BasicRendererDescription;

    fn solid(color: u32) -> impl Fn(&mut [u32], usize, usize, f32, f32) + Send + Sync + 'static {
        move |data: &mut [u32], rw: usize, rh: usize, _: f32, _: f32| {
            for p in data[..rw * rh].iter_mut() {
                *p = color;
            }
        }
    }

    fn render(r: &Renderer, rw: i32, rh: i32, sf: u32) -> Vec<u32> {
        let mut c = ReusableCompositor::with_size(rw, rh, sf).unwrap();
        c.compose(r);
        c.into_pixels()
    }

    #[test]
    fn composite_collapses() {
        assert!(Renderer::composite(vec![None, None]).is_null());
        match Renderer::composite(vec![None, Some(Renderer::painter(|_: &mut dyn crate::canvas::Canvas, _: f32, _: f32| {}))]) {
            Renderer::Painter(_) => {}
            r => panic!("{:?}", r),
        }
        match Renderer::composite(vec![Some(Renderer::Null), Some(Renderer::Null)]) {
            Renderer::Composite(v) => assert_eq!(v.len(), 2),
            r => panic!("{:?}", r),
        }
    }

    #[test]
    fn composite_basic_layers_in_order() {
        let top = |data: &mut [u32], _: usize, _: usize, _: f32, _: f32| data[0] = 0xffff0000;
        let r = composite_basic(vec![
            Some(Arc::new(solid(0xff0000ff)) as Arc<dyn BasicRenderer>),
            None,
            Some(Arc::new(top) as Arc<dyn BasicRenderer>),
        ]);
        let mut data = vec![0; 4];
        r.render(&mut data, 2, 2, 2.0, 2.0);
        assert_eq!(data, vec![0xffff0000, 0xff0000ff, 0xff0000ff, 0xff0000ff]);
    }

    #[test]
    fn fallible_renderer_skips_on_error() {
        let r = FallibleRenderer::new("test", |_: &mut [u32], _: usize, _: usize, _: f32, _: f32| -> Result<(), String> {
            Err("boom".to_owned())
        });
        let out = render(&Renderer::basic(r, RendererDescription::Trivial), 2, 2, 1);
        assert_eq!(out, vec![0; 4]);
    }

    #[test]
    fn basic_with_description_draws_outside_target() {
        // The raster extends one point beyond each side of the target
        let r = Renderer::offset(
            Renderer::basic(solid(0xffffffff), RendererDescription::basic(-1.0, -1.0, 2.0, 2.0)),
            Rect::new(1.0, 1.0, 1.0, 1.0),
        );
        let out = render(&r, 4, 4, 1);
        let white = 0xffffffff;
        #[rustfmt::skip]
        assert_eq!(out, vec![
            white, white, white, 0,
            white, white, white, 0,
            white, white, white, 0,
            0, 0, 0, 0,
        ]);
    }

    #[test]
    fn offset_rounds_to_raster() {
        let r = Renderer::offset(
            Renderer::basic(solid(0xff00ff00), RendererDescription::Trivial),
            Rect::new(0.5, 0.0, 0.5, 0.5),
        );
        let out = render(&r, 2, 2, 2);
        assert_eq!(out, vec![0, 0xff00ff00, 0, 0]);
    }

    #[test]
    fn offset_of_composite_uses_temporary_raster() {
        let inner = Renderer::composite(vec![
            Some(Renderer::basic(solid(0xff000001), RendererDescription::Trivial)),
            Some(Renderer::basic(
                |data: &mut [u32], _: usize, _: usize, _: f32, _: f32| data[0] = 0xff000002,
                RendererDescription::Trivial,
            )),
        ]);
        let r = Renderer::raster_offset(
            inner,
            RasterRegion {
                x: 1,
                y: 1,
                width: 2,
                height: 1,
            },
        );
        let out = render(&r, 3, 2, 1);
        assert_eq!(out, vec![0, 0, 0, 0, 0xff000002, 0xff000001]);
    }

    #[test]
    fn multi_resolution_description_follows_scale() {
        let d = RendererDescription::multi_resolution(
            RendererDescription::Trivial,
            RendererDescription::Basic(BasicRendererDescription::new(0.5, 0.0, -0.5, 0.0)),
        );
        let r = Renderer::basic(solid(0xffffffff), d);
        assert_eq!(render(&r, 2, 1, 1), vec![0xffffffff, 0xffffffff]);
        // At 2x the raster starts one pixel in
        assert_eq!(render(&r, 2, 1, 2), vec![0, 0xffffffff]);
    }

    #[test]
    fn custom_source() {
        let mut src = ReusableCompositor::with_size(1, 1, 1).unwrap();
        src.render_from(&solid(0xff123456));
        let r = Renderer::custom(src);
        assert_eq!(render(&r, 2, 1, 1), vec![0xff123456, 0]);
    }
}
