//! Widget renderings assembled from simpler renderers.
//!
//! Each type here is a [`PixelSource`]; wrap it with [`Renderer::custom`] to
//! use it wherever a [`Renderer`] is expected.
use aquageom::Rect;
use cgmath::Point2;
use std::{fmt, sync::Arc};

use crate::{
    compositor::{PixelSource, ReusableCompositor},
    description::RasterRegion,
    insetter::Insetter,
    pixel,
    renderer::{BasicRenderer, Renderer},
};

/// The state a [`ColorWellRenderer`] draws its border for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorWellState {
    Normal,
    Pressed,
    Disabled,
}

/// A color well: the base button rendering with a two-line border, and the
/// interior erased so that the well color drawn behind it shows through.
#[derive(Debug, Clone)]
pub struct ColorWellRenderer {
    base: Renderer,
    state: ColorWellState,
}

impl ColorWellRenderer {
    pub fn new(base: Renderer, state: ColorWellState) -> Self {
        Self { base, state }
    }

    /// The outer and inner border colors.
    fn border_colors(&self) -> (u32, u32) {
        match self.state {
            ColorWellState::Disabled => (
                pixel::premultiply(127, 170, 170, 170),
                pixel::premultiply(255, 168, 168, 168),
            ),
            ColorWellState::Pressed => (
                pixel::premultiply(255, 175, 175, 175),
                pixel::premultiply(255, 86, 86, 86),
            ),
            ColorWellState::Normal => (
                pixel::premultiply(255, 175, 175, 175),
                pixel::premultiply(255, 138, 138, 138),
            ),
        }
    }
}

impl PixelSource for ColorWellRenderer {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        let sf = compositor.scale_factor() as i32;
        let (rw, rh) = (
            compositor.raster_width() as i32,
            compositor.raster_height() as i32,
        );
        // Two lines, each `sf` thick, with a 4-point gap between them
        let bt = 2 * sf + 4 * sf;

        self.base.compose_to(compositor);

        let (outer, inner) = self.border_colors();
        compositor.render_from(&ColorWellBorder {
            outer,
            inner,
            scale_factor: sf,
        });

        compositor.erase(bt, bt, rw - 2 * bt, rh - 2 * bt);
    }
}

/// Writes the border lines of a color well directly into the raster.
struct ColorWellBorder {
    outer: u32,
    inner: u32,
    scale_factor: i32,
}

impl ColorWellBorder {
    #[allow(clippy::too_many_arguments)]
    fn draw_rect(&self, data: &mut [u32], rw: i32, rh: i32, pixel: u32, dx: i32, dy: i32, dw: i32, dh: i32) {
        for i in 0..self.scale_factor {
            draw_rect_outline(data, rw, rh, pixel, dx + i, dy + i, dw - 2 * i, dh - 2 * i);
        }
    }
}

/// Set the one-pixel outline of a rectangle. Pixels outside the raster are
/// ignored.
#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(data: &mut [u32], rw: i32, rh: i32, pixel: u32, dx: i32, dy: i32, dw: i32, dh: i32) {
    if dw <= 0 || dh <= 0 {
        return;
    }
    let bounds = Rect::from_size(rw, rh);
    let mut set = |x: i32, y: i32| {
        if bounds.contains_point(Point2::new(x, y)) {
            if let Some(p) = data.get_mut((y * rw + x) as usize) {
                *p = pixel;
            }
        }
    };
    for x in dx..dx + dw {
        set(x, dy);
        set(x, dy + dh - 1);
    }
    for y in dy + 1..dy + dh - 1 {
        set(dx, y);
        set(dx + dw - 1, y);
    }
}

impl BasicRenderer for ColorWellBorder {
    fn render(&self, data: &mut [u32], raster_width: usize, raster_height: usize, _: f32, _: f32) {
        let (rw, rh) = (raster_width as i32, raster_height as i32);
        let sf = self.scale_factor;
        self.draw_rect(data, rw, rh, self.outer, 0, 0, rw, rh);
        self.draw_rect(data, rw, rh, self.inner, 5 * sf, 5 * sf, rw - 10 * sf, rh - 10 * sf);
    }
}

/// A pop-up button whose arrows are drawn separately from the button body.
#[derive(Clone)]
pub struct PopupRenderer {
    button: Option<Renderer>,
    arrows: Option<(Renderer, Arc<dyn Insetter>)>,
}

impl fmt::Debug for PopupRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupRenderer")
            .field("button", &self.button)
            .field("arrows", &self.arrows.as_ref().map(|(r, _)| r))
            .finish()
    }
}

impl PopupRenderer {
    pub fn new(button: Option<Renderer>, arrows: Option<(Renderer, Arc<dyn Insetter>)>) -> Self {
        Self { button, arrows }
    }
}

impl PixelSource for PopupRenderer {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        let (w, h) = (compositor.width(), compositor.height());
        if let Some(button) = &self.button {
            button.compose_to(compositor);
        }
        if let Some((arrows, insetter)) = &self.arrows {
            Renderer::offset(arrows.clone(), insetter.apply(w, h)).compose_to(compositor);
        }
    }
}

/// The width of the raster a middle segment is rendered into to pick up
/// its divider.
const DIVIDER_SOURCE_WIDTH: i32 = 100;

/// A segmented-control segment that is extended with dividers borrowed from
/// the edges of a middle segment.
///
/// The segment is rendered in the raster minus one column for each divider.
/// A left divider is the rightmost column of `middle`; a right divider is
/// its leftmost column and is only added above 1x, where the segment
/// rendering lacks it.
#[derive(Debug, Clone)]
pub struct SegmentDividerRenderer {
    segment: Renderer,
    middle: Renderer,
    left_divider: bool,
    right_divider: bool,
}

impl SegmentDividerRenderer {
    pub fn new(segment: Renderer, middle: Renderer, left_divider: bool, right_divider: bool) -> Self {
        Self {
            segment,
            middle,
            left_divider,
            right_divider,
        }
    }
}

impl PixelSource for SegmentDividerRenderer {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        let sf = compositor.scale_factor();
        let left = self.left_divider as i32;
        let right = (self.right_divider && sf > 1) as i32;
        if left == 0 && right == 0 {
            self.segment.compose_to(compositor);
            return;
        }

        let (w, h) = (
            compositor.raster_width() as i32,
            compositor.raster_height() as i32,
        );
        let region = RasterRegion {
            x: left,
            y: 0,
            width: w - left - right,
            height: h,
        };
        Renderer::raster_offset(self.segment.clone(), region).compose_to(compositor);

        let mut source = match ReusableCompositor::with_size(DIVIDER_SOURCE_WIDTH, h, sf) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("SegmentDividerRenderer: {}", e);
                return;
            }
        };
        self.middle.compose_to(&mut source);

        if left > 0 {
            compositor.compose_from_region(&source, DIVIDER_SOURCE_WIDTH - 1, 0, 0, 0, left, h);
        }
        if right > 0 {
            compositor.compose_from_region(&source, 0, 0, w - right, 0, right, h);
        }
    }
}

/// A linear slider: the track and the thumb are each placed by an insetter,
/// with optional tick marks drawn over the whole raster between them.
#[derive(Clone)]
pub struct SliderRenderer {
    track: Renderer,
    track_insets: Arc<dyn Insetter>,
    tick_marks: Option<Renderer>,
    thumb: Renderer,
    thumb_insets: Arc<dyn Insetter>,
}

impl fmt::Debug for SliderRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliderRenderer")
            .field("track", &self.track)
            .field("track_insets", &self.track_insets)
            .field("tick_marks", &self.tick_marks)
            .field("thumb", &self.thumb)
            .field("thumb_insets", &self.thumb_insets)
            .finish()
    }
}

impl SliderRenderer {
    pub fn new(
        track: Renderer,
        track_insets: Arc<dyn Insetter>,
        tick_marks: Option<Renderer>,
        thumb: Renderer,
        thumb_insets: Arc<dyn Insetter>,
    ) -> Self {
        Self {
            track,
            track_insets,
            tick_marks,
            thumb,
            thumb_insets,
        }
    }
}

impl PixelSource for SliderRenderer {
    fn compose_to(&self, compositor: &mut ReusableCompositor) {
        let (w, h) = (compositor.width(), compositor.height());

        let track_bounds = self.track_insets.apply(w, h);
        Renderer::offset(self.track.clone(), track_bounds).compose_to(compositor);
        if let Some(tick_marks) = &self.tick_marks {
            tick_marks.compose_to(compositor);
        }

        let thumb_bounds = self.thumb_insets.apply(w, h);
        Renderer::offset(self.thumb.clone(), thumb_bounds).compose_to(compositor);
    }
}
