use aquacomp::{
    backend::{BackendKind, NativeBackends, NativeEntry, NativeError, RenderingContext, Settings},
    insetter::{insetters, Insetter},
    pixel,
    postproc::{Invert, InvertRenderer, ScaleAlpha, ScaledAlphaRenderer},
    widgets::{PopupRenderer, SliderRenderer},
    BasicRenderer, FocusRingPainter, RenderInsets, Renderer, RendererDescription, ReusableCompositor,
};
use aquageom::{ExpandableOutline, Rect, Shape};
use std::sync::Arc;

mod common;
use common::{pixels_renderer, solid};

fn render(r: &Renderer, rw: i32, rh: i32, sf: u32) -> Vec<u32> {
    let mut c = ReusableCompositor::with_size(rw, rh, sf).unwrap();
    c.compose(r);
    c.into_pixels()
}

#[test]
fn post_processed_layers() {
    common::try_init_logger_for_default_harness();

    let base: Arc<dyn BasicRenderer> = Arc::new(pixels_renderer(vec![0xff000000, 0x80808080, 0], 3));

    let inverted = Renderer::basic(
        InvertRenderer::new(Arc::clone(&base), Invert { alpha_multiplier: 1.0 }),
        RendererDescription::Trivial,
    );
    let out = render(&inverted, 3, 1, 1);
    assert_eq!(out[0], 0xffffffff);
    assert_eq!(out[2], 0);

    let faded = Renderer::basic(
        ScaledAlphaRenderer::new(base, ScaleAlpha { multiplier: 0.5 }),
        RendererDescription::Trivial,
    );
    let out = render(&faded, 3, 1, 1);
    assert_eq!(pixel::alpha(out[0]), 128);
    assert_eq!(out[2], 0);
}

#[test]
fn render_insets_extend_the_raster() {
    common::try_init_logger_for_default_harness();

    let insets = RenderInsets::new(1.0, 0.0, 2.0, 0.0).unwrap();
    assert_eq!(insets.to_string(), "Left=1 Top=0 W=+2 H=+0");

    let description = RendererDescription::Basic(insets.to_description());
    let r = Renderer::offset(
        Renderer::basic(pixels_renderer(vec![0xff000001, 0xff000002, 0xff000003, 0xff000004], 4), description),
        Rect::new(1.0, 0.0, 2.0, 1.0),
    );
    assert_eq!(render(&r, 5, 1, 1), vec![0xff000001, 0xff000002, 0xff000003, 0xff000004, 0]);
}

#[test]
fn focus_ring_surrounds_the_outline() {
    common::try_init_logger_for_default_harness();

    let ring = FocusRingPainter {
        outline: ExpandableOutline::from_shape(Shape::Rect(Rect::new(4.0, 4.0, 8.0, 8.0))),
        offset: 1.0,
        width: 2.0,
        color: rgb::RGBA::new(0.0, 0.0, 1.0, 1.0),
    };
    let out = render(&Renderer::painter(ring), 16, 16, 1);
    let at = |x: usize, y: usize| out[y * 16 + x];

    // The stroke covers 1..3 points outside the outline
    assert_eq!(at(2, 8), 0xff0000ff);
    assert_eq!(at(8, 13), 0xff0000ff);
    // Neither the interior nor the gap are touched
    assert_eq!(at(8, 8), 0);
    assert_eq!(at(3, 8), 0);
}

fn test_backends() -> NativeBackends {
    let entry: NativeEntry = Arc::new(
        |widget: &str, data: &mut [u32], rw: usize, rh: usize, _: f32, _: f32| -> Result<(), NativeError> {
            let color = match widget {
                "button" => 0xff202020,
                "arrows" => 0xffe0e0e0,
                _ => return Err(NativeError::Unsupported(widget.to_owned())),
            };
            for p in data[..rw * rh].iter_mut() {
                *p = color;
            }
            Ok(())
        },
    );
    NativeBackends {
        core_ui: Some(entry),
        ..NativeBackends::none()
    }
}

#[test]
fn popup_from_native_layers() {
    common::try_init_logger_for_default_harness();

    let cx = RenderingContext::new(Settings::default(), test_backends());
    let button = cx
        .native_renderer("button", BackendKind::CoreUi, RendererDescription::Trivial)
        .unwrap();
    let arrows = cx
        .native_renderer("arrows", BackendKind::CoreUi, RendererDescription::Trivial)
        .unwrap();
    let insetter: Arc<dyn Insetter> = Arc::new(insetters::right_aligned(3.0, 1.0, 1.0, 1.0).unwrap());

    let popup = Renderer::custom(PopupRenderer::new(Some(button), Some((arrows, insetter))));
    let out = render(&popup, 12, 8, 2);
    let at = |x: usize, y: usize| out[y * 12 + x];

    assert_eq!(at(0, 0), 0xff202020);
    // Arrows occupy points 2..5 horizontally and 1..3 vertically
    assert_eq!(at(4, 2), 0xffe0e0e0);
    assert_eq!(at(9, 5), 0xffe0e0e0);
    assert_eq!(at(10, 2), 0xff202020);
    assert_eq!(at(4, 1), 0xff202020);
}

#[test]
fn unsupported_native_widget_is_skipped() {
    common::try_init_logger_for_default_harness();

    let cx = RenderingContext::new(Settings::default(), test_backends());
    let track = cx
        .native_renderer("track", BackendKind::CoreUi, RendererDescription::Trivial)
        .unwrap();

    let slider = Renderer::custom(SliderRenderer::new(
        track,
        Arc::new(insetters::fixed(1.0, 0.0, 1.0, 0.0).unwrap()),
        None,
        solid(0xffffffff),
        Arc::new(insetters::left_aligned(1.0, 2.0, 0.0, 0.0).unwrap()),
    ));
    let out = render(&slider, 6, 3, 1);
    assert_eq!(out, vec![
        0, 0, 0xffffffff, 0, 0, 0, //
        0, 0, 0xffffffff, 0, 0, 0, //
        0, 0, 0xffffffff, 0, 0, 0,
    ]);
}
