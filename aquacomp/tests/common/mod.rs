#![allow(dead_code)]
use aquacomp::{BasicRenderer, RendererDescription, Renderer};

pub fn try_init_logger_for_default_harness() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A basic renderer that copies `pixels` into the top-left corner of the
/// raster.
pub fn pixels_renderer(pixels: Vec<u32>, width: usize) -> impl BasicRenderer + Clone {
    let pixels = std::sync::Arc::new(pixels);
    move |data: &mut [u32], rw: usize, rh: usize, _: f32, _: f32| {
        for (i, &p) in pixels.iter().enumerate() {
            let (x, y) = (i % width, i / width);
            if x < rw && y < rh {
                data[y * rw + x] = p;
            }
        }
    }
}

pub fn solid(color: u32) -> Renderer {
    Renderer::basic(
        move |data: &mut [u32], rw: usize, rh: usize, _: f32, _: f32| {
            for p in data[..rw * rh].iter_mut() {
                *p = color;
            }
        },
        RendererDescription::Trivial,
    )
}

/// Replace every fully transparent pixel with `0`, which is how the
/// compositor treats them anyway.
pub fn normalize(p: u32) -> u32 {
    if p >> 24 == 0 {
        0
    } else {
        p
    }
}

/// Make `p` a valid premultiplied pixel.
pub fn premultiplied(p: u32) -> u32 {
    let a = p >> 24;
    let clamp = |c: u32| c.min(a);
    (a << 24) | (clamp((p >> 16) & 0xff) << 16) | (clamp((p >> 8) & 0xff) << 8) | clamp(p & 0xff)
}
