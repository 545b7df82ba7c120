//! External collaborator seams (spec §6/§9's component G): the scaler and
//! styled-text renderer are genuinely external, stateful libraries
//! (`libswscale`, `libass` in the original), modeled as traits; the
//! RGB→YUV conversion is deterministic matrix math with no plausible
//! alternate implementation, so it is a plain function, the same way the
//! teacher implements its own color-space conversion in-crate
//! (`video/ciede/delta_e`) rather than hiding it behind a trait.

use crate::frame::ChromaSampling;

/// A Lanczos image scaler context, owned by the filter instance and rebuilt
/// whenever the target (width, height) changes (spec §4.C/§5).
pub trait Scaler {
    type Context;

    /// Builds a scaler context for one (src, dst) size pair.
    fn create(
        &self,
        src_w: u32,
        src_h: u32,
        src_chroma: ChromaSampling,
        dst_w: u32,
        dst_h: u32,
        dst_chroma: ChromaSampling,
    ) -> Self::Context;

    /// Rescales `src_planes` (Y, U, V, A) into `dst_planes`, using the
    /// context built by `create`.
    fn scale(
        &self,
        ctx: &mut Self::Context,
        src_planes: &[&[u8]],
        src_strides: &[usize],
        dst_planes: &mut [&mut [u8]],
        dst_strides: &[usize],
    );
}

/// A glyph fragment returned by the styled-text renderer for one render call
/// (spec §6).
#[derive(Clone, Debug)]
pub struct GlyphFragment {
    pub w: usize,
    pub h: usize,
    pub stride: usize,
    pub dst_x: i32,
    pub dst_y: i32,
    /// 8-bit alpha bitmap, `h` rows of `stride` bytes.
    pub bitmap: Vec<u8>,
    /// Packed `0xRRGGBBAA`.
    pub color_rgba: u32,
}

impl GlyphFragment {
    pub fn r(&self) -> u8 {
        (self.color_rgba >> 24) as u8
    }

    pub fn g(&self) -> u8 {
        (self.color_rgba >> 16) as u8
    }

    pub fn b(&self) -> u8 {
        (self.color_rgba >> 8) as u8
    }

    pub fn frame_alpha(&self) -> u8 {
        self.color_rgba as u8
    }
}

/// A styled-text rendering session (spec §6's "styled-text renderer").
/// Wraps a genuinely external library the way `libass` is wrapped in the
/// original: font/track lifecycle, script ingestion, and per-frame render.
pub trait TextRenderer {
    type Track;

    fn add_font(&mut self, name: &str, bytes: &[u8]);
    fn set_font_scale(&mut self, scale: f64);
    fn set_hinting_none(&mut self);
    fn set_line_spacing(&mut self, spacing: f64);
    fn set_frame_size(&mut self, w: u32, h: u32);
    fn set_storage_size(&mut self, w: u32, h: u32);
    fn set_check_readorder(&mut self, enabled: bool);

    fn track_new(&mut self) -> Self::Track;
    fn process_codec_private(&mut self, track: &mut Self::Track, bytes: &[u8]);
    fn process_chunk(&mut self, track: &mut Self::Track, bytes: &[u8], start_ms: i64, duration_ms: i64);

    /// Renders fragments active at `time_ms`, and whether the result differs
    /// from the previous call (drives the text track's cache, spec §4.E).
    fn render_frame(&mut self, track: &mut Self::Track, time_ms: i64) -> (Vec<GlyphFragment>, bool);
}

/// Converts a packed `0xRRGGBB` color to packed `(Y << 16) | (V << 8) | U`
/// using BT.709 full-range coefficients (spec §6). The original's
/// `hb_rgb2yuv_bt709` lives outside the retrieved source tree; these are the
/// standard BT.709 matrix coefficients, not a guess at its internals.
pub fn rgb_to_yuv_bt709(rgb: u32) -> u32 {
    let r = ((rgb >> 16) & 0xff) as f64;
    let g = ((rgb >> 8) & 0xff) as f64;
    let b = (rgb & 0xff) as f64;

    let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    let u = -0.1146 * r - 0.3854 * g + 0.5 * b + 128.0;
    let v = 0.5 * r - 0.4542 * g - 0.0458 * b + 128.0;

    let y = y.round().clamp(0.0, 255.0) as u32;
    let u = u.round().clamp(0.0, 255.0) as u32;
    let v = v.round().clamp(0.0, 255.0) as u32;

    (y << 16) | (v << 8) | u
}
