//! Component E: the text/SSA subtitle track.
//!
//! Grounded on `rendersub.c`'s `textsub_work`/`ssa_work`/`render_ssa_subs`/
//! `cc608sub_post_init`/`textsub_post_init`, including the exact font-size
//! constants and the open-ended `current_sub` state machine.

use crate::compose::compose;
use crate::external::{GlyphFragment, TextRenderer};
use crate::frame::{ChromaSampling, CropRect, OverlayBuffer};

/// Synthetic duration applied to a still-open event when `EOF` arrives with
/// no closing event (spec §4.E/§9 — "arbitrary, may not match downstream
/// muxer expectations", preserved as a named constant rather than a bare
/// literal).
pub const EOF_TAIL_DURATION_MS: i64 = 10_000;

/// Font size for general (non-CC) synthetic script headers: `0.066 * H`
/// (spec §4.F, `textsub_post_init`).
pub const SANS_FONT_SIZE_FACTOR: f64 = 0.066;

/// Font size for CC608's monospace synthetic header: `0.08 * 0.8 * H`
/// (spec §4.F, `cc608sub_post_init`'s `safe_height = 0.8 * H`).
pub const MONO_FONT_SIZE_FACTOR: f64 = 0.08 * 0.8;

/// Default style family for general synthetic headers, grounded directly on
/// `ssa_post_init`'s `const char *family = "Arial";` (SSA v4.00 requires
/// "Arial" as the default font).
pub const SANS_FONT_NAME: &str = "Arial";

/// Default style family for CC608's synthetic header. The original's
/// `HB_FONT_MONO` string literal lives outside the retrieved source tree;
/// this is a standard monospace family name, not a guess at its value.
pub const MONO_FONT_NAME: &str = "Consolas";

/// Synthesizes a minimal ASS script header for formats with no codec-
/// provided one of their own (spec §4.F). `hb_set_ssa_extradata`'s own body
/// lives outside the retrieved source tree, so this produces an equivalent
/// minimal `[Script Info]`/`[V4+ Styles]` header carrying the same font
/// name, font size and play-resolution fields rather than replicating its
/// exact byte layout.
pub fn synthesize_ass_header(font_name: &str, font_size: f64, play_res_x: u32, play_res_y: u32) -> Vec<u8> {
    format!(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {play_res_x}\n\
         PlayResY: {play_res_y}\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,{font_name},{size},&H00FFFFFF,&H00FFFFFF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,0\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        size = font_size.round() as i64,
    )
    .into_bytes()
}

struct PendingEvent {
    /// The start of the next slice to submit; advances forward on each tick.
    start_ms: i64,
    /// The end of the already-submitted portion.
    submitted_until_ms: i64,
    payload: Vec<u8>,
}

/// One ingested text-track event, already converted to milliseconds.
pub struct TextEvent {
    pub start_ms: i64,
    pub stop_ms: Option<i64>,
    pub eos: bool,
    pub payload: Vec<u8>,
}

/// Track state: deferred script init, the open-ended `current_sub` slot, and
/// the cached last-rendered overlay (spec §3's "Track state (text)").
pub struct TextTrack {
    pub script_initialized: bool,
    current_sub: Option<PendingEvent>,
    last_render: Option<OverlayBuffer>,
}

impl Default for TextTrack {
    fn default() -> Self {
        TextTrack {
            script_initialized: false,
            current_sub: None,
            last_render: None,
        }
    }
}

impl TextTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the codec's script header into the renderer on the first
    /// `work()` call for this track, never before (spec §4.E). Mirrors
    /// `ssa_work`/`textsub_work`'s `if (!pv->script_initialized) { ...;
    /// script_initialized = 1; }` gate: the header can't be pushed any
    /// earlier because real codec extradata isn't populated until the
    /// upstream decoder has initialized, which happens after track
    /// construction.
    pub fn ensure_script_initialized<R: TextRenderer>(&mut self, renderer: &mut R, track: &mut R::Track, extradata: &[u8]) {
        if !self.script_initialized {
            renderer.process_codec_private(track, extradata);
            self.script_initialized = true;
        }
    }

    /// Ingests one event, submitting chunks to the renderer as their
    /// duration becomes known (spec §4.E "Event ingestion").
    pub fn ingest<R: TextRenderer>(&mut self, renderer: &mut R, track: &mut R::Track, event: TextEvent) {
        if let Some(pending) = self.current_sub.take() {
            let duration = event.start_ms - pending.start_ms;
            renderer.process_chunk(track, &pending.payload, pending.start_ms, duration);
        }

        if event.eos {
            return;
        }

        match event.stop_ms {
            None => {
                self.current_sub = Some(PendingEvent {
                    start_ms: event.start_ms,
                    submitted_until_ms: event.start_ms,
                    payload: event.payload,
                });
            }
            Some(stop_ms) => {
                renderer.process_chunk(track, &event.payload, event.start_ms, stop_ms - event.start_ms);
            }
        }
    }

    /// Flushes any still-open event on `EOF`, synthesizing a 10-second tail.
    pub fn ingest_eof<R: TextRenderer>(&mut self, renderer: &mut R, track: &mut R::Track) {
        if let Some(pending) = self.current_sub.take() {
            let duration = EOF_TAIL_DURATION_MS;
            renderer.process_chunk(track, &pending.payload, pending.start_ms, duration);
        }
    }

    /// Per-frame tick: extends a still-open event forward by a one-
    /// millisecond slice so it stays visible without committing a final
    /// duration (spec §4.E "Per-frame tick").
    pub fn tick<R: TextRenderer>(&mut self, renderer: &mut R, track: &mut R::Track, frame_start_ms: i64) {
        if let Some(pending) = &mut self.current_sub {
            if pending.start_ms <= frame_start_ms {
                let slice_start = pending.submitted_until_ms;
                let slice_stop = frame_start_ms + 1;
                renderer.process_chunk(track, &pending.payload, slice_start, slice_stop - slice_start);
                pending.start_ms = pending.submitted_until_ms;
                pending.submitted_until_ms = slice_stop;
            }
        }
    }

    /// Renders (or reuses the cached render for) `frame_start_ms`, returning
    /// the overlay to composite if any (spec §4.E "Render").
    pub fn render<R: TextRenderer>(
        &mut self,
        renderer: &mut R,
        track: &mut R::Track,
        frame_start_ms: i64,
        crop: CropRect,
        wshift: u8,
        hshift: u8,
        chroma_sampling: ChromaSampling,
        chroma_coeffs: ([u32; 4], [u32; 4]),
    ) -> Option<&OverlayBuffer> {
        let (fragments, changed) = renderer.render_frame(track, frame_start_ms);
        if changed {
            self.last_render = Self::compose_bounded(&fragments, crop, wshift, hshift, chroma_sampling, chroma_coeffs);
        }
        self.last_render.as_ref()
    }

    fn compose_bounded(
        fragments: &[GlyphFragment],
        crop: CropRect,
        wshift: u8,
        hshift: u8,
        chroma_sampling: ChromaSampling,
        chroma_coeffs: ([u32; 4], [u32; 4]),
    ) -> Option<OverlayBuffer> {
        let (mut x1, mut y1, x2, y2) = bounding_box(fragments)?;

        // Pad the origin down to the dst chroma grid, relative to the crop
        // origin (spec §4.E / invariant 5).
        x1 -= (x1 + crop.left as i32) & ((1i32 << wshift) - 1);
        y1 -= (y1 + crop.top as i32) & ((1i32 << hshift) - 1);

        let w = (x2 - x1) as usize;
        let h = (y2 - y1) as usize;

        let mut overlay = compose(fragments, w, h, x1, y1, chroma_sampling, chroma_coeffs);
        overlay.x += crop.left as i32;
        overlay.y_pos += crop.top as i32;
        Some(overlay)
    }
}

fn bounding_box(fragments: &[GlyphFragment]) -> Option<(i32, i32, i32, i32)> {
    let mut x1 = i32::MAX;
    let mut y1 = i32::MAX;
    let mut x2 = 0i32;
    let mut y2 = 0i32;
    let mut any = false;

    for f in fragments {
        if f.w > 0 && f.h > 0 {
            any = true;
            x2 = x2.max(f.dst_x + f.w as i32);
            y2 = y2.max(f.dst_y + f.h as i32);
            x1 = x1.min(f.dst_x);
            y1 = y1.min(f.dst_y);
        }
    }

    if any {
        Some((x1, y1, x2, y2))
    } else {
        None
    }
}
