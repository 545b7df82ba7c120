//! Component F: the filter entry point.
//!
//! Grounded on `rendersub.c`'s `hb_rendersub_init`/`_post_init`/`_work`/
//! `_close` quartet and the `hb_filter_object_t` vtable shape, adapted to
//! `init`/`post_init`/`work`/`close` methods on one `RenderSubFilter` type
//! (spec §6's filter contract) instead of a C vtable plus `void*` private
//! data.

use crate::blend::blend;
use crate::compose::chroma_coefficients;
use crate::error::{FilterStatus, Logger, RenderSubError, Severity};
use crate::external::{Scaler, TextRenderer};
use crate::format::SubtitleFormat;
use crate::frame::{ChromaLocation, CropRect, FrameBuffer, FrameFlags, InputPixelFormat, OverlayBuffer, PixelFormatDescriptor};
use crate::pixel::Pixel;
use crate::placement::{place, rescale};
use crate::track::bitmap::{BitmapEntry, BitmapPolicy, BitmapTrack};
use crate::track::text::{
    synthesize_ass_header, TextEvent, TextTrack, MONO_FONT_NAME, MONO_FONT_SIZE_FACTOR, SANS_FONT_NAME, SANS_FONT_SIZE_FACTOR,
};

/// Owns everything one burned-in subtitle track needs across the life of a
/// filter instance: format/geometry facts resolved once at `init`/`post_init`,
/// the per-format track state machine, the scaler's cached context, and the
/// styled-text renderer's session (spec §3/§6).
pub struct RenderSubFilter<S: Scaler, R: TextRenderer> {
    format: SubtitleFormat,
    descriptor: PixelFormatDescriptor,
    chroma_coeffs: ([u32; 4], [u32; 4]),

    video_width: u32,
    video_height: u32,
    crop: CropRect,
    post_init_done: bool,

    scaler: S,
    scaler_cache: Option<(u32, u32, S::Context)>,

    renderer: R,
    renderer_track: Option<R::Track>,

    bitmap_track: Option<BitmapTrack>,
    text_track: Option<TextTrack>,
    /// The codec's script/subtitle header, deferred until the first
    /// `work()` call (spec §4.E). For formats with no codec-provided header
    /// of their own, `post_init` overwrites this with a synthesized one
    /// before any frame arrives.
    extradata: Vec<u8>,

    logger: Box<dyn Logger>,
    done: bool,
}

impl<S: Scaler, R: TextRenderer> RenderSubFilter<S, R> {
    /// Resolves format/geometry facts and builds the track appropriate to
    /// `format` (spec §6's `init`). Geometry-dependent setup (script sizing,
    /// the chroma-coefficient table) is finished in [`Self::post_init`],
    /// mirroring the C's two-stage `hb_filter_init`/`_post_init` split.
    pub fn init(
        format: SubtitleFormat,
        pixel_format: InputPixelFormat,
        chroma_location: ChromaLocation,
        extradata: Vec<u8>,
        scaler: S,
        renderer: R,
        logger: Box<dyn Logger>,
    ) -> Result<Self, RenderSubError> {
        let descriptor = PixelFormatDescriptor::new(pixel_format, chroma_location);

        let bitmap_track = if format.is_bitmap() {
            let policy = match format {
                SubtitleFormat::VobSub => BitmapPolicy::VobSub,
                SubtitleFormat::PgsSub | SubtitleFormat::DvbSub => BitmapPolicy::PgsDvb,
                _ => return Err(RenderSubError::UnsupportedFormat { format: format.to_string() }),
            };
            Some(BitmapTrack::new(policy))
        } else {
            None
        };

        let text_track = if format.is_text() { Some(TextTrack::new()) } else { None };

        logger.log(Severity::Debug, format_args!("render-sub filter initialized for format {format}"));

        Ok(RenderSubFilter {
            format,
            descriptor,
            chroma_coeffs: ([0; 4], [0; 4]),
            video_width: 0,
            video_height: 0,
            crop: CropRect::default(),
            post_init_done: false,
            scaler,
            scaler_cache: None,
            renderer,
            renderer_track: None,
            bitmap_track,
            text_track,
            extradata,
            logger,
            done: false,
        })
    }

    /// Snapshots final video geometry, builds the chroma-coefficient table,
    /// and — for formats with no codec-provided header (spec §4.F) —
    /// configures the styled-text renderer with a synthesized minimal script.
    pub fn post_init(
        &mut self,
        video_width: u32,
        video_height: u32,
        crop: CropRect,
        fonts: &[(String, Vec<u8>)],
    ) -> Result<(), RenderSubError> {
        if !crop.is_valid_for(video_width, video_height) {
            return Err(RenderSubError::InputMismatch {
                reason: format!("crop {crop:?} does not fit {video_width}x{video_height}"),
            });
        }

        self.video_width = video_width;
        self.video_height = video_height;
        self.crop = crop;
        self.chroma_coeffs = chroma_coefficients(self.descriptor.wshift, self.descriptor.hshift, self.descriptor.chroma_location);

        if self.format.is_text() {
            if self.renderer_track.is_none() {
                self.renderer_track = Some(self.renderer.track_new());
            }

            for (name, bytes) in fonts {
                self.renderer.add_font(name, bytes);
            }

            let crop_w = video_width.saturating_sub(crop.left + crop.right);
            let crop_h = video_height.saturating_sub(crop.top + crop.bottom);
            self.renderer.set_frame_size(crop_w, crop_h);
            self.renderer.set_storage_size(crop_w, crop_h);
            self.renderer.set_hinting_none();
            self.renderer.set_font_scale(1.0);
            self.renderer.set_line_spacing(1.0);
            self.renderer.set_check_readorder(false);

            if self.format.needs_synthetic_header() {
                let (font_name, factor) = if self.format == SubtitleFormat::Cc608 {
                    (MONO_FONT_NAME, MONO_FONT_SIZE_FACTOR)
                } else {
                    (SANS_FONT_NAME, SANS_FONT_SIZE_FACTOR)
                };
                let font_size = video_height as f64 * factor;
                self.extradata = synthesize_ass_header(font_name, font_size, crop_w, crop_h);
            }
        }

        self.post_init_done = true;
        self.logger.log(
            Severity::Debug,
            format_args!("render-sub post_init: {video_width}x{video_height}, crop {crop:?}"),
        );
        Ok(())
    }

    /// Appends a decoded bitmap subtitle (spec §4.D). Returns an error if
    /// this instance was built for a text format.
    pub fn ingest_bitmap_entry(&mut self, entry: BitmapEntry) -> Result<(), RenderSubError> {
        match &mut self.bitmap_track {
            Some(track) => {
                track.ingest([entry]);
                Ok(())
            }
            None => Err(RenderSubError::UnsupportedFormat { format: self.format.to_string() }),
        }
    }

    /// Feeds one text/ASS event into the track's open-ended state machine
    /// (spec §4.E). Returns an error if this instance was built for a bitmap
    /// format.
    pub fn ingest_text_event(&mut self, event: TextEvent) -> Result<(), RenderSubError> {
        let mut track = self.text_track.take().ok_or_else(|| RenderSubError::UnsupportedFormat {
            format: self.format.to_string(),
        })?;
        let mut rtrack = self.renderer_track.take();
        if let Some(rt) = &mut rtrack {
            track.ingest(&mut self.renderer, rt, event);
        }
        self.text_track = Some(track);
        self.renderer_track = rtrack;
        Ok(())
    }

    /// Burns every overlay active at `frame`'s presentation time directly
    /// into its planes, in place (spec §6's `work`). `EOF` passes through
    /// unmodified after flushing any still-open text event.
    pub fn work<T: Pixel>(&mut self, frame: &mut FrameBuffer<T>) -> FilterStatus {
        if frame.flags.contains(FrameFlags::EOF) {
            if let (Some(mut track), Some(mut rt)) = (self.text_track.take(), self.renderer_track.take()) {
                track.ingest_eof(&mut self.renderer, &mut rt);
                self.text_track = Some(track);
                self.renderer_track = Some(rt);
            }
            self.done = true;
            return FilterStatus::Done;
        }

        if self.done {
            return FilterStatus::Done;
        }

        let frame_start = frame.pts;

        let bitmap_overlays: Vec<OverlayBuffer> = match &mut self.bitmap_track {
            Some(track) => track.overlays_for_frame(frame_start).into_iter().cloned().collect(),
            None => Vec::new(),
        };
        for overlay in &bitmap_overlays {
            self.composite_one(frame, overlay);
        }

        let mut text_track = self.text_track.take();
        let mut renderer_track = self.renderer_track.take();
        let text_overlay = if let (Some(tt), Some(rt)) = (&mut text_track, &mut renderer_track) {
            tt.ensure_script_initialized(&mut self.renderer, rt, &self.extradata);
            tt.tick(&mut self.renderer, rt, frame_start);
            tt.render(
                &mut self.renderer,
                rt,
                frame_start,
                self.crop,
                self.descriptor.wshift,
                self.descriptor.hshift,
                self.descriptor.chroma_sampling,
                self.chroma_coeffs,
            )
            .cloned()
        } else {
            None
        };
        self.text_track = text_track;
        self.renderer_track = renderer_track;

        if let Some(overlay) = &text_overlay {
            self.composite_one(frame, overlay);
        }

        FilterStatus::Ok
    }

    fn composite_one<T: Pixel>(&mut self, frame: &mut FrameBuffer<T>, overlay: &OverlayBuffer) {
        let mut positioned = rescale(&self.scaler, &mut self.scaler_cache, overlay, self.video_width, self.video_height);
        place(&mut positioned, self.video_width, self.video_height, self.crop);
        blend(frame, &positioned, positioned.x, positioned.y_pos, self.descriptor.shift());
    }

    /// Releases the styled-text renderer session and marks this instance
    /// exhausted (spec §6's `close`).
    pub fn close(&mut self) {
        self.renderer_track = None;
        self.done = true;
        self.logger.log(Severity::Debug, format_args!("render-sub filter closed"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StdLogger;
    use crate::external::GlyphFragment;
    use crate::frame::{ChromaSampling, FramePlanes, Plane};
    use std::cell::RefCell;

    struct NoopScaler;
    impl Scaler for NoopScaler {
        type Context = ();
        fn create(&self, _: u32, _: u32, _: ChromaSampling, _: u32, _: u32, _: ChromaSampling) {}
        fn scale(&self, _ctx: &mut (), _src: &[&[u8]], _ss: &[usize], _dst: &mut [&mut [u8]], _ds: &[usize]) {}
    }

    #[derive(Default)]
    struct MockRenderer {
        chunks: RefCell<Vec<(i64, i64)>>,
    }
    impl TextRenderer for MockRenderer {
        type Track = ();
        fn add_font(&mut self, _name: &str, _bytes: &[u8]) {}
        fn set_font_scale(&mut self, _scale: f64) {}
        fn set_hinting_none(&mut self) {}
        fn set_line_spacing(&mut self, _spacing: f64) {}
        fn set_frame_size(&mut self, _w: u32, _h: u32) {}
        fn set_storage_size(&mut self, _w: u32, _h: u32) {}
        fn set_check_readorder(&mut self, _enabled: bool) {}
        fn track_new(&mut self) -> Self::Track {}
        fn process_codec_private(&mut self, _track: &mut Self::Track, _bytes: &[u8]) {}
        fn process_chunk(&mut self, _track: &mut Self::Track, _bytes: &[u8], start_ms: i64, duration_ms: i64) {
            self.chunks.borrow_mut().push((start_ms, duration_ms));
        }
        fn render_frame(&mut self, _track: &mut Self::Track, _time_ms: i64) -> (Vec<GlyphFragment>, bool) {
            (Vec::new(), false)
        }
    }

    fn solid_frame(w: usize, h: usize) -> FrameBuffer<u8> {
        FrameBuffer {
            width: w,
            height: h,
            planes: FramePlanes::Planar { y: Plane::new(w, h), u: Plane::new(w / 2, h / 2), v: Plane::new(w / 2, h / 2) },
            pts: 0,
            stop: None,
            flags: FrameFlags::WRITABLE,
            x: 0,
            y: 0,
            window_width: 0,
            window_height: 0,
        }
    }

    #[test]
    fn init_rejects_bitmap_track_for_text_only_construction() {
        let filter = RenderSubFilter::init(
            SubtitleFormat::SsaSub,
            InputPixelFormat::Yuv420P8,
            ChromaLocation::Center,
            Vec::new(),
            NoopScaler,
            MockRenderer::default(),
            Box::new(StdLogger),
        );
        let mut filter = filter.unwrap();
        let entry = BitmapEntry {
            overlay: OverlayBuffer::new(4, 4, ChromaSampling::Cs420),
            start: 0,
            stop: None,
            chain: Vec::new(),
        };
        assert!(filter.ingest_bitmap_entry(entry).is_err());
    }

    #[test]
    fn eof_marks_filter_done_and_is_idempotent() {
        let mut filter = RenderSubFilter::init(
            SubtitleFormat::VobSub,
            InputPixelFormat::Yuv420P8,
            ChromaLocation::Center,
            Vec::new(),
            NoopScaler,
            MockRenderer::default(),
            Box::new(StdLogger),
        )
        .unwrap();
        filter.post_init(64, 64, CropRect::default(), &[]).unwrap();

        let mut frame = solid_frame(64, 64);
        frame.flags.insert(FrameFlags::EOF);
        assert_eq!(filter.work(&mut frame), FilterStatus::Done);
        assert_eq!(filter.work(&mut frame), FilterStatus::Done);
    }

    #[test]
    fn post_init_rejects_crop_larger_than_frame() {
        let mut filter = RenderSubFilter::init(
            SubtitleFormat::VobSub,
            InputPixelFormat::Yuv420P8,
            ChromaLocation::Center,
            Vec::new(),
            NoopScaler,
            MockRenderer::default(),
            Box::new(StdLogger),
        )
        .unwrap();
        let crop = CropRect { top: 100, bottom: 100, left: 0, right: 0 };
        assert!(filter.post_init(64, 64, crop, &[]).is_err());
    }

    #[test]
    fn bitmap_entry_burns_into_frame_at_its_frame() {
        let mut filter = RenderSubFilter::init(
            SubtitleFormat::VobSub,
            InputPixelFormat::Yuv420P8,
            ChromaLocation::Center,
            Vec::new(),
            NoopScaler,
            MockRenderer::default(),
            Box::new(StdLogger),
        )
        .unwrap();
        filter.post_init(32, 32, CropRect::default(), &[]).unwrap();

        let mut overlay = OverlayBuffer::new(8, 8, ChromaSampling::Cs420);
        for p in overlay.y.data.iter_mut() {
            *p = 200;
        }
        for p in overlay.a.data.iter_mut() {
            *p = 255;
        }
        filter
            .ingest_bitmap_entry(BitmapEntry { overlay, start: 0, stop: Some(1000), chain: Vec::new() })
            .unwrap();

        let mut frame = solid_frame(32, 32);
        frame.pts = 0;
        filter.work(&mut frame);

        let y = frame.planes.luma();
        assert!(y.data.iter().any(|&p| p == 200));
    }
}
