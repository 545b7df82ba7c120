//! Component C: placement and rescaling.
//!
//! Grounded on `rendersub.c`'s `ScaleSubtitle`. The Lanczos resampling step
//! itself lives behind the external [`Scaler`] trait; this module owns the
//! pass-through/rescale decision, the scaler-context cache keyed by
//! `(width, height)` (mirrors `pv->sws`/`sws_width`/`sws_height`), and the
//! vertical/horizontal margin placement math.

use crate::external::Scaler;
use crate::frame::{CropRect, OverlayBuffer};

const RESCALE_TOLERANCE: f64 = 0.01;

/// Rescales `sub` to match `video_w`/`video_h` if it declares a reference
/// window that differs meaningfully from the video's dimensions; otherwise
/// returns an unscaled duplicate (spec §4.C's pass-through branch).
///
/// `cache` holds the scaler context for the last (dst_w, dst_h) pair used,
/// rebuilt only when the target size changes.
pub fn rescale<S: Scaler>(
    scaler: &S,
    cache: &mut Option<(u32, u32, S::Context)>,
    sub: &OverlayBuffer,
    video_w: u32,
    video_h: u32,
) -> OverlayBuffer {
    let mut xfactor = 1.0f64;
    let mut yfactor = 1.0f64;
    if sub.window_width > 0 && sub.window_height > 0 {
        xfactor = video_w as f64 / sub.window_width as f64;
        yfactor = video_h as f64 / sub.window_height as f64;
        // Preserve PAR across independent crop: use the larger factor for both axes.
        if xfactor > yfactor {
            yfactor = xfactor;
        } else {
            xfactor = yfactor;
        }
    }

    if (xfactor - 1.0).abs() <= RESCALE_TOLERANCE && (yfactor - 1.0).abs() <= RESCALE_TOLERANCE {
        return sub.clone();
    }

    let dst_w = (sub.width as f64 * xfactor).round() as u32;
    let dst_h = (sub.height as f64 * yfactor).round() as u32;

    let mut dst = OverlayBuffer::new(dst_w as usize, dst_h as usize, sub.chroma_sampling);
    dst.x = (sub.x as f64 * xfactor).round() as i32;
    dst.y_pos = (sub.y_pos as f64 * yfactor).round() as i32;

    let needs_new_context = match cache {
        Some((w, h, _)) => *w != dst_w || *h != dst_h,
        None => true,
    };
    if needs_new_context {
        let ctx = scaler.create(
            sub.width as u32,
            sub.height as u32,
            sub.chroma_sampling,
            dst_w,
            dst_h,
            sub.chroma_sampling,
        );
        *cache = Some((dst_w, dst_h, ctx));
    }
    let ctx = &mut cache.as_mut().unwrap().2;

    let src_planes: [&[u8]; 4] = [&sub.y.data, &sub.u.data, &sub.v.data, &sub.a.data];
    let src_strides = [sub.y.stride, sub.u.stride, sub.v.stride, sub.a.stride];
    let dst_strides = [dst.y.stride, dst.u.stride, dst.v.stride, dst.a.stride];
    let mut dst_planes: [&mut [u8]; 4] = [&mut dst.y.data, &mut dst.u.data, &mut dst.v.data, &mut dst.a.data];

    scaler.scale(ctx, &src_planes, &src_strides, &mut dst_planes, &dst_strides);

    dst
}

/// Moves `overlay` in place so it clears the crop margins, or centers it if
/// it cannot fit (spec §4.C). Call after [`rescale`].
pub fn place(overlay: &mut OverlayBuffer, video_w: u32, video_h: u32, crop: CropRect) {
    let visible_h = video_h - crop.top - crop.bottom;
    let margin_top = ((visible_h * 2) / 100).min(20);
    let h = overlay.height as u32;

    let top = if h > visible_h.saturating_sub(margin_top * 2) {
        crop.top as i32 + (visible_h as i32 - h as i32) / 2
    } else if overlay.y_pos < (crop.top + margin_top) as i32 {
        (crop.top + margin_top) as i32
    } else if overlay.y_pos > (video_h - crop.bottom - margin_top) as i32 - h as i32 {
        (video_h - crop.bottom - margin_top) as i32 - h as i32
    } else {
        overlay.y_pos
    };

    let visible_w = video_w - crop.left - crop.right;
    let w = overlay.width as u32;

    let left = if w > visible_w.saturating_sub(40) {
        crop.left as i32 + (visible_w as i32 - w as i32) / 2
    } else if overlay.x < (crop.left + 20) as i32 {
        (crop.left + 20) as i32
    } else if overlay.x > (video_w - crop.right - 20) as i32 - w as i32 {
        (video_w - crop.right - 20) as i32 - w as i32
    } else {
        overlay.x
    };

    overlay.x = left;
    overlay.y_pos = top;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChromaSampling;

    struct NoopScaler;
    impl Scaler for NoopScaler {
        type Context = ();
        fn create(&self, _: u32, _: u32, _: ChromaSampling, _: u32, _: u32, _: ChromaSampling) {}
        fn scale(&self, _ctx: &mut (), _src: &[&[u8]], _ss: &[usize], _dst: &mut [&mut [u8]], _ds: &[usize]) {}
    }

    #[test]
    fn no_window_is_pass_through() {
        let sub = OverlayBuffer::new(100, 100, ChromaSampling::Cs420);
        let mut cache = None;
        let out = rescale(&NoopScaler, &mut cache, &sub, 1920, 1080);
        assert_eq!(out.width, 100);
        assert_eq!(out.height, 100);
        assert!(cache.is_none());
    }

    #[test]
    fn matching_window_is_pass_through_s7() {
        let mut sub = OverlayBuffer::new(100, 100, ChromaSampling::Cs420);
        sub.window_width = 1920;
        sub.window_height = 1080;
        let mut cache = None;
        let out = rescale(&NoopScaler, &mut cache, &sub, 1920, 1080);
        assert_eq!(out.width, 100);
        assert_eq!(out.height, 100);
    }

    #[test]
    fn mismatched_window_rescales_and_caches_context() {
        let mut sub = OverlayBuffer::new(100, 100, ChromaSampling::Cs420);
        sub.window_width = 960;
        sub.window_height = 540;
        let mut cache = None;
        let out = rescale(&NoopScaler, &mut cache, &sub, 1920, 1080);
        assert_eq!(out.width, 200);
        assert_eq!(out.height, 200);
        assert!(cache.is_some());
    }

    #[test]
    fn placement_centers_oversized_subtitle_s4() {
        let mut overlay = OverlayBuffer::new(200, 450, ChromaSampling::Cs420);
        let crop = CropRect { top: 50, bottom: 50, left: 0, right: 0 };
        place(&mut overlay, 1000, 500, crop);
        assert_eq!(overlay.y_pos, 25);
    }

    #[test]
    fn placement_leaves_fitting_subtitle_unchanged_invariant6() {
        let mut overlay = OverlayBuffer::new(100, 40, ChromaSampling::Cs420);
        overlay.y_pos = 100;
        overlay.x = 100;
        let crop = CropRect::default();
        place(&mut overlay, 1000, 500, crop);
        assert_eq!(overlay.y_pos, 100);
        assert_eq!(overlay.x, 100);
    }
}
