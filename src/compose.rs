//! Component B: the chroma-aware composer for glyph-fragment-based overlays
//! (text/ASS rendering output).
//!
//! Grounded on `rendersub.c`'s `ComposeSubsampleASS`, `ssaAlpha`,
//! `ALPHA_BLEND`/`div255`, and the chroma-coefficient derivation block in
//! `hb_rendersub_init`.

use itertools::iproduct;

use crate::external::{rgb_to_yuv_bt709, GlyphFragment};
use crate::frame::{ChromaLocation, ChromaSampling, OverlayBuffer};

/// `div255(x) = ((x + ((x + 128) >> 8)) + 128) >> 8` — a fast, exact integer
/// approximation of `round(x / 255)` used throughout the composer.
#[inline(always)]
fn div255(x: u32) -> u32 {
    ((x + ((x + 128) >> 8)) + 128) >> 8
}

/// `(srcA*srcRGB + dstRGB*dstAc + outA/2) / outA`.
#[inline(always)]
fn alpha_blend(src_a: u32, src_rgb: u32, dst_ac: u32, dst_rgb: u32, out_a: u32) -> u32 {
    (src_a * src_rgb + dst_rgb * dst_ac + (out_a >> 1)) / out_a
}

/// Derives the separable chroma-smoothing coefficients for one axis from the
/// symmetric base kernel `[1, 3, 9, 27, 9, 3, 1]` (spec §3/§4.B). Returns
/// `(coeffs_x, coeffs_y)`, each length 4.
///
/// The `BOTTOM`/`BOTTOMLEFT` arms fall through to reuse `TOP`'s vertical
/// offset, exactly mirroring the C `switch` fall-through. This is preserved
/// deliberately (spec §9's open question), not corrected: `BOTTOM` siting
/// yields the same kernel as `TOP` siting here.
pub fn chroma_coefficients(
    wshift: u8,
    hshift: u8,
    chroma_location: ChromaLocation,
) -> ([u32; 4], [u32; 4]) {
    const BASE: [u32; 7] = [1, 3, 9, 27, 9, 3, 1];

    let mut w_x: i32 = 4 - (1i32 << wshift);
    let mut w_y: i32 = 4 - (1i32 << hshift);

    use ChromaLocation::*;
    match chroma_location {
        TopLeft => {
            w_x += (1 << wshift) - 1;
            w_y += (1 << hshift) - 1;
        }
        Top => {
            w_y += (1 << hshift) - 1;
        }
        Left => {
            w_x += (1 << wshift) - 1;
        }
        BottomLeft => {
            w_x += (1 << wshift) - 1;
            w_y += (1 << hshift) - 1;
        }
        Bottom => {
            w_y += (1 << hshift) - 1;
        }
        Center | Unknown => {}
    }

    let axis = |w: i32| -> [u32; 4] {
        let mut out = [0u32; 4];
        let parity_bump = if w & 1 == 0 { 1 } else { 0 };
        for (x, slot) in out.iter_mut().enumerate() {
            let x = x as i32;
            *slot = (BASE[(x + w) as usize] + BASE[(x + w + parity_bump) as usize]) >> 1;
        }
        out
    };

    (axis(w_x), axis(w_y))
}

/// Composes a list of glyph fragments into a chroma-subsampled YUVA overlay
/// buffer of size `(width, height)`, whose top-left maps to `(x, y)` in
/// overlay coordinates (spec §4.B). Fragment coordinates are given relative
/// to that same origin.
pub fn compose(
    fragments: &[GlyphFragment],
    width: usize,
    height: usize,
    x: i32,
    y: i32,
    chroma_sampling: ChromaSampling,
    chroma_coeffs: ([u32; 4], [u32; 4]),
) -> OverlayBuffer {
    let flat_stride = width * 4;
    let mut compo = vec![0u8; flat_stride * height];

    for frag in fragments {
        if frag.w == 0 || frag.h == 0 {
            continue;
        }
        let yuv = rgb_to_yuv_bt709(((frag.r() as u32) << 16) | ((frag.g() as u32) << 8) | frag.b() as u32);
        let frame_y = (yuv >> 16) & 0xff;
        let frame_v = (yuv >> 8) & 0xff;
        let frame_u = yuv & 0xff;
        let frame_alpha = frag.frame_alpha() as u32;

        let ini_fx = ((frag.dst_x - x) * 4 + (frag.dst_y - y) * flat_stride as i32) as isize;

        for yy in 0..frag.h {
            let row_base = ini_fx + (yy as isize) * flat_stride as isize;
            for xx in 0..frag.w {
                let glyph_alpha = frag.bitmap[yy * frag.stride + xx] as u32;
                let a = div255((255 - frame_alpha) * glyph_alpha);
                if a == 0 {
                    continue;
                }
                let fx = (row_base + (xx as isize) * 4) as usize;
                if compo[fx + 3] != 0 {
                    let alpha_in_scaled = a * 255;
                    let alpha_compo = compo[fx + 3] as u32 * (255 - a);
                    let res_alpha = alpha_in_scaled + alpha_compo;

                    compo[fx] = alpha_blend(alpha_in_scaled, frame_y, alpha_compo, compo[fx] as u32, res_alpha) as u8;
                    compo[fx + 1] =
                        alpha_blend(alpha_in_scaled, frame_u, alpha_compo, compo[fx + 1] as u32, res_alpha) as u8;
                    compo[fx + 2] =
                        alpha_blend(alpha_in_scaled, frame_v, alpha_compo, compo[fx + 2] as u32, res_alpha) as u8;
                    compo[fx + 3] = div255(res_alpha) as u8;
                } else {
                    compo[fx] = frame_y as u8;
                    compo[fx + 1] = frame_u as u8;
                    compo[fx + 2] = frame_v as u8;
                    compo[fx + 3] = a as u8;
                }
            }
        }
    }

    let mut overlay = OverlayBuffer::new(width, height, chroma_sampling);
    let (wshift, hshift) = chroma_sampling.decimation();
    let (coeffs_x, coeffs_y) = chroma_coeffs;

    for yy in 0..height {
        let ys = yy >> hshift;
        let is_chroma_line = yy == ys << hshift;
        for xx in 0..width {
            let fx = yy * flat_stride + xx * 4;
            overlay.y.set(xx, yy, compo[fx]);
            overlay.a.set(xx, yy, compo[fx + 3]);

            let xs = xx >> wshift;
            if is_chroma_line && xx == xs << wshift {
                let mut accu_a = 0u32;
                let mut accu_b = 0u32;
                let mut accu_c = 0u32;
                for (yz, xz) in iproduct!(0..(1usize << hshift), 0..(1usize << wshift)) {
                    if yz + yy >= height || xz + xx >= width {
                        continue;
                    }
                    let sfx = fx + yz * flat_stride + xz * 4;
                    let alpha = compo[sfx + 3] as u32;
                    let coeff = coeffs_x[xz] * coeffs_y[yz] * alpha;
                    accu_a += coeff * compo[sfx + 1] as u32;
                    accu_b += coeff * compo[sfx + 2] as u32;
                    accu_c += coeff;
                }
                if accu_c > 0 {
                    overlay.u.set(xs, ys, ((accu_a + (accu_c - 1)) / accu_c) as u8);
                    overlay.v.set(xs, ys, ((accu_b + (accu_c - 1)) / accu_c) as u8);
                }
            }
        }
    }

    overlay.x = x;
    overlay.y_pos = y;
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_kernel_center_420_matches_spec_s3() {
        let (cx, cy) = chroma_coefficients(1, 1, ChromaLocation::Center);
        assert_eq!(cx, [6, 18, 6, 2]);
        assert_eq!(cy, [6, 18, 6, 2]);
    }

    #[test]
    fn chroma_kernel_is_symmetric_for_center() {
        let (cx, _) = chroma_coefficients(1, 1, ChromaLocation::Center);
        assert_eq!(cx[0], cx[1].min(cx[0]).max(cx[0]));
        // palindromic around the kernel's own center for CENTER siting
        assert_eq!(cx[0], 6);
        assert_eq!(cx[3], 2);
    }

    #[test]
    fn bottom_reuses_top_vertical_offset() {
        let (_, top_y) = chroma_coefficients(1, 1, ChromaLocation::Top);
        let (_, bottom_y) = chroma_coefficients(1, 1, ChromaLocation::Bottom);
        assert_eq!(top_y, bottom_y);
    }

    #[test]
    fn single_opaque_fragment_writes_through_directly() {
        let frag = GlyphFragment {
            w: 2,
            h: 2,
            stride: 2,
            dst_x: 0,
            dst_y: 0,
            bitmap: vec![255, 255, 255, 255],
            color_rgba: 0xffffff00,
        };
        let overlay = compose(&[frag], 2, 2, 0, 0, ChromaSampling::Cs420, chroma_coefficients(1, 1, ChromaLocation::Center));
        assert_eq!(overlay.y.get(0, 0), 255);
        assert_eq!(overlay.a.get(0, 0), 255);
    }

    #[test]
    fn empty_fragment_list_yields_zero_alpha() {
        let overlay = compose(&[], 4, 4, 0, 0, ChromaSampling::Cs420, chroma_coefficients(1, 1, ChromaLocation::Center));
        assert!(overlay.a.data.iter().all(|&p| p == 0));
    }
}
