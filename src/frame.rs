//! Frame, plane and pixel-format description types.
//!
//! Grounded on the teacher crate's `video::{FrameInfo, PlaneData, ChromaSampling,
//! ChromaSamplePosition}` (`src/video/mod.rs`), generalized with the extra
//! presentation-time, flags and placement metadata that a burn-in filter's
//! frame model needs and a metrics crate's never did.

use crate::pixel::Pixel;
use num_traits::Zero;

/// One plane of sample data, in row-major order. `stride` is measured in
/// samples (not bytes) and may exceed `width` to account for alignment
/// padding in an externally-allocated frame.
#[derive(Clone, Debug)]
pub struct Plane<T: Pixel> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub data: Vec<T>,
}

impl<T: Pixel> Plane<T> {
    /// Allocates a zero-filled plane with `stride == width`.
    pub fn new(width: usize, height: usize) -> Self {
        Plane {
            width,
            height,
            stride: width,
            data: vec![T::zero(); width.max(1) * height.max(1)],
        }
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.stride + x]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        self.data[y * self.stride + x] = v;
    }

    #[inline(always)]
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.stride..y * self.stride + self.width]
    }
}

/// Whether a frame's chroma is stored in two separate planes, or interleaved
/// into a single plane alongside luma ("semi-planar", e.g. NV12).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaneLayout {
    /// Y, U, V each in their own plane.
    Planar,
    /// Y in its own plane; U and V interleaved sample-by-sample in a second
    /// plane (U at even indices, V at odd indices).
    SemiPlanar,
}

/// Chroma subsampling family. Monochrome (4:0:0) is out of scope (spec §1).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChromaSampling {
    Cs420,
    Cs422,
    Cs444,
}

impl ChromaSampling {
    /// Right-shift to apply to luma plane dimensions to get chroma plane
    /// dimensions, as `(wshift, hshift)`.
    pub fn decimation(self) -> (u8, u8) {
        match self {
            ChromaSampling::Cs420 => (1, 1),
            ChromaSampling::Cs422 => (1, 0),
            ChromaSampling::Cs444 => (0, 0),
        }
    }
}

/// Sub-pixel position of a chroma sample relative to the 2x2 (or 2x1) luma
/// block it represents. Mirrors `AVCHROMA_LOC_*`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChromaLocation {
    Center,
    Top,
    TopLeft,
    Left,
    Bottom,
    BottomLeft,
    /// Transfer function/siting not signaled. Treated identically to
    /// `Center`.
    Unknown,
}

/// The family of input pixel formats this filter accepts (spec §1/§4.F),
/// covering 8/10/12/16-bit planar and semi-planar YUV at 4:2:0/4:2:2/4:4:4.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputPixelFormat {
    Yuv420P8,
    Yuv420P10,
    Yuv420P12,
    Yuv420P16,
    Nv12,
    P010,
    P012,
    P016,
    Yuv422P8,
    Yuv422P10,
    Yuv422P12,
    Yuv422P16,
    Nv16,
    P210,
    P212,
    P216,
    Yuv444P8,
    Yuv444P10,
    Yuv444P12,
    Yuv444P16,
    Nv24,
    P410,
    P412,
    P416,
}

impl InputPixelFormat {
    pub fn depth(self) -> u32 {
        use InputPixelFormat::*;
        match self {
            Yuv420P8 | Nv12 | Yuv422P8 | Nv16 | Yuv444P8 | Nv24 => 8,
            Yuv420P10 | P010 | Yuv422P10 | P210 | Yuv444P10 | P410 => 10,
            Yuv420P12 | P012 | Yuv422P12 | P212 | Yuv444P12 | P412 => 12,
            Yuv420P16 | P016 | Yuv422P16 | P216 | Yuv444P16 | P416 => 16,
        }
    }

    pub fn chroma_sampling(self) -> ChromaSampling {
        use InputPixelFormat::*;
        match self {
            Yuv420P8 | Yuv420P10 | Yuv420P12 | Yuv420P16 | Nv12 | P010 | P012 | P016 => {
                ChromaSampling::Cs420
            }
            Yuv422P8 | Yuv422P10 | Yuv422P12 | Yuv422P16 | Nv16 | P210 | P212 | P216 => {
                ChromaSampling::Cs422
            }
            Yuv444P8 | Yuv444P10 | Yuv444P12 | Yuv444P16 | Nv24 | P410 | P412 | P416 => {
                ChromaSampling::Cs444
            }
        }
    }

    pub fn layout(self) -> PlaneLayout {
        use InputPixelFormat::*;
        match self {
            Nv12 | P010 | P012 | P016 | Nv16 | P210 | P212 | P216 | Nv24 | P410 | P412 | P416 => {
                PlaneLayout::SemiPlanar
            }
            _ => PlaneLayout::Planar,
        }
    }

    /// The YUVA overlay format to composite into, chosen from the input's
    /// chroma family (spec §4.F: 420->YUVA420P, 422->YUVA422P, 444/unknown->
    /// YUVA444P).
    pub fn overlay_chroma_sampling(self) -> ChromaSampling {
        self.chroma_sampling()
    }
}

/// Derived per-filter-instance pixel format facts (spec §3's "Pixel-format
/// descriptor"), computed once at `init` time.
#[derive(Copy, Clone, Debug)]
pub struct PixelFormatDescriptor {
    pub depth: u32,
    pub wshift: u8,
    pub hshift: u8,
    pub layout: PlaneLayout,
    pub chroma_location: ChromaLocation,
    pub chroma_sampling: ChromaSampling,
}

impl PixelFormatDescriptor {
    pub fn new(fmt: InputPixelFormat, chroma_location: ChromaLocation) -> Self {
        let (wshift, hshift) = fmt.chroma_sampling().decimation();
        PixelFormatDescriptor {
            depth: fmt.depth(),
            wshift,
            hshift,
            layout: fmt.layout(),
            chroma_location,
            chroma_sampling: fmt.chroma_sampling(),
        }
    }

    /// `shift` as used throughout component A: `depth - 8`.
    pub fn shift(&self) -> u32 {
        self.depth - 8
    }
}

/// The crop rectangle applied to the final video dimensions (spec §3).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CropRect {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropRect {
    /// Validates `crop[0]+crop[1] < height` and `crop[2]+crop[3] < width`.
    pub fn is_valid_for(&self, width: u32, height: u32) -> bool {
        self.top + self.bottom < height && self.left + self.right < width
    }
}

/// A tiny bitflags-alike, avoiding a dependency for a handful of frame flags.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $repr:ty {
            $( const $flag:ident = $value:expr; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name(pub $repr);

        impl $name {
            $( pub const $flag: $name = $name($value); )*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    /// Frame flags (spec §3/§6). Hand-rolled rather than pulling in a crate
    /// for four bits.
    pub struct FrameFlags: u8 {
        const EOF = 0b001;
        const EOS = 0b010;
        const WRITABLE = 0b100;
    }
}

/// A YUV video frame with up to 3 planes, generic over 8-bit or deep
/// (10/12/16-bit-in-u16) samples.
#[derive(Clone, Debug)]
pub enum FramePlanes<T: Pixel> {
    Planar { y: Plane<T>, u: Plane<T>, v: Plane<T> },
    SemiPlanar { y: Plane<T>, uv: Plane<T> },
}

impl<T: Pixel> FramePlanes<T> {
    pub fn layout(&self) -> PlaneLayout {
        match self {
            FramePlanes::Planar { .. } => PlaneLayout::Planar,
            FramePlanes::SemiPlanar { .. } => PlaneLayout::SemiPlanar,
        }
    }

    pub fn luma(&self) -> &Plane<T> {
        match self {
            FramePlanes::Planar { y, .. } => y,
            FramePlanes::SemiPlanar { y, .. } => y,
        }
    }

    pub fn luma_mut(&mut self) -> &mut Plane<T> {
        match self {
            FramePlanes::Planar { y, .. } => y,
            FramePlanes::SemiPlanar { y, .. } => y,
        }
    }
}

/// A decoded video frame (spec §3's "Frame buffer").
#[derive(Clone, Debug)]
pub struct FrameBuffer<T: Pixel> {
    pub width: usize,
    pub height: usize,
    pub planes: FramePlanes<T>,
    /// Presentation time, 90 kHz ticks.
    pub pts: i64,
    pub stop: Option<i64>,
    pub flags: FrameFlags,
    pub x: i32,
    pub y: i32,
    pub window_width: u32,
    pub window_height: u32,
}

impl<T: Pixel> FrameBuffer<T> {
    pub fn is_writable(&self) -> bool {
        self.flags.contains(FrameFlags::WRITABLE)
    }
}

/// A subtitle overlay buffer: always 8-bit YUVA planar (spec §3). Pure pixel
/// geometry — presentation timing is carried by the track entry that wraps
/// it, not by the overlay itself.
#[derive(Clone, Debug)]
pub struct OverlayBuffer {
    pub width: usize,
    pub height: usize,
    pub chroma_sampling: ChromaSampling,
    pub y: Plane<u8>,
    pub u: Plane<u8>,
    pub v: Plane<u8>,
    pub a: Plane<u8>,
    /// Position in video (or reference-window) coordinates.
    pub x: i32,
    pub y_pos: i32,
    /// Reference resolution this overlay was authored against; `(0, 0)` means
    /// "no rescale needed, already at video dimensions".
    pub window_width: u32,
    pub window_height: u32,
}

impl OverlayBuffer {
    pub fn new(width: usize, height: usize, chroma_sampling: ChromaSampling) -> Self {
        let (wshift, hshift) = chroma_sampling.decimation();
        let cw = (width + (1 << wshift) - 1) >> wshift;
        let ch = (height + (1 << hshift) - 1) >> hshift;
        OverlayBuffer {
            width,
            height,
            chroma_sampling,
            y: Plane::new(width, height),
            u: Plane::new(cw, ch),
            v: Plane::new(cw, ch),
            a: Plane::new(width, height),
            x: 0,
            y_pos: 0,
            window_width: 0,
            window_height: 0,
        }
    }
}
