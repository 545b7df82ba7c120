//! Burns timed subtitle events — bitmap (VOBSUB/PGS/DVB) or styled-text
//! (SSA/SRT/TX3G/CC608) — directly into decoded YUV video frames.
//!
//! The filter is pull-driven: a caller feeds it subtitle events and frames in
//! presentation order and gets frames back with the subtitles already burned
//! into their planes. Nothing here decodes media or renders fonts itself —
//! both the image scaler and the styled-text rasterizer are external
//! collaborators, modeled as traits in [`external`].

/// Sample type abstraction (`u8`/`u16`) shared by every generic frame/plane
/// type in this crate.
pub mod pixel;

/// Frame, plane, and pixel-format description types.
pub mod frame;

/// Error taxonomy, filter status, and the logging callback seam.
pub mod error;

/// The subtitle format tag that selects which track variant is built.
pub mod format;

/// External collaborator traits (image scaler, styled-text renderer) and the
/// RGB→YUV color conversion.
pub mod external;

/// Component A: the pixel blender that burns an overlay into a frame.
pub mod blend;

/// Component B: the chroma-aware glyph-fragment composer.
pub mod compose;

/// Component C: placement and rescaling of a composed overlay onto the
/// video frame.
pub mod placement;

/// Per-subtitle-format track state machines (bitmap and text/ASS).
pub mod track;

/// Component F: the filter entry point tying every other module together.
pub mod dispatch;

pub use dispatch::RenderSubFilter;
pub use error::{FilterStatus, Logger, RenderSubError, Severity, StdLogger};
pub use format::SubtitleFormat;
