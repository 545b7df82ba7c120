//! Subtitle format tag (spec §3) — selects which track variant is built.

use std::fmt;

/// One of the subtitle formats this filter can burn in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubtitleFormat {
    VobSub,
    PgsSub,
    DvbSub,
    SsaSub,
    ImportSrt,
    ImportSsa,
    Utf8,
    Tx3g,
    Cc608,
}

impl SubtitleFormat {
    /// Bitmap tracks carry pre-rendered pixel data (§4.D); everything else
    /// routes through the text/ASS track (§4.E).
    pub fn is_bitmap(self) -> bool {
        matches!(
            self,
            SubtitleFormat::VobSub | SubtitleFormat::PgsSub | SubtitleFormat::DvbSub
        )
    }

    pub fn is_text(self) -> bool {
        !self.is_bitmap()
    }

    /// Whether this format needs a synthesized minimal script header rather
    /// than one carried in its own codec extradata (spec §4.F).
    pub fn needs_synthetic_header(self) -> bool {
        matches!(
            self,
            SubtitleFormat::Cc608
                | SubtitleFormat::ImportSrt
                | SubtitleFormat::Tx3g
                | SubtitleFormat::Utf8
        )
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubtitleFormat::VobSub => "vobsub",
            SubtitleFormat::PgsSub => "pgssub",
            SubtitleFormat::DvbSub => "dvbsub",
            SubtitleFormat::SsaSub => "ssasub",
            SubtitleFormat::ImportSrt => "srt",
            SubtitleFormat::ImportSsa => "ssa",
            SubtitleFormat::Utf8 => "utf8",
            SubtitleFormat::Tx3g => "tx3g",
            SubtitleFormat::Cc608 => "cc608",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_formats_are_exactly_vobsub_pgs_dvb() {
        for fmt in [SubtitleFormat::VobSub, SubtitleFormat::PgsSub, SubtitleFormat::DvbSub] {
            assert!(fmt.is_bitmap());
            assert!(!fmt.is_text());
        }
        for fmt in [
            SubtitleFormat::SsaSub,
            SubtitleFormat::ImportSrt,
            SubtitleFormat::ImportSsa,
            SubtitleFormat::Utf8,
            SubtitleFormat::Tx3g,
            SubtitleFormat::Cc608,
        ] {
            assert!(fmt.is_text());
            assert!(!fmt.is_bitmap());
        }
    }

    #[test]
    fn synthetic_header_formats_match_spec() {
        assert!(SubtitleFormat::Cc608.needs_synthetic_header());
        assert!(SubtitleFormat::ImportSrt.needs_synthetic_header());
        assert!(!SubtitleFormat::SsaSub.needs_synthetic_header());
    }
}
