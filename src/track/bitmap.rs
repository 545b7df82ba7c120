//! Component D: the bitmap subtitle track (VOBSUB / PGS / DVB).
//!
//! Grounded on `rendersub.c`'s `ApplyVOBSubs`/`vobsub_work` (overlap policy)
//! and `ApplyPGSSubs`/`pgssub_work` (supersession policy), unified behind
//! one `BitmapPolicy` enum per spec §9's redesign note rather than two
//! parallel track implementations.

use crate::frame::OverlayBuffer;

/// VOBSUB permits overlapping subtitles; PGS/DVB is last-wins with no
/// overlap (spec §4.D).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitmapPolicy {
    VobSub,
    PgsDvb,
}

/// One arrived subtitle event, in 90 kHz ticks. `chain` holds any additional
/// overlay buffers that arrived linked to this event (e.g. a forced and a
/// normal picture sharing one timing window) and are composited alongside
/// `overlay` in the same call.
pub struct BitmapEntry {
    pub overlay: OverlayBuffer,
    pub start: i64,
    pub stop: Option<i64>,
    pub chain: Vec<OverlayBuffer>,
}

impl BitmapEntry {
    pub fn is_clear(&self) -> bool {
        self.overlay.width == 0 || self.overlay.height == 0
    }
}

/// The active-list track state (spec §3's "Track state (bitmap)").
pub struct BitmapTrack {
    policy: BitmapPolicy,
    active: Vec<BitmapEntry>,
}

impl BitmapTrack {
    pub fn new(policy: BitmapPolicy) -> Self {
        BitmapTrack { policy, active: Vec::new() }
    }

    /// Appends newly-arrived events, sorted by start time by the caller
    /// (spec §3: "ordered sequence... sorted by start time").
    pub fn ingest(&mut self, entries: impl IntoIterator<Item = BitmapEntry>) {
        self.active.extend(entries);
    }

    /// Returns the overlays that should be composited onto a frame starting
    /// at `frame_start` (90 kHz), applying this track's eviction/supersession
    /// policy first.
    pub fn overlays_for_frame(&mut self, frame_start: i64) -> Vec<&OverlayBuffer> {
        match self.policy {
            BitmapPolicy::VobSub => self.vobsub_overlays(frame_start),
            BitmapPolicy::PgsDvb => self.pgsdvb_overlay(frame_start).into_iter().collect(),
        }
    }

    fn vobsub_overlays(&mut self, frame_start: i64) -> Vec<&OverlayBuffer> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.active.len() {
            let stop = self.active[i].stop;
            let next_start = self.active.get(i + 1).map(|e| e.start);
            let expired = match stop {
                Some(s) => s <= frame_start,
                None => matches!(next_start, Some(ns) if ns <= frame_start),
            };
            if expired {
                self.active.remove(i);
                continue;
            }
            if self.active[i].start <= frame_start {
                out.push(&self.active[i].overlay);
                out.extend(self.active[i].chain.iter());
                i += 1;
            } else {
                break;
            }
        }
        out
    }

    fn pgsdvb_overlay(&mut self, frame_start: i64) -> Option<&OverlayBuffer> {
        let mut newest = None;
        for idx in (0..self.active.len()).rev() {
            if self.active[idx].start <= frame_start {
                newest = Some(idx);
                break;
            }
        }
        if let Some(idx) = newest {
            self.active.drain(0..idx);
        }
        while matches!(self.active.first(), Some(e) if e.is_clear()) {
            self.active.remove(0);
        }
        match self.active.first() {
            Some(e) if e.start <= frame_start => Some(&e.overlay),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChromaSampling;

    fn entry(start: i64, stop: Option<i64>) -> BitmapEntry {
        BitmapEntry {
            overlay: OverlayBuffer::new(4, 4, ChromaSampling::Cs420),
            start,
            stop,
            chain: Vec::new(),
        }
    }

    #[test]
    fn vobsub_overlapping_render_both_then_evict_invariant8() {
        let mut track = BitmapTrack::new(BitmapPolicy::VobSub);
        track.ingest([entry(0, Some(90_000)), entry(45_000, Some(135_000))]);

        let during_overlap = track.overlays_for_frame(60_000);
        assert_eq!(during_overlap.len(), 2);

        track.overlays_for_frame(200_000);
        assert!(track.is_empty());
    }

    #[test]
    fn vobsub_eviction_scenario_s5() {
        let mut track = BitmapTrack::new(BitmapPolicy::VobSub);
        track.ingest([entry(0, Some(90_000)), entry(45_000, Some(135_000))]);
        let visible = track.overlays_for_frame(100_000);
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn pgs_supersession_invariant9() {
        let mut track = BitmapTrack::new(BitmapPolicy::PgsDvb);
        track.ingest([entry(10, None), entry(20, None), entry(30, None)]);
        let visible = track.overlays_for_frame(25);
        assert_eq!(visible.len(), 1);
        assert_eq!(track.active.len(), 2);
        assert_eq!(track.active[0].start, 20);
    }

    #[test]
    fn pgs_drops_leading_clear_entries() {
        let mut track = BitmapTrack::new(BitmapPolicy::PgsDvb);
        let mut clear = entry(5, None);
        clear.overlay = OverlayBuffer::new(0, 0, ChromaSampling::Cs420);
        track.ingest([clear, entry(10, None)]);
        let visible = track.overlays_for_frame(50);
        assert_eq!(visible.len(), 1);
    }
}
