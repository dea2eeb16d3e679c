//! Burst-mode detection around the first picture of a group.
//!
//! Cameras in burst mode produce long runs of near-identical frames. Showing
//! each of them for a full slide duration is tedious, so when the selected
//! picture sits inside such a run the whole run is returned and the presenter
//! switches to fast pacing.

use std::ops::Range;

use chrono::TimeDelta;

use crate::picture::Picture;

/// Largest gap between neighbouring pictures of one burst, in seconds.
pub const BURST_GAP_SECS: i64 = 2;

/// A cluster must be strictly longer than this to count as a burst.
pub const BURST_MIN_EXCLUSIVE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Classic slideshow timing.
    Normal,
    /// Fast playback of a burst cluster.
    Burst,
}

/// The pictures chosen for one group and how fast to show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideGroup {
    pub pacing: Pacing,
    pub pictures: Vec<Picture>,
}

impl SlideGroup {
    pub fn is_burst(&self) -> bool {
        self.pacing == Pacing::Burst
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pictures.len()
    }
}

/// Picks the pictures to show from an ordered picture list.
///
/// With `burst_enabled`, the run of pictures around `start` whose neighbours
/// are at most [`BURST_GAP_SECS`] apart is returned as a burst when it holds
/// more than [`BURST_MIN_EXCLUSIVE`] pictures. Every other case yields at most
/// `limit` pictures starting at `start`.
pub fn detect(pictures: &[Picture], start: usize, limit: usize, burst_enabled: bool) -> SlideGroup {
    if burst_enabled && start < pictures.len() {
        let cluster = cluster_around(pictures, start);
        if cluster.len() > BURST_MIN_EXCLUSIVE {
            return SlideGroup {
                pacing: Pacing::Burst,
                pictures: pictures[cluster].to_vec(),
            };
        }
    }
    SlideGroup {
        pacing: Pacing::Normal,
        pictures: window(pictures, start, limit).to_vec(),
    }
}

/// Index range of the burst cluster containing `start`.
///
/// Returns an empty range when `start` is out of bounds.
pub fn cluster_around(pictures: &[Picture], start: usize) -> Range<usize> {
    if start >= pictures.len() {
        return start..start;
    }
    let mut end = start + 1;
    while end < pictures.len() && close_together(&pictures[end - 1], &pictures[end]) {
        end += 1;
    }
    let mut begin = start;
    while begin > 0 && close_together(&pictures[begin - 1], &pictures[begin]) {
        begin -= 1;
    }
    begin..end
}

/// Up to `limit` pictures from `start`, clamped to the list.
pub fn window(pictures: &[Picture], start: usize, limit: usize) -> &[Picture] {
    let begin = start.min(pictures.len());
    let end = begin.saturating_add(limit).min(pictures.len());
    &pictures[begin..end]
}

fn close_together(a: &Picture, b: &Picture) -> bool {
    (b.taken_at - a.taken_at).abs() <= TimeDelta::seconds(BURST_GAP_SECS)
}
