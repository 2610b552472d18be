//! Caption timing: equal slices of the narration duration.

use std::time::Duration;

/// When one caption unit becomes active, relative to narration start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionSlot {
    pub unit_index: usize,
    pub start: Duration,
}

/// Schedule `unit_count` units over `total`: unit `k` starts at `k * total / n`.
///
/// Returns no slots when there are no units or the duration is zero.
pub fn schedule(unit_count: usize, total: Duration) -> Vec<CaptionSlot> {
    if unit_count == 0 || total.is_zero() {
        return Vec::new();
    }

    (0..unit_count)
        .map(|k| CaptionSlot {
            unit_index: k,
            start: slice_start(total, k, unit_count),
        })
        .collect()
}

fn slice_start(total: Duration, k: usize, n: usize) -> Duration {
    let nanos = total.as_nanos() * k as u128 / n as u128;
    Duration::from_nanos(nanos as u64)
}

/// Unit showing at `elapsed`, or `None` before the first slot and once the
/// narration has run its full length.
pub fn active_unit(slots: &[CaptionSlot], total: Duration, elapsed: Duration) -> Option<usize> {
    if elapsed >= total {
        return None;
    }
    slots
        .iter()
        .rev()
        .find(|slot| slot.start <= elapsed)
        .map(|slot| slot.unit_index)
}
