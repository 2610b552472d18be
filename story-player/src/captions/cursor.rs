//! Caption cursor: which unit is showing as narration plays.

use std::time::Duration;
use tokio::time::Instant;

use super::schedule::{CaptionSlot, active_unit, schedule};
use crate::audio::PlayClock;

/// Walks a caption schedule in step with a narration channel.
///
/// The cursor keeps its own clock, started at the narration's position, and
/// is paused and resumed alongside it.
#[derive(Debug, Clone)]
pub struct CaptionCursor {
    slots: Vec<CaptionSlot>,
    total: Duration,
    clock: PlayClock,
    active: Option<usize>,
}

impl CaptionCursor {
    /// Start a cursor `offset` into a narration of length `total`.
    ///
    /// Returns `None` when there is nothing to show: no units, zero duration,
    /// or an offset already at the end.
    pub fn start(
        unit_count: usize,
        total: Duration,
        offset: Duration,
        now: Instant,
    ) -> Option<Self> {
        let slots = schedule(unit_count, total);
        let active = active_unit(&slots, total, offset);
        if active.is_none() {
            return None;
        }

        let mut clock = PlayClock::starting_at(offset);
        clock.run(now);
        Some(Self {
            slots,
            total,
            clock,
            active,
        })
    }

    /// Unit currently showing.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// When the showing unit next changes. `None` while paused or once done.
    pub fn next_deadline(&self) -> Option<Instant> {
        let current = self.active?;
        let boundary = self
            .slots
            .get(current + 1)
            .map_or(self.total, |slot| slot.start);
        self.clock.instant_at(boundary)
    }

    /// Catch up to `now`. Returns true when the showing unit changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let current = active_unit(&self.slots, self.total, self.clock.elapsed(now));
        if current == self.active {
            return false;
        }
        self.active = current;
        true
    }

    pub fn pause(&mut self, now: Instant) {
        self.clock.pause(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.clock.run(now);
    }

    pub fn is_done(&self) -> bool {
        self.active.is_none()
    }
}
