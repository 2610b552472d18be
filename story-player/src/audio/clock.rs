//! Pausable playback position.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks how far a channel has played, across pauses.
#[derive(Debug, Clone, Default)]
pub struct PlayClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl PlayClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stopped clock positioned at `offset`.
    pub fn starting_at(offset: Duration) -> Self {
        Self {
            accumulated: offset,
            running_since: None,
        }
    }

    /// Start counting from `now`. No-op while already running.
    pub fn run(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Freeze the position at `now`.
    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    /// Back to zero, stopped.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Running, or paused partway through.
    pub fn has_started(&self) -> bool {
        self.is_running() || !self.accumulated.is_zero()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    /// Instant at which the position reaches `position`. `None` while stopped.
    pub fn instant_at(&self, position: Duration) -> Option<Instant> {
        let since = self.running_since?;
        Some(since + position.saturating_sub(self.accumulated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_across_pause() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        assert!(!clock.has_started());

        clock.run(t0);
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(1)), Duration::from_secs(1));

        clock.pause(t0 + Duration::from_secs(1));
        assert!(!clock.is_running());
        assert!(clock.has_started());
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(10)), Duration::from_secs(1));

        clock.run(t0 + Duration::from_secs(10));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(12)), Duration::from_secs(3));
    }

    #[test]
    fn test_run_twice_keeps_origin() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.run(t0);
        clock.run(t0 + Duration::from_secs(5));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(6)), Duration::from_secs(6));
    }

    #[test]
    fn test_instant_at() {
        let t0 = Instant::now();
        let mut clock = PlayClock::starting_at(Duration::from_secs(1));
        assert_eq!(clock.instant_at(Duration::from_secs(4)), None);

        clock.run(t0);
        assert_eq!(
            clock.instant_at(Duration::from_secs(4)),
            Some(t0 + Duration::from_secs(3))
        );
        // Positions already passed resolve to the resume instant
        assert_eq!(clock.instant_at(Duration::ZERO), Some(t0));
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut clock = PlayClock::new();
        clock.run(t0);
        clock.pause(t0 + Duration::from_secs(2));
        clock.reset();
        assert!(!clock.has_started());
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(3)), Duration::ZERO);
    }
}
