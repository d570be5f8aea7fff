use embassy_time::{Duration, Instant};

/// Fixed-interval tick measured against a monotonic clock.
///
/// The first tick fires one interval after boot. A tick resets the
/// reference point to the instant it was observed at.
pub struct Ticker {
    interval: Duration,
    last: Instant,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::from_ticks(0),
        }
    }

    /// Returns `true` at most once per interval.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_every_interval_multiple() {
        let mut ticker = Ticker::new(Duration::from_millis(3000));
        let mut fired = Vec::new();

        for ms in (0..=15_000).step_by(10) {
            if ticker.poll(Instant::from_millis(ms)) {
                fired.push(ms);
            }
        }

        assert_eq!(fired, vec![3000, 6000, 9000, 12_000, 15_000]);
    }

    #[test]
    fn never_fires_twice_within_an_interval() {
        let mut ticker = Ticker::new(Duration::from_millis(3000));

        assert!(ticker.poll(Instant::from_millis(3000)));
        assert!(!ticker.poll(Instant::from_millis(3000)));
        assert!(!ticker.poll(Instant::from_millis(5999)));
        assert!(ticker.poll(Instant::from_millis(6000)));
    }

    #[test]
    fn late_poll_fires_once_and_rebases() {
        let mut ticker = Ticker::new(Duration::from_millis(3000));

        // A stall of several intervals yields a single tick
        assert!(ticker.poll(Instant::from_millis(10_000)));
        assert!(!ticker.poll(Instant::from_millis(12_000)));
        assert!(ticker.poll(Instant::from_millis(13_000)));
    }

    #[test]
    fn nothing_fires_before_first_interval() {
        let mut ticker = Ticker::new(Duration::from_millis(3000));
        assert!(!ticker.poll(Instant::from_millis(0)));
        assert!(!ticker.poll(Instant::from_millis(2999)));
    }
}
