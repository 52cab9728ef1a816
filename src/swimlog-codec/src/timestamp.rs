//! Per-sample timestamps for FIFO windows.
//!
//! The device sends one timestamp per window, marking the *last* sample.
//! Earlier samples are spread back from it linearly, assuming a constant
//! sample rate across the window.

use crate::constants::TICK_PERIOD_US;

/// How consecutive window timestamps relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Wall-clock or uptime milliseconds. A non-increasing step is treated
    /// as unknown and the nominal interval is used instead.
    Monotonic,
    /// Free-running counter that wraps at `modulus`.
    Ticks { modulus: u64 },
}

impl Clock {
    /// Converts a duration in milliseconds into this clock's units.
    pub fn interval_units(self, ms: u64) -> u64 {
        match self {
            Self::Monotonic => ms,
            Self::Ticks { .. } => ms.saturating_mul(1000) / TICK_PERIOD_US,
        }
    }

    /// Folds a timestamp interpolated back past a rollover onto the counter
    /// range.
    pub fn wrap(self, timestamp: i64) -> i64 {
        match self {
            Self::Monotonic => timestamp,
            Self::Ticks { modulus } => match i64::try_from(modulus) {
                Ok(modulus) if modulus > 0 => timestamp.rem_euclid(modulus),
                _ => timestamp,
            },
        }
    }
}

/// Ticks elapsed from `former` to `latter` on a counter wrapping at `modulus`.
pub fn tick_elapsed(former: u64, latter: u64, modulus: u64) -> u64 {
    if former <= latter {
        latter - former
    } else {
        modulus.saturating_sub(former) + latter
    }
}

/// Duration covered by the window ending at `end`.
pub fn window_interval(end: u64, previous_end: Option<u64>, nominal: u64, clock: Clock) -> u64 {
    let Some(previous) = previous_end else {
        return nominal;
    };

    let delta = match clock {
        Clock::Monotonic => end.checked_sub(previous),
        Clock::Ticks { modulus } => Some(tick_elapsed(previous, end, modulus)),
    };

    match delta {
        Some(delta) if delta > 0 => delta,
        _ => nominal,
    }
}

/// Timestamps for the `count` samples of a window ending at `end`.
///
/// Sample `n` gets `end - (count - 1 - n) * interval / count`, rounded to the
/// nearest integer; the last sample lands exactly on `end`.
pub fn assign_timestamps(
    end: u64,
    previous_end: Option<u64>,
    count: usize,
    nominal: u64,
    clock: Clock,
) -> impl ExactSizeIterator<Item = i64> {
    let interval = window_interval(end, previous_end, nominal, clock);
    spread(end as f64, interval as f64, count).map(move |timestamp| clock.wrap(timestamp))
}

pub(crate) fn spread(end: f64, interval: f64, count: usize) -> impl ExactSizeIterator<Item = i64> {
    let step = if count == 0 { 0.0 } else { interval / count as f64 };
    (0..count).map(move |n| {
        let back = (count - 1 - n) as f64;
        (end - back * step).round() as i64
    })
}

/// One-window lookback for a single stream of windows.
#[derive(Debug, Clone)]
pub struct WindowClock {
    nominal: u64,
    clock: Clock,
    previous_end: Option<u64>,
}

impl WindowClock {
    pub fn new(nominal: u64, clock: Clock) -> Self {
        Self {
            nominal,
            clock,
            previous_end: None,
        }
    }

    pub fn previous_end(&self) -> Option<u64> {
        self.previous_end
    }

    /// Interval for the window ending at `end`; remembers `end` for the next call.
    pub fn advance(&mut self, end: u64) -> u64 {
        let interval = window_interval(end, self.previous_end, self.nominal, self.clock);
        self.previous_end = Some(end);
        interval
    }

    pub fn timestamps(&mut self, end: u64, count: usize) -> Vec<i64> {
        let interval = self.advance(end);
        let clock = self.clock;
        spread(end as f64, interval as f64, count)
            .map(|timestamp| clock.wrap(timestamp))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn three_sample_window() {
        let timestamps: Vec<_> =
            assign_timestamps(3000, Some(1500), 3, 1500, Clock::Monotonic).collect();
        assert_eq!(timestamps, vec![2000, 2500, 3000]);
    }

    #[test]
    fn first_window_uses_nominal_interval() {
        let timestamps: Vec<_> =
            assign_timestamps(1500, None, 156, 1500, Clock::Monotonic).collect();
        assert_eq!(timestamps.len(), 156);
        assert_eq!(timestamps[155], 1500);
        // 1500 - 155 * 1500 / 156 = 9.615...
        assert_eq!(timestamps[0], 10);
    }

    #[test]
    fn non_monotonic_falls_back_to_nominal() {
        let timestamps: Vec<_> =
            assign_timestamps(1000, Some(5000), 4, 400, Clock::Monotonic).collect();
        assert_eq!(timestamps, vec![700, 800, 900, 1000]);

        let same: Vec<_> = assign_timestamps(1000, Some(1000), 2, 400, Clock::Monotonic).collect();
        assert_eq!(same, vec![800, 1000]);
    }

    #[test]
    fn tick_rollover() {
        assert_eq!(tick_elapsed(0xFF_FFF0, 0x00_0010, 0x100_0000), 0x20);
        assert_eq!(tick_elapsed(10, 30, 0x100_0000), 20);
        assert_eq!(
            window_interval(0x10, Some(0xFF_FFF0), 1500, Clock::Ticks { modulus: 0x100_0000 }),
            0x20
        );
    }

    #[test]
    fn ticks_before_rollover_stay_in_counter_range() {
        let clock = Clock::Ticks { modulus: 0x100_0000 };
        let timestamps: Vec<_> =
            assign_timestamps(0x10, Some(0xFF_FFF0), 3, 60_000, clock).collect();
        assert_eq!(timestamps, vec![0xFF_FFFB, 5, 16]);

        let mut window_clock = WindowClock::new(60_000, clock);
        window_clock.advance(0xFF_FFF0);
        assert_eq!(window_clock.timestamps(0x10, 3), vec![0xFF_FFFB, 5, 16]);
    }

    #[test]
    fn durations_convert_to_ticks() {
        let ticks = Clock::Ticks { modulus: 0x100_0000 };
        assert_eq!(ticks.interval_units(1500), 60_000);
        assert_eq!(ticks.interval_units(125), 5_000);
        assert_eq!(Clock::Monotonic.interval_units(125), 125);
        assert_eq!(Clock::Monotonic.wrap(-5), -5);
    }

    #[test]
    fn rounds_to_nearest() {
        // interval 10 over 4 samples: 7.5, 10, 12.5, 15 back from 20
        let timestamps: Vec<_> = assign_timestamps(20, Some(10), 4, 0, Clock::Monotonic).collect();
        assert_eq!(timestamps, vec![13, 15, 18, 20]);
    }

    #[test]
    fn empty_window() {
        assert_eq!(assign_timestamps(100, None, 0, 1500, Clock::Monotonic).len(), 0);
    }

    #[test]
    fn window_clock_tracks_previous_end() {
        let mut clock = WindowClock::new(1500, Clock::Monotonic);
        assert_eq!(clock.timestamps(1500, 3), vec![500, 1000, 1500]);
        assert_eq!(clock.previous_end(), Some(1500));
        assert_eq!(clock.timestamps(2100, 3), vec![1700, 1900, 2100]);
    }

    #[test]
    fn monotonic_windows_are_ordered() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let previous: u64 = rng.random_range(0..10_000_000);
            let end = previous + rng.random_range(1..100_000);
            let count = rng.random_range(1..400);
            let timestamps: Vec<_> =
                assign_timestamps(end, Some(previous), count, 1500, Clock::Monotonic).collect();

            assert_eq!(*timestamps.last().unwrap(), end as i64);
            assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
            if count > 1 && end - previous >= count as u64 {
                assert!(timestamps[0] < end as i64);
            }
        }
    }
}
