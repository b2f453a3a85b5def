#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulated player that decides, frame by frame, whether to press the button.
//!
//! The autopilot presses at a steady cadence while the button is green. Once
//! the button turns red it keeps pressing until its reaction delay has passed,
//! then holds off, except for the occasional mistake drawn from its seeded
//! generator.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reflex_rush_core::SessionSnapshot;

/// Cadence used when no explicit rate is configured.
pub const DEFAULT_PRESSES_PER_SECOND: f64 = 8.0;

/// Reaction delay used when none is configured.
pub const DEFAULT_REACTION_DELAY: Duration = Duration::from_millis(250);

/// Configuration parameters required to construct the autopilot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    presses_per_second: f64,
    reaction_delay: Duration,
    mistake_rate: f64,
    seed: u64,
}

impl Config {
    /// Creates a configuration with the default cadence, reaction delay and no
    /// mistakes.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            presses_per_second: DEFAULT_PRESSES_PER_SECOND,
            reaction_delay: DEFAULT_REACTION_DELAY,
            mistake_rate: 0.0,
            seed,
        }
    }

    /// Sets how many presses per second the autopilot attempts. Non-positive
    /// or non-finite rates never press.
    #[must_use]
    pub const fn with_presses_per_second(mut self, presses_per_second: f64) -> Self {
        self.presses_per_second = presses_per_second;
        self
    }

    /// Sets how long red has to be visible before the autopilot notices it.
    #[must_use]
    pub const fn with_reaction_delay(mut self, reaction_delay: Duration) -> Self {
        self.reaction_delay = reaction_delay;
        self
    }

    /// Sets the probability of pressing on a noticed red frame. Clamped into
    /// `[0, 1]`; NaN counts as zero.
    #[must_use]
    pub fn with_mistake_rate(mut self, mistake_rate: f64) -> Self {
        self.mistake_rate = if mistake_rate.is_nan() {
            0.0
        } else {
            mistake_rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Attempted presses per second.
    #[must_use]
    pub const fn presses_per_second(&self) -> f64 {
        self.presses_per_second
    }

    /// Delay before a red button is noticed.
    #[must_use]
    pub const fn reaction_delay(&self) -> Duration {
        self.reaction_delay
    }

    /// Probability of pressing on a noticed red frame.
    #[must_use]
    pub const fn mistake_rate(&self) -> f64 {
        self.mistake_rate
    }

    /// Seed of the mistake generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

/// Frame-driven press decisions for a simulated player.
#[derive(Debug)]
pub struct Autopilot {
    press_interval: Option<Duration>,
    reaction_delay: Duration,
    mistake_rate: f64,
    rng: ChaCha8Rng,
    accumulator: Duration,
    red_for: Option<Duration>,
}

impl Autopilot {
    /// Creates an autopilot from the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let press_interval = if config.presses_per_second > 0.0 {
            Duration::try_from_secs_f64(config.presses_per_second.recip()).ok()
        } else {
            None
        };
        Self {
            press_interval,
            reaction_delay: config.reaction_delay,
            mistake_rate: config.mistake_rate,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            accumulator: Duration::ZERO,
            red_for: None,
        }
    }

    /// Decides whether to press after a frame of `dt` ended in `snapshot`.
    pub fn decide(&mut self, snapshot: &SessionSnapshot, dt: Duration) -> bool {
        if snapshot.is_finished() {
            self.accumulator = Duration::ZERO;
            self.red_for = None;
            return false;
        }

        self.red_for = if snapshot.is_red {
            Some(self.red_for.map_or(Duration::ZERO, |seen| seen.saturating_add(dt)))
        } else {
            None
        };

        let Some(interval) = self.press_interval else {
            return false;
        };
        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < interval {
            return false;
        }
        self.accumulator = (self.accumulator - interval).min(interval);

        match self.red_for {
            Some(seen) if seen >= self.reaction_delay => self.rng.gen_bool(self.mistake_rate),
            _ => true,
        }
    }
}
