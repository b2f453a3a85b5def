#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Red-onset scheduling for levels that draw their red windows at random.
//!
//! The scheduler turns a level descriptor and a source of unit samples into a
//! [`RedSchedule`]: a sorted list of onsets that all leave room for a full
//! [`RED_WINDOW`] before the clock runs out and that are separated by at least
//! the level's minimum gap. Scheduling never fails; when the constraints leave
//! no room for every requested onset, fewer onsets are produced.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reflex_rush_core::{LevelDescriptor, LevelNumber, RedStrategy, RED_WINDOW};

/// Upper bound on the onsets a single level may request.
pub const MAX_SCHEDULED_ONSETS: u32 = 30;

/// Attempt budget used by [`Placement::Rejection`] unless configured otherwise.
pub const DEFAULT_REJECTION_ATTEMPTS: u32 = 2_000;

const WIDE_GAP: Duration = Duration::from_millis(1_050);
const NARROW_GAP: Duration = Duration::from_millis(500);
const NARROW_GAP_FROM_LEVEL: u32 = 5;

/// Source of uniform samples in `[0, 1)`.
pub trait UnitSource {
    /// Draws the next sample.
    fn next_unit(&mut self) -> f64;
}

/// Unit source backed by a seeded ChaCha generator.
#[derive(Clone, Debug)]
pub struct SeededUnits {
    rng: ChaCha8Rng,
}

impl SeededUnits {
    /// Creates a reproducible source from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a source seeded from the thread-local generator.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl UnitSource for SeededUnits {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Unit source that replays a fixed list of samples, cycling when exhausted.
///
/// An empty list yields zeros.
#[derive(Clone, Debug, Default)]
pub struct ScriptedUnits {
    samples: Vec<f64>,
    cursor: usize,
}

impl ScriptedUnits {
    /// Creates a source that replays `samples` in order.
    #[must_use]
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0 }
    }
}

impl UnitSource for ScriptedUnits {
    fn next_unit(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor = (self.cursor + 1) % self.samples.len();
        sample
    }
}

/// How candidate onsets are resolved against the minimum gap constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    /// Evenly spaced slots, each shifted by a sorted share of the slack.
    /// Always produces the space-limited onset count.
    #[default]
    Slots,
    /// Uniform candidates accepted only when far enough from every accepted
    /// onset. May produce fewer onsets once the budget is spent.
    Rejection {
        /// Number of candidates drawn before giving up.
        max_attempts: u32,
    },
}

/// Minimum distance between two scheduled onsets on `level`.
#[must_use]
pub const fn minimum_gap(level: LevelNumber) -> Duration {
    if level.get() >= NARROW_GAP_FROM_LEVEL {
        NARROW_GAP
    } else {
        WIDE_GAP
    }
}

/// A scheduled red onset and whether it already turned the button red.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledOnset {
    at: Duration,
    fired: bool,
}

impl ScheduledOnset {
    /// Elapsed level time at which the onset opens its window.
    #[must_use]
    pub const fn at(&self) -> Duration {
        self.at
    }

    /// Whether the onset was already consumed.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        self.fired
    }

    fn is_due(&self, elapsed: Duration) -> bool {
        !self.fired && elapsed >= self.at && elapsed < self.at.saturating_add(RED_WINDOW)
    }
}

/// Resolved onsets for the level being played.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RedSchedule {
    onsets: Vec<ScheduledOnset>,
}

impl RedSchedule {
    /// Schedule without any onset.
    #[must_use]
    pub const fn empty() -> Self {
        Self { onsets: Vec::new() }
    }

    /// Onsets in ascending order.
    #[must_use]
    pub fn onsets(&self) -> &[ScheduledOnset] {
        &self.onsets
    }

    /// Number of onsets in the schedule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    /// Reports whether the schedule has no onset at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    /// Marks the earliest un-fired onset whose window contains `elapsed` as
    /// fired and returns its time.
    pub fn fire_due(&mut self, elapsed: Duration) -> Option<Duration> {
        let onset = self.onsets.iter_mut().find(|onset| onset.is_due(elapsed))?;
        onset.fired = true;
        Some(onset.at)
    }
}

/// Pure system that resolves red schedules for levels.
#[derive(Debug, Default)]
pub struct Scheduler {
    placement: Placement,
    jitter_workspace: Vec<f64>,
}

impl Scheduler {
    /// Creates a scheduler that resolves onsets with `placement`.
    #[must_use]
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            jitter_workspace: Vec::new(),
        }
    }

    /// Placement strategy in use.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Resolves the schedule for `descriptor`. Levels that do not draw
    /// random onsets get an empty schedule and consume no samples.
    pub fn schedule<S>(&mut self, descriptor: &LevelDescriptor, source: &mut S) -> RedSchedule
    where
        S: UnitSource + ?Sized,
    {
        let RedStrategy::ScheduledRandom {
            count,
            bias_toward_end,
        } = descriptor.red_strategy()
        else {
            return RedSchedule::empty();
        };

        self.schedule_onsets(
            *count,
            *bias_toward_end,
            descriptor.time_limit(),
            minimum_gap(descriptor.level()),
            source,
        )
    }

    /// Resolves `count` onsets inside `time_limit` separated by `gap`.
    pub fn schedule_onsets<S>(
        &mut self,
        count: u32,
        bias_toward_end: bool,
        time_limit: Duration,
        gap: Duration,
        source: &mut S,
    ) -> RedSchedule
    where
        S: UnitSource + ?Sized,
    {
        let max_start = nanos(time_limit.saturating_sub(RED_WINDOW));
        let count = count.min(MAX_SCHEDULED_ONSETS);
        if count == 0 || max_start == 0 {
            return RedSchedule::empty();
        }

        let gap = nanos(gap).max(1);
        let count_by_space = (max_start / gap).saturating_add(1);
        let final_count = u64::from(count).min(count_by_space.max(1)) as usize;

        let times = match self.placement {
            Placement::Slots => {
                self.place_in_slots(final_count, bias_toward_end, max_start, gap, source)
            }
            Placement::Rejection { max_attempts } => place_by_rejection(
                final_count,
                bias_toward_end,
                max_start,
                gap,
                max_attempts,
                source,
            ),
        };

        RedSchedule {
            onsets: times
                .into_iter()
                .map(|at| ScheduledOnset {
                    at: Duration::from_nanos(at),
                    fired: false,
                })
                .collect(),
        }
    }

    fn place_in_slots<S>(
        &mut self,
        count: usize,
        bias_toward_end: bool,
        max_start: u64,
        gap: u64,
        source: &mut S,
    ) -> Vec<u64>
    where
        S: UnitSource + ?Sized,
    {
        self.jitter_workspace.clear();
        for _ in 0..count {
            let jitter = shape_sample(source.next_unit(), bias_toward_end);
            self.jitter_workspace.push(jitter);
        }
        self.jitter_workspace.sort_by(f64::total_cmp);

        let reserved = gap.saturating_mul(count.saturating_sub(1) as u64);
        let slack = max_start.saturating_sub(reserved);

        self.jitter_workspace
            .iter()
            .enumerate()
            .map(|(slot, jitter)| {
                let base = gap.saturating_mul(slot as u64);
                base.saturating_add(scale(slack, *jitter)).min(max_start)
            })
            .collect()
    }
}

fn place_by_rejection<S>(
    count: usize,
    bias_toward_end: bool,
    max_start: u64,
    gap: u64,
    max_attempts: u32,
    source: &mut S,
) -> Vec<u64>
where
    S: UnitSource + ?Sized,
{
    let mut accepted: Vec<u64> = Vec::with_capacity(count);
    let mut attempts = 0;
    while accepted.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = scale(max_start, shape_sample(source.next_unit(), bias_toward_end));
        if accepted
            .iter()
            .all(|existing| existing.abs_diff(candidate) >= gap)
        {
            accepted.push(candidate);
        }
    }
    accepted.sort_unstable();
    accepted
}

fn shape_sample(sample: f64, bias_toward_end: bool) -> f64 {
    let unit = if sample.is_finite() {
        sample.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if bias_toward_end {
        0.5 + 0.5 * unit * unit
    } else {
        unit
    }
}

fn scale(span: u64, unit: f64) -> u64 {
    ((span as f64) * unit).floor().max(0.0).min(span as f64) as u64
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
