#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Reflex Rush engine.
//!
//! This crate defines the value types that connect the level catalog, the
//! authoritative engine, and the host-side systems. Hosts submit [`Command`]
//! values (or call the engine operations directly), the engine mutates its
//! single session, and hosts observe the outcome exclusively through
//! [`SessionSnapshot`] values. The engine never emits events: every
//! transition a presentation layer cares about is derivable by comparing two
//! snapshots.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod seconds;

/// Length of a single red window. Scheduled windows always last this long and
/// fixed windows are truncated to it.
pub const RED_WINDOW: Duration = Duration::from_secs(1);

/// Progress gained by a single press while the button is green.
pub const PROGRESS_PER_PRESS: u32 = 2;

/// Base score awarded for clearing any level.
pub const LEVEL_CLEAR_BONUS: u32 = 100;

/// Additional score awarded per level number when a level is cleared.
pub const LEVEL_SCORE_MULTIPLIER: u32 = 10;

/// One-based index of a level within the catalog.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LevelNumber(u32);

impl LevelNumber {
    /// The level every regular play-through starts on.
    pub const FIRST: Self = Self(1);

    /// Creates a new level number. A value of zero is stored verbatim; the
    /// catalog treats it as out of range.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Level that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Progress removed when the player presses while the button is red.
    ///
    /// The penalty grows with the level: 10 for levels 1-2, 12 for 3-4, then
    /// two more per level up to 22 at level 9, and 25 from level 10 on.
    #[must_use]
    pub const fn red_penalty(self) -> u32 {
        match self.0 {
            0..=2 => 10,
            3..=4 => 12,
            5 => 14,
            6 => 16,
            7 => 18,
            8 => 20,
            9 => 22,
            _ => 25,
        }
    }

    /// Score awarded for clearing this level after `successful_presses`
    /// non-completing green presses.
    #[must_use]
    pub const fn clear_score(self, successful_presses: u32) -> u32 {
        LEVEL_CLEAR_BONUS
            .saturating_add(successful_presses)
            .saturating_add(self.0.saturating_mul(LEVEL_SCORE_MULTIPLIER))
    }
}

impl std::fmt::Display for LevelNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic red interval relative to the start of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedWindow {
    #[serde(with = "seconds")]
    start: Duration,
    #[serde(with = "seconds")]
    duration: Duration,
}

impl RedWindow {
    /// Creates a window that opens at `start` and lasts `duration`.
    #[must_use]
    pub const fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Elapsed level time at which the window opens.
    #[must_use]
    pub const fn start(&self) -> Duration {
        self.start
    }

    /// Configured duration of the window before truncation.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Elapsed level time at which the window closes, with the duration
    /// truncated to [`RED_WINDOW`].
    #[must_use]
    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration.min(RED_WINDOW))
    }

    /// Reports whether `elapsed` falls inside the half-open window.
    #[must_use]
    pub fn contains(&self, elapsed: Duration) -> bool {
        elapsed >= self.start && elapsed < self.end()
    }
}

/// Strategy a level uses to decide when the button turns red.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedStrategy {
    /// Red exactly inside the listed windows; an empty list never turns red.
    FixedWindows {
        /// Windows evaluated against the elapsed level time.
        #[serde(default)]
        windows: Vec<RedWindow>,
    },
    /// Red onsets drawn when the level starts, each lasting [`RED_WINDOW`].
    ScheduledRandom {
        /// Number of onsets requested for the level.
        count: u32,
        /// Skews onsets toward the end of the level.
        #[serde(default)]
        bias_toward_end: bool,
    },
    /// Red for one second out of every four, starting at the level start.
    CyclicPredictable,
}

impl RedStrategy {
    /// Convenience constructor for a level without any red state.
    #[must_use]
    pub const fn never() -> Self {
        Self::FixedWindows {
            windows: Vec::new(),
        }
    }
}

/// Immutable configuration for a single level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    level: LevelNumber,
    required_progress: u32,
    #[serde(with = "seconds")]
    time_limit: Duration,
    red_strategy: RedStrategy,
}

impl LevelDescriptor {
    /// Creates a new level descriptor.
    #[must_use]
    pub const fn new(
        level: LevelNumber,
        required_progress: u32,
        time_limit: Duration,
        red_strategy: RedStrategy,
    ) -> Self {
        Self {
            level,
            required_progress,
            time_limit,
            red_strategy,
        }
    }

    /// Number of the level this descriptor configures.
    #[must_use]
    pub const fn level(&self) -> LevelNumber {
        self.level
    }

    /// Progress units needed to clear the level.
    #[must_use]
    pub const fn required_progress(&self) -> u32 {
        self.required_progress
    }

    /// Countdown the player starts the level with.
    #[must_use]
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Strategy that decides when the button turns red.
    #[must_use]
    pub const fn red_strategy(&self) -> &RedStrategy {
        &self.red_strategy
    }
}

/// Read-only snapshot of the live session handed to hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Level currently being played.
    pub level: LevelNumber,
    /// Progress accumulated toward the level's required progress.
    pub progress: u32,
    /// Time remaining on the level clock.
    #[serde(with = "seconds")]
    pub time_left: Duration,
    /// Whether the button is currently in its dangerous state.
    pub is_red: bool,
    /// Score accumulated over the whole play-through.
    pub score: u32,
    /// Green presses on the current level that did not complete it.
    pub successful_presses: u32,
    /// Set once the clock ran out; terminal.
    pub is_over: bool,
    /// Set once the final level was cleared; terminal.
    pub is_won: bool,
    /// Number of sessions started since the engine was created or reset.
    /// Zero while idle; every start, including a restart, bumps it.
    pub session: u32,
}

impl SessionSnapshot {
    /// Snapshot of a session that has not been started yet.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            level: LevelNumber::FIRST,
            progress: 0,
            time_left: Duration::ZERO,
            is_red: false,
            score: 0,
            successful_presses: 0,
            is_over: false,
            is_won: false,
            session: 0,
        }
    }

    /// Reports whether the session reached either terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.is_over || self.is_won
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Commands a host may submit to drive the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Starts a fresh session, optionally at a specific level.
    Start {
        /// Level to start on; the configured default applies when absent.
        #[serde(default)]
        level: Option<LevelNumber>,
    },
    /// Stops the session and restores idle values.
    Reset,
    /// Presses the button.
    Press,
    /// Advances the level clock by the provided delta time.
    Tick {
        /// Duration of real time that elapsed since the previous tick.
        #[serde(with = "seconds")]
        dt: Duration,
    },
}
