#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Reflex Rush.
//!
//! The [`Engine`] owns exactly one play-through. Hosts drive it with
//! [`Engine::advance`] once per frame and [`Engine::press`] whenever the
//! player presses the button; both operations are total and clamp their
//! inputs. Hosts read the outcome through the [`query`] module and derive any
//! presentation cue by comparing snapshots between calls.

use std::time::Duration;

use reflex_rush_catalog::LevelCatalog;
use reflex_rush_core::{Command, LevelNumber, SessionSnapshot, PROGRESS_PER_PRESS};
use reflex_rush_system_scheduling::{Placement, Scheduler, SeededUnits, UnitSource};
use tracing::{debug, info, trace};

mod red;

use red::RedClock;

/// Largest frame step applied by [`Engine::advance`] unless configured
/// otherwise. Longer stalls of the host are absorbed rather than replayed.
pub const DEFAULT_MAX_FRAME_STEP: Duration = Duration::from_millis(200);

/// Smallest maximum frame step a [`Config`] accepts, so every live
/// [`Engine::advance`] call moves the clock.
pub const MIN_FRAME_STEP: Duration = Duration::from_millis(1);

/// Tunables applied to every session an engine runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    start_level: Option<LevelNumber>,
    max_frame_step: Duration,
    placement: Placement,
    seed: Option<u64>,
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_level: None,
            max_frame_step: DEFAULT_MAX_FRAME_STEP,
            placement: Placement::Slots,
            seed: None,
        }
    }

    /// Starts sessions on `level` instead of level one. Debug aid; the level
    /// is clamped into the catalog when a session starts.
    #[must_use]
    pub const fn with_start_level(mut self, level: Option<LevelNumber>) -> Self {
        self.start_level = level;
        self
    }

    /// Caps the delta time a single [`Engine::advance`] call may apply.
    /// Values below [`MIN_FRAME_STEP`] are raised to it.
    #[must_use]
    pub const fn with_max_frame_step(mut self, max_frame_step: Duration) -> Self {
        self.max_frame_step = if max_frame_step.as_nanos() < MIN_FRAME_STEP.as_nanos() {
            MIN_FRAME_STEP
        } else {
            max_frame_step
        };
        self
    }

    /// Selects how random red onsets are placed.
    #[must_use]
    pub const fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Seeds the engine's random source for reproducible schedules.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Level sessions start on when no explicit level is requested.
    #[must_use]
    pub const fn start_level(&self) -> Option<LevelNumber> {
        self.start_level
    }

    /// Largest delta time applied per frame.
    #[must_use]
    pub const fn max_frame_step(&self) -> Duration {
        self.max_frame_step
    }

    /// Placement strategy for random red onsets.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Seed of the random source, if fixed.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the live session, its level clock and its red schedule.
#[derive(Debug)]
pub struct Engine<S = SeededUnits> {
    catalog: LevelCatalog,
    config: Config,
    scheduler: Scheduler,
    source: S,
    session: SessionSnapshot,
    red: RedClock,
    running: bool,
    sessions: u32,
}

impl Engine<SeededUnits> {
    /// Creates an idle engine whose random source follows `config.seed()`,
    /// falling back to entropy when no seed is configured.
    #[must_use]
    pub fn new(catalog: LevelCatalog, config: Config) -> Self {
        let source = config
            .seed()
            .map_or_else(SeededUnits::from_entropy, SeededUnits::new);
        Self::with_source(catalog, config, source)
    }
}

impl<S: UnitSource> Engine<S> {
    /// Creates an idle engine drawing red onsets from `source`.
    #[must_use]
    pub fn with_source(catalog: LevelCatalog, config: Config, source: S) -> Self {
        Self {
            catalog,
            scheduler: Scheduler::new(config.placement()),
            config,
            source,
            session: SessionSnapshot::idle(),
            red: RedClock::default(),
            running: false,
            sessions: 0,
        }
    }

    /// Discards any previous session and starts a new one.
    ///
    /// Without an explicit level the configured start level applies, then
    /// level one. The chosen level is clamped into the catalog.
    pub fn start(&mut self, level: Option<LevelNumber>) {
        let requested = level
            .or(self.config.start_level())
            .unwrap_or(LevelNumber::FIRST);
        let level = self.catalog.clamp(requested);
        self.sessions = self.sessions.saturating_add(1);
        self.session = SessionSnapshot {
            session: self.sessions,
            ..SessionSnapshot::idle()
        };
        self.enter_level(level);
        self.running = true;
        info!(level = level.get(), session = self.sessions, "session started");
    }

    /// Stops the session and restores idle values, including the session
    /// counter.
    pub fn reset(&mut self) {
        self.running = false;
        self.sessions = 0;
        self.session = SessionSnapshot::idle();
        self.red = RedClock::default();
        debug!("session reset");
    }

    /// Advances the level clock by `dt`, clamped to the configured maximum
    /// frame step, and re-evaluates the red state.
    pub fn advance(&mut self, dt: Duration) {
        if !self.is_live() {
            return;
        }

        let dt = dt.min(self.config.max_frame_step());
        self.session.time_left = self.session.time_left.saturating_sub(dt);

        let descriptor = self.catalog.get(self.session.level);
        let elapsed = descriptor
            .time_limit()
            .saturating_sub(self.session.time_left);
        let was_red = self.session.is_red;
        self.session.is_red = self
            .red
            .evaluate(descriptor.red_strategy(), elapsed, was_red);
        if was_red != self.session.is_red {
            trace!(
                level = self.session.level.get(),
                elapsed_ms = elapsed.as_millis() as u64,
                red = self.session.is_red,
                "button state changed"
            );
        }

        if self.session.time_left.is_zero() {
            self.session.is_over = true;
            info!(
                level = self.session.level.get(),
                progress = self.session.progress,
                score = self.session.score,
                "time ran out"
            );
        }
    }

    /// Presses the button: penalizes progress while red, advances it while
    /// green, and clears the level once the required progress is reached.
    pub fn press(&mut self) {
        if !self.is_live() {
            return;
        }

        let level = self.session.level;
        if self.session.is_red {
            let penalty = level.red_penalty();
            self.session.progress = self.session.progress.saturating_sub(penalty);
            debug!(
                level = level.get(),
                penalty,
                progress = self.session.progress,
                "pressed while red"
            );
            return;
        }

        let required = self.catalog.get(level).required_progress();
        let progress = self
            .session
            .progress
            .saturating_add(PROGRESS_PER_PRESS)
            .min(required);
        self.session.progress = progress;
        if progress < required {
            self.session.successful_presses = self.session.successful_presses.saturating_add(1);
            return;
        }

        self.session.score = self
            .session
            .score
            .saturating_add(level.clear_score(self.session.successful_presses));
        if self.catalog.is_final(level) {
            self.session.is_won = true;
            info!(score = self.session.score, "final level cleared");
            return;
        }

        self.enter_level(level.next());
    }

    fn is_live(&self) -> bool {
        self.running && !self.session.is_finished()
    }

    fn enter_level(&mut self, level: LevelNumber) {
        let descriptor = self.catalog.get(level);
        let schedule = self.scheduler.schedule(descriptor, &mut self.source);
        debug!(
            level = level.get(),
            onsets = schedule.len(),
            score = self.session.score,
            "entering level"
        );

        self.session.level = level;
        self.session.progress = 0;
        self.session.successful_presses = 0;
        self.session.time_left = descriptor.time_limit();
        self.session.is_red = false;
        self.red = RedClock::new(schedule);
    }
}

/// Applies the provided command to the engine.
pub fn apply<S: UnitSource>(engine: &mut Engine<S>, command: Command) {
    match command {
        Command::Start { level } => engine.start(level),
        Command::Reset => engine.reset(),
        Command::Press => engine.press(),
        Command::Tick { dt } => engine.advance(dt),
    }
}

/// Query functions that provide read-only access to the engine state.
pub mod query {
    use std::time::Duration;

    use reflex_rush_catalog::LevelCatalog;
    use reflex_rush_core::{LevelDescriptor, SessionSnapshot};
    use reflex_rush_system_scheduling::RedSchedule;

    use super::{Config, Engine};

    /// Captures the current session values.
    #[must_use]
    pub fn snapshot<S>(engine: &Engine<S>) -> SessionSnapshot {
        engine.session
    }

    /// Descriptor of the level currently being played.
    #[must_use]
    pub fn level_descriptor<S>(engine: &Engine<S>) -> &LevelDescriptor {
        engine.catalog.get(engine.session.level)
    }

    /// Reports whether a session was started and not reset since.
    #[must_use]
    pub fn is_running<S>(engine: &Engine<S>) -> bool {
        engine.running
    }

    /// Elapsed time on the current level clock.
    #[must_use]
    pub fn elapsed<S>(engine: &Engine<S>) -> Duration {
        if !engine.running {
            return Duration::ZERO;
        }
        level_descriptor(engine)
            .time_limit()
            .saturating_sub(engine.session.time_left)
    }

    /// Red onsets resolved for the current level.
    #[must_use]
    pub fn schedule<S>(engine: &Engine<S>) -> &RedSchedule {
        engine.red.schedule()
    }

    /// Catalog the engine plays through.
    #[must_use]
    pub fn catalog<S>(engine: &Engine<S>) -> &LevelCatalog {
        &engine.catalog
    }

    /// Configuration the engine was created with.
    #[must_use]
    pub fn config<S>(engine: &Engine<S>) -> &Config {
        &engine.config
    }
}
