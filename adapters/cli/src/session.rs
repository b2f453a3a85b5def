use std::{
    thread,
    time::{Duration, Instant},
};

use reflex_rush_catalog::LevelCatalog;
use reflex_rush_core::{LevelNumber, SessionSnapshot};
use reflex_rush_engine::{query, Config as EngineConfig, Engine};
use reflex_rush_system_analytics::{Analytics, GameStats};
use reflex_rush_system_autopilot::{Autopilot, Config as AutopilotConfig};
use reflex_rush_system_cues::{Cue, Cues};
use serde::Serialize;
use tracing::{debug, info};

/// How frame deltas are produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pacing {
    /// Every frame advances the engine by exactly this step, as fast as possible.
    Fixed(Duration),
    /// Frames are paced by the wall clock at roughly this step.
    Realtime(Duration),
}

/// Final result of a simulated play-through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Summary {
    pub(crate) outcome: Outcome,
    pub(crate) seed: u64,
    pub(crate) level: LevelNumber,
    pub(crate) score: u32,
    pub(crate) frames: u64,
    pub(crate) stats: GameStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    Won,
    TimeUp,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Won => f.write_str("won"),
            Self::TimeUp => f.write_str("time up"),
        }
    }
}

/// Host loop wiring the engine to the autopilot, cue and analytics systems.
#[derive(Debug)]
pub(crate) struct Simulation {
    engine: Engine,
    autopilot: Autopilot,
    cues: Cues,
    analytics: Analytics,
    pending: Vec<Cue>,
}

impl Simulation {
    pub(crate) fn new(
        catalog: LevelCatalog,
        engine_config: EngineConfig,
        autopilot_config: AutopilotConfig,
    ) -> Self {
        Self {
            engine: Engine::new(catalog, engine_config),
            autopilot: Autopilot::new(autopilot_config),
            cues: Cues::new(),
            analytics: Analytics::new(),
            pending: Vec::new(),
        }
    }

    /// Plays one session to its end and summarizes it.
    pub(crate) fn run(mut self, pacing: Pacing) -> Summary {
        self.engine.start(None);
        self.observe();

        let mut frames = 0_u64;
        let mut last_frame = Instant::now();
        while !query::snapshot(&self.engine).is_finished() {
            let dt = match pacing {
                Pacing::Fixed(step) => step,
                Pacing::Realtime(step) => {
                    thread::sleep(step.saturating_sub(last_frame.elapsed()));
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame);
                    last_frame = now;
                    dt
                }
            };
            self.step(dt);
            frames = frames.saturating_add(1);
        }

        let snapshot = query::snapshot(&self.engine);
        let summary = Summary {
            outcome: if snapshot.is_won {
                Outcome::Won
            } else {
                Outcome::TimeUp
            },
            seed: query::config(&self.engine).seed().unwrap_or_default(),
            level: snapshot.level,
            score: snapshot.score,
            frames,
            stats: *self.analytics.stats(),
        };
        info!(
            outcome = %summary.outcome,
            level = summary.level.get(),
            score = summary.score,
            frames,
            "play-through finished"
        );
        summary
    }

    fn step(&mut self, dt: Duration) {
        self.engine.advance(dt);
        self.observe();

        let snapshot = query::snapshot(&self.engine);
        if self.autopilot.decide(&snapshot, dt) {
            self.engine.press();
            self.analytics.record_press();
            self.observe();
        }
    }

    fn observe(&mut self) {
        let snapshot: SessionSnapshot = query::snapshot(&self.engine);
        self.cues.handle(&snapshot, &mut self.pending);
        for cue in &self.pending {
            debug!(?cue, time_left_ms = snapshot.time_left.as_millis() as u64, "cue");
        }
        self.analytics.handle(&self.pending);
        self.pending.clear();
    }
}
