#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that aggregates play statistics from cues.

use reflex_rush_core::LevelNumber;
use reflex_rush_system_cues::Cue;
use serde::{Deserialize, Serialize};

/// Aggregated statistics over every play-through observed by [`Analytics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    /// Sum of the final scores of finished play-throughs.
    pub total_score: u32,
    /// Levels cleared, counting the final level of a win.
    pub levels_completed: u32,
    /// Presses submitted to the engine, red or green.
    pub total_presses: u32,
    /// Red presses that removed progress.
    pub penalties: u32,
    /// Highest level reached, if any session was observed.
    pub best_level: Option<LevelNumber>,
    /// Play-throughs started.
    pub sessions: u32,
}

/// Pure analytics system folding cues into [`GameStats`].
#[derive(Debug, Default)]
pub struct Analytics {
    stats: GameStats,
}

impl Analytics {
    /// Creates a new analytics system with zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics gathered so far.
    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Counts a press forwarded to the engine. Presses are not observable in
    /// snapshots, so hosts report them directly.
    pub fn record_press(&mut self) {
        self.stats.total_presses = self.stats.total_presses.saturating_add(1);
    }

    /// Consumes cues emitted by the cue system.
    pub fn handle(&mut self, cues: &[Cue]) {
        for cue in cues {
            match *cue {
                Cue::Started { level } => {
                    self.stats.sessions = self.stats.sessions.saturating_add(1);
                    self.reach(level);
                }
                Cue::Penalized { .. } => {
                    self.stats.penalties = self.stats.penalties.saturating_add(1);
                }
                Cue::LevelUp { to, .. } => {
                    self.complete_level();
                    self.reach(to);
                }
                Cue::Won { score } => {
                    self.complete_level();
                    self.finish(score);
                }
                Cue::Over { level, score } => {
                    self.reach(level);
                    self.finish(score);
                }
                Cue::RedOn | Cue::RedOff => {}
            }
        }
    }

    fn reach(&mut self, level: LevelNumber) {
        self.stats.best_level = Some(
            self.stats
                .best_level
                .map_or(level, |best| best.max(level)),
        );
    }

    fn complete_level(&mut self) {
        self.stats.levels_completed = self.stats.levels_completed.saturating_add(1);
    }

    fn finish(&mut self, score: u32) {
        self.stats.total_score = self.stats.total_score.saturating_add(score);
    }
}
