#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation cues derived by diffing consecutive session snapshots.
//!
//! The engine exposes state only. Hosts that want to flash the screen, play a
//! sound or count penalties feed every observed snapshot into [`Cues`] and
//! react to the [`Cue`] values it emits.

use reflex_rush_core::{LevelNumber, SessionSnapshot};

/// Discrete transition observed between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// A session started or restarted on `level`.
    Started {
        /// Level the session starts on.
        level: LevelNumber,
    },
    /// The button turned red.
    RedOn,
    /// The button turned green again.
    RedOff,
    /// A red press removed progress on the current level.
    Penalized {
        /// Progress that was actually removed.
        amount: u32,
    },
    /// A level was cleared and the next one entered.
    LevelUp {
        /// Level that was cleared.
        from: LevelNumber,
        /// Level now being played.
        to: LevelNumber,
    },
    /// The final level was cleared.
    Won {
        /// Final score of the play-through.
        score: u32,
    },
    /// The clock ran out.
    Over {
        /// Level on which time ran out.
        level: LevelNumber,
        /// Score at the moment time ran out.
        score: u32,
    },
}

impl Cue {
    /// Reports whether the cue ends the play-through.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Won { .. } | Self::Over { .. })
    }
}

/// Pure system that remembers the last snapshot and emits cues for changes.
#[derive(Debug, Default)]
pub struct Cues {
    previous: Option<SessionSnapshot>,
}

impl Cues {
    /// Creates a cue system that has not observed any snapshot yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the remembered snapshot. Call it after resetting the engine
    /// unless the idle snapshot is observed in between, since a reset
    /// restarts session numbering.
    pub fn forget(&mut self) {
        self.previous = None;
    }

    /// Compares `snapshot` with the previously observed one and appends the
    /// resulting cues to `out`. Idle snapshots are ignored.
    pub fn handle(&mut self, snapshot: &SessionSnapshot, out: &mut Vec<Cue>) {
        if is_idle(snapshot) {
            self.previous = None;
            return;
        }

        let current = *snapshot;
        // Every start bumps the session number, even before the clock moved.
        let Some(previous) = self
            .previous
            .replace(current)
            .filter(|previous| previous.session == current.session)
        else {
            out.push(Cue::Started {
                level: current.level,
            });
            if current.is_red {
                out.push(Cue::RedOn);
            }
            return;
        };

        if current.level > previous.level {
            out.push(Cue::LevelUp {
                from: previous.level,
                to: current.level,
            });
        } else if current.progress < previous.progress {
            out.push(Cue::Penalized {
                amount: previous.progress - current.progress,
            });
        }

        match (previous.is_red, current.is_red) {
            (false, true) => out.push(Cue::RedOn),
            (true, false) => out.push(Cue::RedOff),
            _ => {}
        }

        if current.is_won && !previous.is_won {
            out.push(Cue::Won {
                score: current.score,
            });
        }
        if current.is_over && !previous.is_over {
            out.push(Cue::Over {
                level: current.level,
                score: current.score,
            });
        }
    }
}

fn is_idle(snapshot: &SessionSnapshot) -> bool {
    snapshot.time_left.is_zero() && !snapshot.is_finished()
}
