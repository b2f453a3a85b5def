use std::time::Duration;

use reflex_rush_core::{RedStrategy, RED_WINDOW};
use reflex_rush_system_scheduling::RedSchedule;

/// Period of the [`RedStrategy::CyclicPredictable`] pattern.
pub(crate) const CYCLE_PERIOD: Duration = Duration::from_secs(4);

/// Red/green state machine for the level being played.
#[derive(Clone, Debug, Default)]
pub(crate) struct RedClock {
    schedule: RedSchedule,
    red_until: Option<Duration>,
}

impl RedClock {
    pub(crate) fn new(schedule: RedSchedule) -> Self {
        Self {
            schedule,
            red_until: None,
        }
    }

    pub(crate) fn schedule(&self) -> &RedSchedule {
        &self.schedule
    }

    /// Decides whether the button is red at `elapsed` level time.
    pub(crate) fn evaluate(
        &mut self,
        strategy: &RedStrategy,
        elapsed: Duration,
        currently_red: bool,
    ) -> bool {
        let mut red = currently_red;
        if red && self.red_until.map_or(true, |until| elapsed >= until) {
            red = false;
            self.red_until = None;
        }

        match strategy {
            RedStrategy::FixedWindows { windows } => {
                windows.iter().any(|window| window.contains(elapsed))
            }
            RedStrategy::ScheduledRandom { .. } => {
                if !red && self.schedule.fire_due(elapsed).is_some() {
                    red = true;
                    self.red_until = Some(elapsed.saturating_add(RED_WINDOW));
                }
                red
            }
            RedStrategy::CyclicPredictable => {
                let phase = elapsed.as_nanos() % CYCLE_PERIOD.as_nanos();
                phase < RED_WINDOW.as_nanos()
            }
        }
    }
}
