#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ordered, immutable catalog of Reflex Rush levels.
//!
//! A [`LevelCatalog`] is never empty and its levels are numbered
//! contiguously from one, so lookups can clamp instead of failing. Catalogs
//! are either the built-in [`LevelCatalog::standard`] progression or loaded
//! from a TOML document, in which case validation happens once at
//! construction time.

use std::time::Duration;

use reflex_rush_core::{LevelDescriptor, LevelNumber, RedStrategy, RedWindow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const STANDARD_TIME_LIMIT: Duration = Duration::from_secs(15);

/// Reasons a catalog may be rejected at construction time.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog did not contain any level.
    #[error("catalog must contain at least one level")]
    Empty,
    /// Level numbers were not contiguous starting at one.
    #[error("expected level {expected} but found level {found}")]
    NonContiguous {
        /// Level number the catalog position requires.
        expected: LevelNumber,
        /// Level number found at that position.
        found: LevelNumber,
    },
    /// A level had a zero time limit.
    #[error("level {level} has a zero time limit")]
    ZeroTimeLimit {
        /// Offending level.
        level: LevelNumber,
    },
    /// A level could be cleared without pressing at all.
    #[error("level {level} requires zero progress")]
    ZeroRequiredProgress {
        /// Offending level.
        level: LevelNumber,
    },
    /// A fixed red window had no duration.
    #[error("red window {index} of level {level} is empty")]
    EmptyWindow {
        /// Offending level.
        level: LevelNumber,
        /// Position of the window within the level's window list.
        index: usize,
    },
    /// The TOML document could not be parsed.
    #[error("could not parse level catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// The catalog could not be rendered as TOML.
    #[error("could not render level catalog: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Ordered sequence of level descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    levels: Vec<LevelDescriptor>,
}

impl LevelCatalog {
    /// Validates and wraps the provided levels.
    pub fn new(levels: Vec<LevelDescriptor>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut expected = LevelNumber::FIRST;
        for descriptor in &levels {
            let level = descriptor.level();
            if level != expected {
                return Err(CatalogError::NonContiguous {
                    expected,
                    found: level,
                });
            }
            if descriptor.time_limit().is_zero() {
                return Err(CatalogError::ZeroTimeLimit { level });
            }
            if descriptor.required_progress() == 0 {
                return Err(CatalogError::ZeroRequiredProgress { level });
            }
            if let RedStrategy::FixedWindows { windows } = descriptor.red_strategy() {
                if let Some(index) = windows.iter().position(|window| window.duration().is_zero())
                {
                    return Err(CatalogError::EmptyWindow { level, index });
                }
            }
            expected = expected.next();
        }

        Ok(Self { levels })
    }

    /// Parses a catalog from a TOML document containing a `[[levels]]` array.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(contents)?;
        Self::new(document.levels)
    }

    /// Renders the catalog in the format accepted by [`Self::from_toml_str`].
    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        let document = CatalogDocument {
            levels: self.levels.clone(),
        };
        Ok(toml::to_string_pretty(&document)?)
    }

    /// The built-in ten level progression.
    ///
    /// Levels 1-4 use hand-placed windows and 5-10 draw one to six random
    /// onsets spread over the whole level.
    #[must_use]
    pub fn standard() -> Self {
        let fixed = |starts: &[u64]| RedStrategy::FixedWindows {
            windows: starts
                .iter()
                .map(|start| RedWindow::new(Duration::from_secs(*start), Duration::from_secs(1)))
                .collect(),
        };
        let scheduled = |count: u32| RedStrategy::ScheduledRandom {
            count,
            bias_toward_end: false,
        };

        let strategies = [
            (100, fixed(&[])),
            (120, fixed(&[6])),
            (140, fixed(&[4, 8])),
            (160, fixed(&[4, 8, 12])),
            (180, scheduled(1)),
            (200, scheduled(2)),
            (220, scheduled(3)),
            (240, scheduled(4)),
            (260, scheduled(5)),
            (300, scheduled(6)),
        ];

        let levels = strategies
            .into_iter()
            .zip(1..)
            .map(|((required_progress, strategy), level)| {
                LevelDescriptor::new(
                    LevelNumber::new(level),
                    required_progress,
                    STANDARD_TIME_LIMIT,
                    strategy,
                )
            })
            .collect();

        Self { levels }
    }

    /// Returns the descriptor for `level`, or the last descriptor when the
    /// number is out of range.
    #[must_use]
    pub fn get(&self, level: LevelNumber) -> &LevelDescriptor {
        let index = usize::try_from(level.get())
            .ok()
            .and_then(|number| number.checked_sub(1))
            .filter(|index| *index < self.levels.len())
            .unwrap_or(self.levels.len() - 1);
        &self.levels[index]
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn count(&self) -> usize {
        self.levels.len()
    }

    /// Level whose completion wins the game.
    #[must_use]
    pub fn final_level(&self) -> LevelNumber {
        self.levels[self.levels.len() - 1].level()
    }

    /// Reports whether `level` is the final level.
    #[must_use]
    pub fn is_final(&self, level: LevelNumber) -> bool {
        level >= self.final_level()
    }

    /// Clamps `level` into the playable range `[1, final_level]`.
    #[must_use]
    pub fn clamp(&self, level: LevelNumber) -> LevelNumber {
        level.clamp(LevelNumber::FIRST, self.final_level())
    }

    /// Iterator over the descriptors in level order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.levels.iter()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
