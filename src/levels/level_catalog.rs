//! Skill tiers the engine can play at.
//!
//! | Key                | Rating | Depth hint | Time/move |
//! |--------------------|--------|------------|-----------|
//! | `beginner`         | 600    | 1          | 100 ms    |
//! | `novice`           | 800    | 1          | 150 ms    |
//! | `casual`           | 1000   | 2          | 200 ms    |
//! | `intermediate`     | 1200   | 3          | 300 ms    |
//! | `club`             | 1400   | 4          | 400 ms    |
//! | `advanced`         | 1600   | 6          | 600 ms    |
//! | `expert`           | 1800   | 8          | 800 ms    |
//! | `candidate-master` | 2000   | 10         | 1000 ms   |
//! | `master`           | 2200   | 12         | 1500 ms   |
//! | `grandmaster`      | 2500   | 15         | 2000 ms   |
//!
//! The rating decides which strategy chain plays (see
//! [`RatingBand`](crate::engines::rating_band::RatingBand)); depth and time
//! feed the confidence estimate and the simulated think time.

use std::collections::HashSet;

use crate::errors::{EngineError, EngineResult};

/// Returned by [`LevelCatalog::describe`] for keys that are not registered.
pub const LEVEL_NOT_FOUND: &str = "Level not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLevel {
    pub key: &'static str,
    pub name: &'static str,
    pub rating: u32,
    /// 0..=20 skill knob, carried for front ends that expose it.
    pub skill: u8,
    pub depth: u8,
    pub time_budget_ms: u64,
    pub threads: u8,
    pub hash_mb: u16,
    pub limit_strength: bool,
}

impl EngineLevel {
    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            key: self.key,
            name: self.name,
            rating: self.rating,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} ({}): rating {}, depth {}, {} ms per move, skill {}",
            self.name, self.key, self.rating, self.depth, self.time_budget_ms, self.skill
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    pub key: &'static str,
    pub name: &'static str,
    pub rating: u32,
}

const fn level(
    key: &'static str,
    name: &'static str,
    rating: u32,
    skill: u8,
    depth: u8,
    time_budget_ms: u64,
    hash_mb: u16,
) -> EngineLevel {
    EngineLevel {
        key,
        name,
        rating,
        skill,
        depth,
        time_budget_ms,
        threads: 1,
        hash_mb,
        limit_strength: rating < 2400,
    }
}

pub const STANDARD_LEVELS: &[EngineLevel] = &[
    level("beginner", "Beginner", 600, 0, 1, 100, 16),
    level("novice", "Novice", 800, 2, 1, 150, 16),
    level("casual", "Casual", 1000, 5, 2, 200, 16),
    level("intermediate", "Intermediate", 1200, 8, 3, 300, 32),
    level("club", "Club Player", 1400, 10, 4, 400, 32),
    level("advanced", "Advanced", 1600, 13, 6, 600, 64),
    level("expert", "Expert", 1800, 15, 8, 800, 64),
    level("candidate-master", "Candidate Master", 2000, 17, 10, 1000, 128),
    level("master", "Master", 2200, 19, 12, 1500, 128),
    level("grandmaster", "Grandmaster", 2500, 20, 15, 2000, 256),
];

/// Immutable registry of tiers, in registration order.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<EngineLevel>,
}

impl LevelCatalog {
    pub fn standard() -> Self {
        Self {
            levels: STANDARD_LEVELS.to_vec(),
        }
    }

    pub fn new(levels: Vec<EngineLevel>) -> EngineResult<Self> {
        if levels.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if !seen.insert(level.key) {
                return Err(EngineError::DuplicateLevel(level.key.to_owned()));
            }
        }
        Ok(Self { levels })
    }

    pub fn get(&self, key: &str) -> EngineResult<&EngineLevel> {
        self.levels
            .iter()
            .find(|level| level.key == key)
            .ok_or_else(|| EngineError::UnknownLevel(key.to_owned()))
    }

    pub fn list_all(&self) -> Vec<LevelSummary> {
        self.levels.iter().map(EngineLevel::summary).collect()
    }

    pub fn levels(&self) -> &[EngineLevel] {
        &self.levels
    }

    pub fn describe(&self, key: &str) -> String {
        self.get(key)
            .map(EngineLevel::describe)
            .unwrap_or_else(|_| LEVEL_NOT_FOUND.to_owned())
    }

    /// 1-based position in registration order, as used by numeric skill
    /// options.
    pub fn nth(&self, ordinal: usize) -> Option<&EngineLevel> {
        ordinal.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    pub fn max_rating(&self) -> u32 {
        self.levels.iter().map(|l| l.rating).max().unwrap_or(0)
    }

    pub fn max_depth(&self) -> u8 {
        self.levels.iter().map(|l| l.depth).max().unwrap_or(0)
    }

    pub fn max_time_budget_ms(&self) -> u64 {
        self.levels.iter().map(|l| l.time_budget_ms).max().unwrap_or(0)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
