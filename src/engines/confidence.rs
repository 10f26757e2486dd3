//! Confidence reported alongside a move.
//!
//! A fixed blend of the tier's rating, depth hint and time budget, each
//! normalised against the strongest tier in the catalog. It describes how
//! much the tier is trusted, not how good the particular move is.

use crate::levels::level_catalog::{EngineLevel, LevelCatalog};

const RATING_WEIGHT: f64 = 0.5;
const DEPTH_WEIGHT: f64 = 0.3;
const TIME_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceEstimator {
    max_rating: f64,
    max_depth: f64,
    max_time_ms: f64,
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

impl ConfidenceEstimator {
    pub fn from_catalog(catalog: &LevelCatalog) -> Self {
        Self {
            max_rating: f64::from(catalog.max_rating()),
            max_depth: f64::from(catalog.max_depth()),
            max_time_ms: catalog.max_time_budget_ms() as f64,
        }
    }

    pub fn estimate(&self, level: &EngineLevel) -> f64 {
        let score = RATING_WEIGHT * ratio(f64::from(level.rating), self.max_rating)
            + DEPTH_WEIGHT * ratio(f64::from(level.depth), self.max_depth)
            + TIME_WEIGHT * ratio(level.time_budget_ms as f64, self.max_time_ms);
        score.clamp(0.0, 1.0)
    }
}
