//! Error taxonomy for the advisory engine.
//!
//! A position without legal moves is not an error; it resolves to the
//! [`BestMove::None`](crate::game_state::chess_types::BestMove) sentinel.

use thiserror::Error;

/// Coarse grouping of [`EngineError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad level keys, malformed catalogs, unreadable positions.
    Configuration,
    /// Calls made before the engine reached `Ready`.
    State,
    /// Work ended by `destroy()` or by a newer request.
    Lifecycle,
    /// Failures at the oracle boundary or in the worker.
    Runtime,
}

/// Represents all possible error types the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown engine level '{0}'")]
    UnknownLevel(String),

    #[error("duplicate engine level key '{0}'")]
    DuplicateLevel(String),

    #[error("engine level catalog is empty")]
    EmptyCatalog,

    #[error("invalid position '{encoded}': {reason}")]
    InvalidPosition { encoded: String, reason: String },

    #[error("engine is not ready")]
    EngineNotReady,

    #[error("engine was destroyed")]
    EngineDestroyed,

    #[error("analysis superseded by a newer request")]
    Cancelled,

    #[error("analysis at level '{level}' exceeded its {budget_ms} ms guard")]
    TimedOut { level: String, budget_ms: u64 },

    #[error("illegal or unrecognized move '{0}'")]
    IllegalMove(String),

    #[error("analysis worker failed: {0}")]
    Worker(String),
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::UnknownLevel(_)
            | EngineError::DuplicateLevel(_)
            | EngineError::EmptyCatalog
            | EngineError::InvalidPosition { .. } => ErrorCategory::Configuration,
            EngineError::EngineNotReady => ErrorCategory::State,
            EngineError::EngineDestroyed | EngineError::Cancelled => ErrorCategory::Lifecycle,
            EngineError::TimedOut { .. } | EngineError::IllegalMove(_) | EngineError::Worker(_) => {
                ErrorCategory::Runtime
            }
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(
            EngineError::UnknownLevel("x".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(EngineError::EngineNotReady.category(), ErrorCategory::State);
        assert_eq!(EngineError::EngineDestroyed.category(), ErrorCategory::Lifecycle);
        assert_eq!(EngineError::Cancelled.category(), ErrorCategory::Lifecycle);
        assert_eq!(
            EngineError::Worker("panic".into()).category(),
            ErrorCategory::Runtime
        );
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = EngineError::UnknownLevel("nonexistent-tier".into());
        assert_eq!(err.to_string(), "unknown engine level 'nonexistent-tier'");
    }
}
