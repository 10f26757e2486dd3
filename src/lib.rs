//! Crate root module declarations for the Blindfold Engine project.
//!
//! A rating-targeted chess move advisor: a catalog of skill levels, the
//! per-band strategy chains that pick moves at those levels over a pluggable
//! rules oracle, an async engine handle with single-flight requests, and a
//! UCI front end.

pub mod errors;

pub mod game_state {
    pub mod chess_types;
}

pub mod oracle {
    pub mod position_oracle;
    pub mod shakmaty_oracle;
}

pub mod levels {
    pub mod level_catalog;
}

pub mod search {
    pub mod board_scoring;
    pub mod tactical_scanner;
}

pub mod engines {
    pub mod confidence;
    pub mod engine_facade;
    pub mod engine_greedy;
    pub mod engine_positional;
    pub mod engine_random;
    pub mod engine_trait;
    pub mod move_selector;
    pub mod rating_band;
    #[cfg(test)]
    pub mod test_support;
    pub mod time_management;
}

pub mod uci {
    pub mod uci_top;
}

pub use engines::engine_facade::{BlindfoldEngine, EngineConfig, EngineState};
pub use engines::engine_trait::MoveResult;
pub use errors::{EngineError, EngineResult, ErrorCategory};
pub use game_state::chess_types::BestMove;
pub use levels::level_catalog::{EngineLevel, LevelCatalog, LevelSummary};
pub use oracle::position_oracle::PositionOracle;
pub use oracle::shakmaty_oracle::ShakmatyOracle;
