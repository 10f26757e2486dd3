//! Runs a tier's strategy chain against one position.

use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::engines::engine_random;
use crate::engines::engine_trait::{Pick, SelectionContext, Selection, Tactic};
use crate::engines::rating_band::RatingBand;
use crate::errors::EngineResult;
use crate::levels::level_catalog::EngineLevel;
use crate::oracle::position_oracle::PositionOracle;
use crate::search::board_scoring::WeightedEvaluation;
use crate::search::tactical_scanner::ScanLimits;

pub struct MoveSelector<'a, O: PositionOracle> {
    oracle: &'a O,
    evaluation: &'a WeightedEvaluation,
    limits: ScanLimits,
}

impl<'a, O: PositionOracle> MoveSelector<'a, O> {
    pub fn new(oracle: &'a O, evaluation: &'a WeightedEvaluation, limits: ScanLimits) -> Self {
        Self {
            oracle,
            evaluation,
            limits,
        }
    }

    /// Picks a move for `level`, or `None` when the side to move has no legal
    /// moves.
    pub fn select(
        &self,
        position: &O::Handle,
        level: &EngineLevel,
        rng: &mut StdRng,
    ) -> EngineResult<Option<Selection>> {
        let band = RatingBand::for_rating(level.rating);
        trace!(level = level.key, band = band.name(), "selecting move");
        self.select_with_chain(position, band.chain(), rng)
    }

    pub fn select_with_chain(
        &self,
        position: &O::Handle,
        chain: &[Tactic],
        rng: &mut StdRng,
    ) -> EngineResult<Option<Selection>> {
        let legal_moves = self.oracle.legal_moves(position);
        if legal_moves.is_empty() {
            return Ok(None);
        }
        let mut ctx = SelectionContext {
            oracle: self.oracle,
            position,
            legal_moves: &legal_moves,
            side_to_move: self.oracle.turn_color(position),
            limits: self.limits,
            evaluation: self.evaluation,
            rng,
        };

        for tactic in chain {
            if let Some(pick) = tactic.try_select(&mut ctx)? {
                debug!(strategy = tactic.name(), mv = %pick.mv.uci(), "strategy hit");
                return Ok(Some(Selection {
                    pick,
                    tactic: *tactic,
                }));
            }
        }

        // Chains end in UniformRandom, but a custom chain may not.
        Ok(engine_random::uniform_random(&mut ctx).map(|pick: Pick| Selection {
            pick,
            tactic: Tactic::UniformRandom,
        }))
    }
}
