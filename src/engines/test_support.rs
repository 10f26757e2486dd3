use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::Chess;

use crate::engines::engine_trait::SelectionContext;
use crate::oracle::position_oracle::{CandidateMove, PositionOracle};
use crate::oracle::shakmaty_oracle::ShakmatyOracle;
use crate::search::board_scoring::WeightedEvaluation;
use crate::search::tactical_scanner::ScanLimits;

/// A loaded position plus everything a tactic needs, with a fixed seed.
pub struct Fixture {
    pub oracle: ShakmatyOracle,
    pub position: Chess,
    pub legal: Vec<CandidateMove>,
    pub rng: StdRng,
    pub evaluation: WeightedEvaluation,
    pub limits: ScanLimits,
}

impl Fixture {
    pub fn new(fen: &str) -> Self {
        let oracle = ShakmatyOracle;
        let position = oracle.load_position(fen).expect("fixture position loads");
        let legal = oracle.legal_moves(&position);
        Self {
            oracle,
            position,
            legal,
            rng: StdRng::seed_from_u64(0x5eed),
            evaluation: WeightedEvaluation::standard(),
            limits: ScanLimits::default(),
        }
    }

    pub fn ctx(&mut self) -> SelectionContext<'_, ShakmatyOracle> {
        let side_to_move = self.oracle.turn_color(&self.position);
        SelectionContext {
            oracle: &self.oracle,
            position: &self.position,
            legal_moves: &self.legal,
            side_to_move,
            limits: self.limits,
            evaluation: &self.evaluation,
            rng: &mut self.rng,
        }
    }

    pub fn is_legal(&self, mv: &CandidateMove) -> bool {
        self.legal.contains(mv)
    }
}
