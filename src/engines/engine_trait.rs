//! Strategy abstraction shared by every rating band.
//!
//! A band is an ordered list of [`Tactic`]s. Each tactic either proposes a
//! move or passes; the first proposal wins. Tactics receive a
//! [`SelectionContext`] and never mutate the position they are given.

use std::cmp::Reverse;
use std::time::Duration;

use rand::rngs::StdRng;

use crate::engines::{engine_greedy, engine_positional, engine_random};
use crate::errors::EngineResult;
use crate::game_state::chess_types::{BestMove, Color, Square};
use crate::oracle::position_oracle::{CandidateMove, PositionOracle};
use crate::search::board_scoring::{MaterialScorer, WeightedEvaluation, MATE_SCORE};
use crate::search::tactical_scanner::{ScanLimits, TacticalScanner};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tactic {
    /// Iterated mate search from depth 1 up to `max_depth`, over the first
    /// `prefix` legal moves (all when `None`), attempted with `chance`.
    MateSearch {
        max_depth: u8,
        prefix: Option<usize>,
        chance: f64,
    },
    /// Moves that win material or create several captures/checks at once.
    ThreatScan,
    /// Best weighted evaluation over a random sample of candidates.
    PositionalSample,
    /// Minor-piece development; `coordinated` castles first and refuses
    /// squares the opponent can hit.
    Development { coordinated: bool },
    FirstLegal,
    /// Best single-ply material/check balance.
    TacticalAdvantage,
    KeySquareControl,
    /// Captures on squares the opponent cannot recapture on.
    SafeCapture,
    KingAttack,
    /// Development, center and capture bonuses with a little noise.
    WeightedFallback,
    CaptureBias { chance: f64, greedy: bool },
    CenterBias { chance: f64 },
    RandomPrefix { width: usize },
    UniformRandom,
}

impl Tactic {
    pub fn name(&self) -> &'static str {
        match self {
            Tactic::MateSearch { .. } => "mate_search",
            Tactic::ThreatScan => "threat_scan",
            Tactic::PositionalSample => "positional_sample",
            Tactic::Development { coordinated: false } => "development",
            Tactic::Development { coordinated: true } => "coordinated_development",
            Tactic::FirstLegal => "first_legal",
            Tactic::TacticalAdvantage => "tactical_advantage",
            Tactic::KeySquareControl => "key_square_control",
            Tactic::SafeCapture => "safe_capture",
            Tactic::KingAttack => "king_attack",
            Tactic::WeightedFallback => "weighted_fallback",
            Tactic::CaptureBias { .. } => "capture_bias",
            Tactic::CenterBias { .. } => "center_bias",
            Tactic::RandomPrefix { .. } => "random_prefix",
            Tactic::UniformRandom => "uniform_random",
        }
    }

    pub fn try_select<O: PositionOracle>(
        &self,
        ctx: &mut SelectionContext<'_, O>,
    ) -> EngineResult<Option<Pick>> {
        if ctx.legal_moves.is_empty() {
            return Ok(None);
        }
        match *self {
            Tactic::MateSearch {
                max_depth,
                prefix,
                chance,
            } => mate_search(ctx, max_depth, prefix, chance),
            Tactic::ThreatScan => engine_greedy::threat_scan(ctx),
            Tactic::PositionalSample => engine_positional::positional_sample(ctx),
            Tactic::Development { coordinated } => {
                engine_positional::development(ctx, coordinated)
            }
            Tactic::FirstLegal => Ok(engine_random::first_legal(ctx)),
            Tactic::TacticalAdvantage => engine_greedy::tactical_advantage(ctx),
            Tactic::KeySquareControl => engine_positional::key_square_control(ctx),
            Tactic::SafeCapture => engine_greedy::safe_capture(ctx),
            Tactic::KingAttack => engine_positional::king_attack(ctx),
            Tactic::WeightedFallback => Ok(engine_positional::weighted_fallback(ctx)),
            Tactic::CaptureBias { chance, greedy } => {
                Ok(engine_greedy::capture_bias(ctx, chance, greedy))
            }
            Tactic::CenterBias { chance } => Ok(engine_positional::center_bias(ctx, chance)),
            Tactic::RandomPrefix { width } => Ok(engine_random::random_prefix(ctx, width)),
            Tactic::UniformRandom => Ok(engine_random::uniform_random(ctx)),
        }
    }
}

fn mate_search<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    max_depth: u8,
    prefix: Option<usize>,
    chance: f64,
) -> EngineResult<Option<Pick>> {
    if !engine_random::roll(ctx.rng, chance) {
        return Ok(None);
    }
    let width = prefix.unwrap_or(ctx.legal_moves.len()).min(ctx.legal_moves.len());
    let candidates = &ctx.legal_moves[..width];
    let scanner = ctx.scanner();
    for depth in 1..=max_depth {
        if let Some(mv) = scanner.find_mate_in_n(ctx.position, candidates, depth)? {
            let line = format!("{} (mate in {depth})", mv.notation);
            return Ok(Some(Pick {
                evaluation: Some(MATE_SCORE - i32::from(depth)),
                principal_variation: Some(line),
                depth: Some(depth),
                mv,
            }));
        }
    }
    Ok(None)
}

/// Everything a tactic may consult while choosing.
pub struct SelectionContext<'a, O: PositionOracle> {
    pub oracle: &'a O,
    pub position: &'a O::Handle,
    pub legal_moves: &'a [CandidateMove],
    pub side_to_move: Color,
    pub limits: ScanLimits,
    pub evaluation: &'a WeightedEvaluation,
    pub rng: &'a mut StdRng,
}

impl<'a, O: PositionOracle> SelectionContext<'a, O> {
    pub fn scanner(&self) -> TacticalScanner<'a, O> {
        TacticalScanner::new(self.oracle, self.limits)
    }

    /// At most `candidate_sample` legal moves, forcing ones first.
    ///
    /// Captures and moves of pieces the opponent currently attacks lead,
    /// ranked by the material at stake, then checks, then the remaining moves
    /// in oracle order.
    pub fn bounded_candidates(&self) -> EngineResult<Vec<&'a CandidateMove>> {
        let attacked: Vec<Square> = match self.oracle.null_move(self.position) {
            Some(passed) => self
                .oracle
                .legal_moves(&passed)
                .into_iter()
                .filter(CandidateMove::is_capture)
                .map(|reply| reply.to)
                .collect(),
            None => Vec::new(),
        };
        let legal = self.legal_moves;
        let mut keyed = Vec::with_capacity(legal.len());
        for mv in legal {
            let gain = TacticalScanner::<O>::material_gain(mv)
                + TacticalScanner::<O>::promotion_gain(mv);
            let rescue = if attacked.contains(&mv.from) {
                MaterialScorer::piece_value(mv.piece)
            } else {
                0
            };
            let after = self.oracle.apply(self.position, mv)?;
            let gives_check = self.oracle.is_check(&after);
            keyed.push((Reverse((gain.max(rescue), gives_check, gain)), mv));
        }
        keyed.sort_by_key(|(key, _)| *key);
        keyed.truncate(self.limits.candidate_sample);
        Ok(keyed.into_iter().map(|(_, mv)| mv).collect())
    }
}

/// A tactic's proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub mv: CandidateMove,
    pub evaluation: Option<i32>,
    pub principal_variation: Option<String>,
    pub depth: Option<u8>,
}

impl Pick {
    pub fn plain(mv: CandidateMove) -> Self {
        Self {
            mv,
            evaluation: None,
            principal_variation: None,
            depth: None,
        }
    }

    pub fn scored(mv: CandidateMove, evaluation: i32) -> Self {
        Self {
            evaluation: Some(evaluation),
            ..Self::plain(mv)
        }
    }
}

/// The winning pick together with the tactic that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub pick: Pick,
    pub tactic: Tactic,
}

/// Outcome of one analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResult {
    pub best_move: BestMove,
    /// Short algebraic form of `best_move`, absent for the sentinel.
    pub notation: Option<String>,
    pub level: &'static str,
    pub rating: u32,
    pub depth: u8,
    pub elapsed: Duration,
    pub confidence: f64,
    /// Centipawns from the mover's point of view.
    pub evaluation: Option<i32>,
    pub principal_variation: Option<String>,
    pub strategy: Option<&'static str>,
}

impl MoveResult {
    #[inline]
    pub fn is_none(&self) -> bool {
        self.best_move.is_none()
    }
}
