//! Bounded tactical probes over the oracle.
//!
//! Every probe walks a [`ProbeLine`] rooted at a clone of the caller's
//! handle and caps how many moves it looks at, so the cost of a scan is fixed
//! regardless of the position.
//!
//! `find_mate_in_n` is an approximation for depth > 1: it verifies only a
//! prefix of the defender's replies, so it can report a mate that a full
//! search would refute. Intermediate attacker plies try checks and captures
//! first and stop after a prefix. The last attacker ply is checked in full.

use std::cmp::Reverse;

use crate::errors::EngineResult;
use crate::game_state::chess_types::Square;
use crate::oracle::position_oracle::{CandidateMove, PositionOracle, ProbeLine};
use crate::search::board_scoring::MaterialScorer;

/// Sample sizes that bound every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Defender replies checked per ply of the mate search.
    pub reply_sample: usize,
    /// Attacker continuations tried after each sampled reply, forcing moves
    /// first. The final mating ply ignores it.
    pub follow_up_prefix: usize,
    /// Moves inspected by `count_threats`.
    pub threat_sample: usize,
    /// Candidates examined by the heavier per-move strategies.
    pub candidate_sample: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            reply_sample: 2,
            follow_up_prefix: 8,
            threat_sample: 24,
            candidate_sample: 24,
        }
    }
}

pub struct TacticalScanner<'a, O: PositionOracle> {
    oracle: &'a O,
    limits: ScanLimits,
}

impl<'a, O: PositionOracle> TacticalScanner<'a, O> {
    pub fn new(oracle: &'a O, limits: ScanLimits) -> Self {
        Self { oracle, limits }
    }

    /// First candidate that mates within `depth` moves of the side to move,
    /// under the sampling approximation described in the module docs.
    pub fn find_mate_in_n(
        &self,
        position: &O::Handle,
        candidates: &[CandidateMove],
        depth: u8,
    ) -> EngineResult<Option<CandidateMove>> {
        if depth == 0 {
            return Ok(None);
        }
        let mut line = ProbeLine::new(self.oracle, position.clone());
        for candidate in candidates {
            line.play(candidate)?;
            let mates = self.mates_after(&mut line, depth)?;
            line.undo();
            if mates {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }

    /// `line` sits right after an attacking move.
    fn mates_after(&self, line: &mut ProbeLine<'_, O>, depth: u8) -> EngineResult<bool> {
        if self.oracle.is_checkmate(line.current()) {
            return Ok(true);
        }
        if depth <= 1 {
            return Ok(false);
        }
        let replies = self.oracle.legal_moves(line.current());
        if replies.is_empty() {
            // stalemate
            return Ok(false);
        }
        for reply in replies.iter().take(self.limits.reply_sample) {
            line.play(reply)?;
            let continues = if depth == 2 {
                self.has_mate_in_one(line)?
            } else {
                let follow_ups = self.forcing_first(line.current())?;
                let mut found = false;
                for follow_up in follow_ups.iter().take(self.limits.follow_up_prefix) {
                    line.play(follow_up)?;
                    let mates = self.mates_after(line, depth - 1)?;
                    line.undo();
                    if mates {
                        found = true;
                        break;
                    }
                }
                found
            };
            line.undo();
            if !continues {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn has_mate_in_one(&self, line: &mut ProbeLine<'_, O>) -> EngineResult<bool> {
        for mv in self.oracle.legal_moves(line.current()) {
            let mated = self.oracle.is_checkmate(line.play(&mv)?);
            line.undo();
            if mated {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Legal moves with checks ahead of quiet moves, richer captures first
    /// within each group. Otherwise oracle order is kept.
    pub fn forcing_first(&self, position: &O::Handle) -> EngineResult<Vec<CandidateMove>> {
        let mut line = ProbeLine::new(self.oracle, position.clone());
        let mut keyed = Vec::new();
        for mv in self.oracle.legal_moves(position) {
            let gives_check = self.oracle.is_check(line.play(&mv)?);
            line.undo();
            keyed.push((Reverse((gives_check, Self::material_gain(&mv))), mv));
        }
        keyed.sort_by_key(|(key, _)| *key);
        Ok(keyed.into_iter().map(|(_, mv)| mv).collect())
    }

    /// Captures plus checking moves among the first `threat_sample` legal
    /// moves of the side to move.
    pub fn count_threats(&self, position: &O::Handle) -> EngineResult<usize> {
        let moves = self.oracle.legal_moves(position);
        let mut line = ProbeLine::new(self.oracle, position.clone());
        let mut threats = 0;
        for mv in moves.iter().take(self.limits.threat_sample) {
            if mv.is_capture() {
                threats += 1;
                continue;
            }
            let gives_check = self.oracle.is_check(line.play(mv)?);
            line.undo();
            if gives_check {
                threats += 1;
            }
        }
        Ok(threats)
    }

    /// Threats the player who just moved would have if it were their turn
    /// again. Zero when the oracle cannot pass the turn.
    pub fn threats_for_mover(&self, after_move: &O::Handle) -> EngineResult<usize> {
        match self.oracle.null_move(after_move) {
            Some(passed) => self.count_threats(&passed),
            None => Ok(0),
        }
    }

    #[inline]
    pub fn material_gain(mv: &CandidateMove) -> i32 {
        mv.captured.map_or(0, MaterialScorer::piece_value)
    }

    #[inline]
    pub fn promotion_gain(mv: &CandidateMove) -> i32 {
        mv.promotion.map_or(0, |p| {
            MaterialScorer::piece_value(p) - MaterialScorer::piece_value(mv.piece)
        })
    }

    /// Value of the richest capture available to the side to move.
    pub fn best_capture(&self, position: &O::Handle) -> i32 {
        self.oracle
            .legal_moves(position)
            .iter()
            .map(Self::material_gain)
            .max()
            .unwrap_or(0)
    }

    /// What `mv` wins minus the best capture it leaves the opponent, given
    /// `after` is the position `mv` produces.
    pub fn exchange_balance(&self, mv: &CandidateMove, after: &O::Handle) -> i32 {
        Self::material_gain(mv) + Self::promotion_gain(mv) - self.best_capture(after)
    }

    /// Legal destinations of the side to move within two king steps of
    /// `king`.
    pub fn king_pressure(&self, position: &O::Handle, king: Square) -> usize {
        self.oracle
            .legal_moves(position)
            .iter()
            .filter(|mv| mv.to.chebyshev_distance(king) <= 2)
            .count()
    }

    /// Whether the side to move can land on `square`, i.e. recapture there.
    pub fn can_reach(&self, position: &O::Handle, square: Square) -> bool {
        self.oracle
            .legal_moves(position)
            .iter()
            .any(|reply| reply.to == square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::shakmaty_oracle::{ShakmatyOracle, START_FEN};

    const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";

    fn wide_limits() -> ScanLimits {
        ScanLimits {
            reply_sample: 64,
            follow_up_prefix: 64,
            threat_sample: 64,
            candidate_sample: 64,
        }
    }

    fn scanner(oracle: &ShakmatyOracle) -> TacticalScanner<'_, ShakmatyOracle> {
        TacticalScanner::new(oracle, ScanLimits::default())
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let oracle = ShakmatyOracle;
        let pos = oracle.load_position(BACK_RANK).expect("loads");
        let moves = oracle.legal_moves(&pos);
        let mate = scanner(&oracle)
            .find_mate_in_n(&pos, &moves, 1)
            .expect("scan runs")
            .expect("mate exists");
        assert_eq!(mate.uci(), "a1a8");
    }

    #[test]
    fn depth_zero_and_quiet_positions_find_nothing() {
        let oracle = ShakmatyOracle;
        let pos = oracle.load_position(START_FEN).expect("loads");
        let moves = oracle.legal_moves(&pos);
        let scan = scanner(&oracle);
        assert_eq!(scan.find_mate_in_n(&pos, &moves, 0).expect("runs"), None);
        assert_eq!(scan.find_mate_in_n(&pos, &moves, 1).expect("runs"), None);
    }

    #[test]
    fn mate_outside_candidate_slice_is_not_reported() {
        let oracle = ShakmatyOracle;
        let pos = oracle.load_position(BACK_RANK).expect("loads");
        let quiet: Vec<_> = oracle
            .legal_moves(&pos)
            .into_iter()
            .filter(|m| m.uci() != "a1a8")
            .collect();
        assert_eq!(
            scanner(&oracle).find_mate_in_n(&pos, &quiet, 1).expect("runs"),
            None
        );
    }

    #[test]
    fn exhaustive_limits_find_a_quiet_mate_in_two() {
        // Kc7 leaves Ka7 as the only reply, then Ra1 mates.
        let oracle = ShakmatyOracle;
        let pos = oracle
            .load_position("k7/8/2K5/8/8/8/8/1R6 w - - 0 1")
            .expect("loads");
        let moves = oracle.legal_moves(&pos);
        let scan = TacticalScanner::new(&oracle, wide_limits());
        assert_eq!(scan.find_mate_in_n(&pos, &moves, 1).expect("runs"), None);
        let mate = scan
            .find_mate_in_n(&pos, &moves, 2)
            .expect("runs")
            .expect("mate in two exists");
        let after = oracle.apply(&pos, &mate).expect("applies");
        assert!(!oracle.is_checkmate(&after));
        assert!(!oracle.legal_moves(&after).is_empty());
    }

    #[test]
    fn default_limits_find_a_mate_behind_pawn_pushes() {
        // Same Kc7 Ka7 Ra1 mate, but eight pawn moves come first in
        // generation order.
        let oracle = ShakmatyOracle;
        let pos = oracle
            .load_position("k7/8/2K5/8/8/8/4PPPP/1R6 w - - 0 1")
            .expect("loads");
        let moves = oracle.legal_moves(&pos);
        let scan = scanner(&oracle);
        assert_eq!(scan.find_mate_in_n(&pos, &moves, 1).expect("runs"), None);
        for depth in [2, 3] {
            let mate = scan
                .find_mate_in_n(&pos, &moves, depth)
                .expect("runs")
                .expect("mate in two exists");
            let after = oracle.apply(&pos, &mate).expect("applies");
            assert!(!oracle.is_checkmate(&after));
        }
    }

    #[test]
    fn forcing_first_puts_checks_and_captures_ahead() {
        let oracle = ShakmatyOracle;
        let pos = oracle
            .load_position("6k1/5p2/8/4N3/8/8/8/R5K1 w - - 0 1")
            .expect("loads");
        let ordered = scanner(&oracle).forcing_first(&pos).expect("runs");
        assert_eq!(ordered.len(), oracle.legal_moves(&pos).len());
        let leading: Vec<String> = ordered.iter().take(2).map(CandidateMove::uci).collect();
        assert!(leading.contains(&"a1a8".to_string()));
        assert!(leading.contains(&"e5f7".to_string()));
    }

    #[test]
    fn exchange_balance_charges_the_best_reply_capture() {
        let oracle = ShakmatyOracle;
        // Qxd5 wins a knight and loses the queen to exd5.
        let pos = oracle
            .load_position("4k3/8/4p3/3n3r/8/8/8/3QK3 w - - 0 1")
            .expect("loads");
        let scan = scanner(&oracle);
        let moves = oracle.legal_moves(&pos);
        let balance = |uci: &str| {
            let mv = moves.iter().find(|m| m.uci() == uci).expect("legal");
            let after = oracle.apply(&pos, mv).expect("applies");
            scan.exchange_balance(mv, &after)
        };
        assert_eq!(balance("d1h5"), 500);
        assert_eq!(balance("d1d5"), 320 - 900);
    }

    #[test]
    fn scanning_leaves_the_position_untouched() {
        let oracle = ShakmatyOracle;
        let pos = oracle.load_position(BACK_RANK).expect("loads");
        let moves = oracle.legal_moves(&pos);
        let scan = scanner(&oracle);
        scan.find_mate_in_n(&pos, &moves, 3).expect("runs");
        scan.count_threats(&pos).expect("runs");
        assert_eq!(oracle.encode(&pos), BACK_RANK);
    }

    #[test]
    fn threats_count_captures_and_checks() {
        let oracle = ShakmatyOracle;
        // Ra8+ and Nxf7 are the only forcing moves.
        let pos = oracle
            .load_position("6k1/5p2/8/4N3/8/8/8/R5K1 w - - 0 1")
            .expect("loads");
        let scan = TacticalScanner::new(&oracle, wide_limits());
        assert_eq!(scan.count_threats(&pos).expect("runs"), 2);
        assert_eq!(scan.threats_for_mover(&pos).expect("runs"), 0);
    }

    #[test]
    fn material_gain_reads_the_captured_piece() {
        let take_queen = CandidateMove::new(
            "d1".parse().expect("d1"),
            "d8".parse().expect("d8"),
            crate::game_state::chess_types::PieceKind::Rook,
            None,
            Some(crate::game_state::chess_types::PieceKind::Queen),
        );
        assert_eq!(TacticalScanner::<ShakmatyOracle>::material_gain(&take_queen), 900);
    }

    #[test]
    fn king_pressure_counts_nearby_destinations() {
        let oracle = ShakmatyOracle;
        let pos = oracle.load_position(START_FEN).expect("loads");
        let black_king: Square = "e8".parse().expect("e8");
        assert_eq!(scanner(&oracle).king_pressure(&pos, black_king), 0);

        let white_king: Square = "e1".parse().expect("e1");
        // c3..g3 pawn pushes plus Nc3 and Nf3.
        assert_eq!(scanner(&oracle).king_pressure(&pos, white_king), 7);
    }
}
