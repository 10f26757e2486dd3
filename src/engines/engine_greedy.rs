//! Material-driven tactics, from a coin-flip capture habit up to the
//! multi-threat scan the strongest band uses.

use rand::prelude::IndexedRandom;

use crate::engines::engine_random::roll;
use crate::engines::engine_trait::{Pick, SelectionContext};
use crate::errors::EngineResult;
use crate::oracle::position_oracle::{CandidateMove, PositionOracle};
use crate::search::board_scoring::MaterialScorer;
use crate::search::tactical_scanner::TacticalScanner;

const CHECK_BONUS: i32 = 50;
const MOVER_THREAT_WEIGHT: i32 = 25;
const REPLY_THREAT_WEIGHT: i32 = 15;

/// Picks uniformly among the highest-scoring entries, like the greedy engine
/// breaks ties between equal captures.
fn best_of<'m, O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    scored: &'m [(i32, &'m CandidateMove)],
) -> Option<(i32, &'m CandidateMove)> {
    let best_value = scored.iter().map(|(score, _)| *score).max()?;
    let best_moves: Vec<_> = scored
        .iter()
        .filter(|(score, _)| *score == best_value)
        .collect();
    best_moves.choose(ctx.rng).map(|(score, mv)| (*score, *mv))
}

/// With probability `chance`, play a capture: the most valuable one when
/// `greedy`, any capture otherwise.
pub fn capture_bias<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    chance: f64,
    greedy: bool,
) -> Option<Pick> {
    if !roll(ctx.rng, chance) {
        return None;
    }
    let legal = ctx.legal_moves;
    let captures: Vec<&CandidateMove> = legal.iter().filter(|m| m.is_capture()).collect();
    if captures.is_empty() {
        return None;
    }
    if !greedy {
        let mv = captures.choose(ctx.rng)?;
        return Some(Pick::scored(
            (*mv).clone(),
            TacticalScanner::<O>::material_gain(mv),
        ));
    }
    let scored: Vec<(i32, &CandidateMove)> = captures
        .into_iter()
        .map(|mv| (TacticalScanner::<O>::material_gain(mv), mv))
        .collect();
    best_of(ctx, &scored).map(|(gain, mv)| Pick::scored(mv.clone(), gain))
}

/// Captures whose destination the opponent cannot reach next move, or that
/// win more than the capturing piece is worth.
pub fn safe_capture<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let scanner = ctx.scanner();
    let legal = ctx.legal_moves;
    let mut scored = Vec::new();
    for mv in legal.iter().filter(|m| m.is_capture()) {
        let after = ctx.oracle.apply(ctx.position, mv)?;
        let gain = TacticalScanner::<O>::material_gain(mv) + TacticalScanner::<O>::promotion_gain(mv);
        let net = if scanner.can_reach(&after, mv.to) {
            gain - MaterialScorer::piece_value(mv.piece)
        } else {
            gain
        };
        if net > 0 {
            scored.push((net, mv));
        }
    }
    Ok(best_of(ctx, &scored).map(|(net, mv)| Pick::scored(mv.clone(), net)))
}

/// Material won net of the opponent's best reply capture, plus a check
/// bonus, one ply deep. Passes unless something comes out ahead.
pub fn tactical_advantage<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let scanner = ctx.scanner();
    let mut scored = Vec::new();
    for mv in ctx.bounded_candidates()? {
        let after = ctx.oracle.apply(ctx.position, mv)?;
        let mut net = scanner.exchange_balance(mv, &after);
        if ctx.oracle.is_check(&after) {
            net += CHECK_BONUS;
        }
        if net > 0 {
            scored.push((net, mv));
        }
    }
    Ok(best_of(ctx, &scored).map(|(net, mv)| Pick::scored(mv.clone(), net)))
}

/// Material balance of the move plus the captures and checks it sets up,
/// minus the ones it hands the opponent. Accepts a move that wins material
/// outright, or one that creates two threats (or checks) without giving
/// anything away.
pub fn threat_scan<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let scanner = ctx.scanner();
    let mut scored = Vec::new();
    for mv in ctx.bounded_candidates()? {
        let after = ctx.oracle.apply(ctx.position, mv)?;
        let material = scanner.exchange_balance(mv, &after);
        let own_threats = scanner.threats_for_mover(&after)?;
        let their_threats = scanner.count_threats(&after)?;
        let gives_check = ctx.oracle.is_check(&after);

        let qualifies = material > 0 || (material == 0 && (own_threats >= 2 || gives_check));
        if !qualifies {
            continue;
        }
        let mut score = material + MOVER_THREAT_WEIGHT * own_threats as i32
            - REPLY_THREAT_WEIGHT * their_threats as i32;
        if gives_check {
            score += CHECK_BONUS;
        }
        scored.push((score, mv));
    }
    Ok(best_of(ctx, &scored).map(|(score, mv)| Pick::scored(mv.clone(), score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::test_support::Fixture;

    // White queen can take a defended knight on d5 or an undefended rook on h5.
    const HANGING_ROOK: &str = "4k3/8/4p3/3n3r/8/8/8/3QK3 w - - 0 1";

    #[test]
    fn greedy_capture_takes_the_most_valuable_piece() {
        let mut fx = Fixture::new(HANGING_ROOK);
        let pick = capture_bias(&mut fx.ctx(), 1.0, true).expect("captures exist");
        assert_eq!(pick.mv.uci(), "d1h5");
        assert_eq!(pick.evaluation, Some(500));
    }

    #[test]
    fn capture_bias_passes_without_captures_or_luck() {
        let mut fx = Fixture::new("startpos");
        assert!(capture_bias(&mut fx.ctx(), 1.0, true).is_none());
        let mut fx = Fixture::new(HANGING_ROOK);
        assert!(capture_bias(&mut fx.ctx(), 0.0, false).is_none());
    }

    #[test]
    fn random_capture_is_still_a_capture() {
        let mut fx = Fixture::new(HANGING_ROOK);
        for _ in 0..16 {
            let pick = capture_bias(&mut fx.ctx(), 1.0, false).expect("captures exist");
            assert!(pick.mv.is_capture());
        }
    }

    #[test]
    fn safe_capture_avoids_defended_pieces() {
        let mut fx = Fixture::new(HANGING_ROOK);
        let pick = safe_capture(&mut fx.ctx())
            .expect("scan runs")
            .expect("the rook is free");
        assert_eq!(pick.mv.uci(), "d1h5");
    }

    #[test]
    fn safe_capture_passes_when_every_capture_loses_material() {
        // Qxd5 loses the queen to exd5 and no other capture exists.
        let mut fx = Fixture::new("4k3/8/4p3/3n4/8/8/8/3QK3 w - - 0 1");
        assert_eq!(safe_capture(&mut fx.ctx()).expect("scan runs"), None);
    }

    #[test]
    fn tactical_advantage_prefers_winning_material() {
        let mut fx = Fixture::new(HANGING_ROOK);
        let pick = tactical_advantage(&mut fx.ctx())
            .expect("scan runs")
            .expect("winning capture exists");
        assert_eq!(pick.mv.uci(), "d1h5");
    }

    // Black's queen on h4 is free while White's own queen on d4 is attacked
    // by the c6 knight. Queen moves sit late in generation order.
    const QUEEN_TRADE_OFFER: &str =
        "r1b1kb1r/pppp1ppp/2n2n2/8/3Q3q/2N5/PPP2PPP/R1B1KB1R w KQkq - 0 1";

    #[test]
    fn tactical_advantage_takes_a_free_queen_in_a_busy_position() {
        let mut fx = Fixture::new(QUEEN_TRADE_OFFER);
        assert!(fx.legal.len() > fx.limits.candidate_sample);
        let pick = tactical_advantage(&mut fx.ctx())
            .expect("scan runs")
            .expect("the queen is free");
        assert_eq!(pick.mv.uci(), "d4h4");
        assert_eq!(pick.evaluation, Some(900));
    }

    #[test]
    fn threat_scan_never_leaves_the_queen_hanging() {
        let mut fx = Fixture::new(QUEEN_TRADE_OFFER);
        for _ in 0..8 {
            let pick = threat_scan(&mut fx.ctx())
                .expect("scan runs")
                .expect("the queen is free");
            assert_eq!(pick.mv.uci(), "d4h4");
        }
    }

    #[test]
    fn threat_scan_grabs_free_material() {
        let mut fx = Fixture::new(HANGING_ROOK);
        let pick = threat_scan(&mut fx.ctx())
            .expect("scan runs")
            .expect("free rook qualifies");
        assert!(fx.is_legal(&pick.mv));
        assert!(pick.evaluation.unwrap_or_default() > 0);
    }
}
