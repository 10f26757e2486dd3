//! Placement heuristics: center, development, key squares, king attack and
//! the sampled positional evaluation.

use rand::prelude::IndexedRandom;
use rand::Rng;

use crate::engines::engine_random::roll;
use crate::engines::engine_trait::{Pick, SelectionContext};
use crate::errors::EngineResult;
use crate::game_state::chess_types::{Color, PieceKind, Square};
use crate::oracle::position_oracle::{CandidateMove, PositionOracle};
use crate::search::board_scoring::BoardSnapshot;
use crate::search::tactical_scanner::TacticalScanner;

/// d4 e4 d5 e5 and their c/f neighbours on the fourth and fifth ranks.
const KEY_SQUARES: [u8; 8] = [26, 27, 28, 29, 34, 35, 36, 37];

fn is_key_square(sq: Square) -> bool {
    KEY_SQUARES.contains(&sq.index())
}

fn is_developing(mover: Color, mv: &CandidateMove) -> bool {
    mv.piece.is_minor()
        && mv.from.rank() == mover.home_rank()
        && !mv.to.is_edge_file()
}

fn center_weight(sq: Square) -> i32 {
    if sq.is_center() {
        15
    } else if sq.is_extended_center() {
        8
    } else {
        0
    }
}

/// With probability `chance`, a random move into d4-e5, or into c3-f6 when
/// nothing reaches the inner center.
pub fn center_bias<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    chance: f64,
) -> Option<Pick> {
    if !roll(ctx.rng, chance) {
        return None;
    }
    let legal = ctx.legal_moves;
    let mut pool: Vec<&CandidateMove> = legal.iter().filter(|m| m.to.is_center()).collect();
    if pool.is_empty() {
        pool = legal.iter().filter(|m| m.to.is_extended_center()).collect();
    }
    pool.choose(ctx.rng).map(|mv| Pick::plain((*mv).clone()))
}

/// Knights and bishops off the back rank, toward the center when possible.
/// The coordinated form castles first and skips squares the opponent can hit.
pub fn development<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    coordinated: bool,
) -> EngineResult<Option<Pick>> {
    let legal = ctx.legal_moves;
    if coordinated {
        let castles: Vec<&CandidateMove> = legal.iter().filter(|m| m.is_castle()).collect();
        if let Some(mv) = castles.choose(ctx.rng) {
            return Ok(Some(Pick::plain((*mv).clone())));
        }
    }

    let scanner = ctx.scanner();
    let mover = ctx.side_to_move;
    let mut developing = Vec::new();
    for mv in legal.iter().filter(|m| is_developing(mover, m)) {
        if coordinated {
            let after = ctx.oracle.apply(ctx.position, mv)?;
            if scanner.can_reach(&after, mv.to) {
                continue;
            }
        }
        developing.push(mv);
    }
    if developing.is_empty() && !coordinated {
        // Central pawn pushes open lines for the pieces.
        developing = legal
            .iter()
            .filter(|m| m.piece == PieceKind::Pawn && !m.is_capture() && m.to.is_extended_center())
            .filter(|m| (3..=4).contains(&m.to.file()))
            .collect();
    }

    let best = developing.iter().map(|mv| center_weight(mv.to)).max();
    let Some(best) = best else {
        return Ok(None);
    };
    let top: Vec<&&CandidateMove> = developing
        .iter()
        .filter(|mv| center_weight(mv.to) == best)
        .collect();
    Ok(top.choose(ctx.rng).map(|mv| Pick::plain((**mv).clone())))
}

fn key_square_count<O: PositionOracle>(oracle: &O, position: &O::Handle) -> usize {
    oracle
        .legal_moves(position)
        .iter()
        .filter(|m| is_key_square(m.to))
        .count()
}

/// Bounded candidates that keep the best material balance on offer, paired
/// with the positions they lead to.
fn materially_safest<'a, O: PositionOracle>(
    ctx: &SelectionContext<'a, O>,
) -> EngineResult<Vec<(&'a CandidateMove, O::Handle)>> {
    let scanner = ctx.scanner();
    let mut balanced = Vec::new();
    for mv in ctx.bounded_candidates()? {
        let after = ctx.oracle.apply(ctx.position, mv)?;
        balanced.push((scanner.exchange_balance(mv, &after), mv, after));
    }
    let Some(best) = balanced.iter().map(|(balance, _, _)| *balance).max() else {
        return Ok(Vec::new());
    };
    Ok(balanced
        .into_iter()
        .filter(|(balance, _, _)| *balance == best)
        .map(|(_, mv, after)| (mv, after))
        .collect())
}

/// Moves that raise the number of our moves landing on key central squares,
/// among those that keep the best material balance.
pub fn key_square_control<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let baseline = key_square_count(ctx.oracle, ctx.position);
    let mut scored: Vec<(usize, &CandidateMove)> = Vec::new();
    for (mv, after) in materially_safest(ctx)? {
        let Some(passed) = ctx.oracle.null_move(&after) else {
            continue;
        };
        let mut control = key_square_count(ctx.oracle, &passed);
        if is_key_square(mv.to) {
            control += 2;
        }
        scored.push((control, mv));
    }

    let Some(best) = scored.iter().map(|(c, _)| *c).max() else {
        return Ok(None);
    };
    if best <= baseline {
        return Ok(None);
    }
    let top: Vec<&CandidateMove> = scored
        .iter()
        .filter(|(c, _)| *c == best)
        .map(|(_, mv)| *mv)
        .collect();
    Ok(top
        .choose(ctx.rng)
        .map(|mv| Pick::scored((*mv).clone(), best as i32)))
}

/// Moves that increase how many of our moves land within two steps of the
/// enemy king, among those that keep the best material balance, preferring
/// pieces that end up close to it.
pub fn king_attack<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let Some(king) = ctx.oracle.find_king(ctx.position, ctx.side_to_move.opposite()) else {
        return Ok(None);
    };
    let scanner = ctx.scanner();
    let baseline = scanner.king_pressure(ctx.position, king);
    let mut scored: Vec<(i32, &CandidateMove)> = Vec::new();
    for (mv, after) in materially_safest(ctx)? {
        let Some(passed) = ctx.oracle.null_move(&after) else {
            continue;
        };
        let pressure = scanner.king_pressure(&passed, king);
        if pressure <= baseline {
            continue;
        }
        let score = pressure as i32 * 10 - i32::from(mv.to.chebyshev_distance(king)) * 5;
        scored.push((score, mv));
    }

    let Some(best) = scored.iter().map(|(s, _)| *s).max() else {
        return Ok(None);
    };
    let top: Vec<&CandidateMove> = scored
        .iter()
        .filter(|(s, _)| *s == best)
        .map(|(_, mv)| *mv)
        .collect();
    Ok(top.choose(ctx.rng).map(|mv| Pick::scored((*mv).clone(), best)))
}

/// Development, center and capture bonuses plus up to ten points of noise.
/// Always answers when a legal move exists.
pub fn weighted_fallback<O: PositionOracle>(ctx: &mut SelectionContext<'_, O>) -> Option<Pick> {
    let legal = ctx.legal_moves;
    let mover = ctx.side_to_move;
    let mut best: Option<(i32, &CandidateMove)> = None;
    for mv in legal {
        let mut score = center_weight(mv.to);
        if is_developing(mover, mv) {
            score += 20;
        }
        if mv.is_castle() {
            score += 25;
        }
        score += TacticalScanner::<O>::material_gain(mv) / 10;
        score += ctx.rng.random_range(0..10);
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, mv));
        }
    }
    best.map(|(score, mv)| Pick::scored(mv.clone(), score))
}

/// Evaluates a random sample of candidates with the weighted evaluation and
/// plays the best one, unless every sampled move scores below the current
/// position.
pub fn positional_sample<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
) -> EngineResult<Option<Pick>> {
    let legal = ctx.legal_moves;
    let mover = ctx.side_to_move;
    let baseline = ctx
        .evaluation
        .evaluate(&BoardSnapshot::capture(ctx.oracle, ctx.position), mover);

    let sample: Vec<&CandidateMove> = legal
        .choose_multiple(ctx.rng, ctx.limits.candidate_sample)
        .collect();
    let mut best: Option<(i32, &CandidateMove)> = None;
    for mv in sample {
        let after = ctx.oracle.apply(ctx.position, mv)?;
        let score = ctx
            .evaluation
            .evaluate(&BoardSnapshot::capture(ctx.oracle, &after), mover);
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, mv));
        }
    }

    Ok(best
        .filter(|(score, _)| *score >= baseline)
        .map(|(score, mv)| Pick::scored(mv.clone(), score - baseline)))
}
