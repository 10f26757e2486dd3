//! Random-move tactics: the floor every band falls back to.

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::Rng;

use crate::engines::engine_trait::{Pick, SelectionContext};
use crate::oracle::position_oracle::PositionOracle;

/// True with probability `chance`; certainties skip the draw.
pub fn roll(rng: &mut StdRng, chance: f64) -> bool {
    if chance >= 1.0 {
        return true;
    }
    if chance.is_nan() || chance <= 0.0 {
        return false;
    }
    rng.random_bool(chance)
}

pub fn uniform_random<O: PositionOracle>(ctx: &mut SelectionContext<'_, O>) -> Option<Pick> {
    ctx.legal_moves
        .choose(ctx.rng)
        .cloned()
        .map(Pick::plain)
}

/// Uniform among the first `width` legal moves.
pub fn random_prefix<O: PositionOracle>(
    ctx: &mut SelectionContext<'_, O>,
    width: usize,
) -> Option<Pick> {
    let width = width.clamp(1, ctx.legal_moves.len().max(1));
    ctx.legal_moves
        .get(..width)?
        .choose(ctx.rng)
        .cloned()
        .map(Pick::plain)
}

pub fn first_legal<O: PositionOracle>(ctx: &SelectionContext<'_, O>) -> Option<Pick> {
    ctx.legal_moves.first().cloned().map(Pick::plain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::test_support::Fixture;
    use rand::SeedableRng;

    #[test]
    fn roll_respects_certainties() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(roll(&mut rng, 1.0));
        assert!(!roll(&mut rng, 0.0));
        assert!(!roll(&mut rng, f64::NAN));
        assert!(!roll(&mut rng, -0.5));
    }

    #[test]
    fn uniform_random_returns_a_legal_move() {
        let mut fx = Fixture::new("startpos");
        let legal = fx.legal.clone();
        for _ in 0..32 {
            let pick = uniform_random(&mut fx.ctx()).expect("start position has moves");
            assert!(legal.contains(&pick.mv));
        }
    }

    #[test]
    fn random_prefix_stays_inside_the_prefix() {
        let mut fx = Fixture::new("startpos");
        let prefix = fx.legal[..3].to_vec();
        for _ in 0..32 {
            let pick = random_prefix(&mut fx.ctx(), 3).expect("prefix is non-empty");
            assert!(prefix.contains(&pick.mv));
        }
        let pick = random_prefix(&mut fx.ctx(), 0).expect("width is clamped to one");
        assert_eq!(pick.mv, fx.legal[0]);
    }

    #[test]
    fn first_legal_is_deterministic() {
        let mut fx = Fixture::new("startpos");
        let first = fx.legal[0].clone();
        assert_eq!(first_legal(&fx.ctx()).map(|p| p.mv), Some(first));
    }
}
