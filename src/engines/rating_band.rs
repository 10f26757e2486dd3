//! Maps a tier's target rating to the strategy chain that plays it.

use crate::engines::engine_trait::Tactic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatingBand {
    Beginner,
    Intermediate,
    Expert,
    Master,
    Grandmaster,
}

const GRANDMASTER_CHAIN: &[Tactic] = &[
    Tactic::MateSearch {
        max_depth: 3,
        prefix: None,
        chance: 1.0,
    },
    Tactic::ThreatScan,
    Tactic::PositionalSample,
    Tactic::Development { coordinated: false },
    Tactic::FirstLegal,
    Tactic::UniformRandom,
];

const MASTER_CHAIN: &[Tactic] = &[
    Tactic::MateSearch {
        max_depth: 2,
        prefix: None,
        chance: 1.0,
    },
    Tactic::TacticalAdvantage,
    Tactic::KeySquareControl,
    Tactic::Development { coordinated: true },
    Tactic::UniformRandom,
];

const EXPERT_CHAIN: &[Tactic] = &[
    Tactic::MateSearch {
        max_depth: 1,
        prefix: None,
        chance: 1.0,
    },
    Tactic::SafeCapture,
    Tactic::KingAttack,
    Tactic::WeightedFallback,
    Tactic::UniformRandom,
];

const INTERMEDIATE_CHAIN: &[Tactic] = &[
    Tactic::MateSearch {
        max_depth: 1,
        prefix: Some(10),
        chance: 1.0,
    },
    Tactic::CaptureBias {
        chance: 0.6,
        greedy: true,
    },
    Tactic::CenterBias { chance: 0.5 },
    Tactic::RandomPrefix { width: 8 },
    Tactic::UniformRandom,
];

const BEGINNER_CHAIN: &[Tactic] = &[
    Tactic::MateSearch {
        max_depth: 1,
        prefix: None,
        chance: 0.2,
    },
    Tactic::CaptureBias {
        chance: 0.25,
        greedy: false,
    },
    Tactic::CenterBias { chance: 0.2 },
    Tactic::UniformRandom,
];

impl RatingBand {
    pub fn for_rating(rating: u32) -> Self {
        match rating {
            0..=999 => RatingBand::Beginner,
            1000..=1499 => RatingBand::Intermediate,
            1500..=1999 => RatingBand::Expert,
            2000..=2399 => RatingBand::Master,
            _ => RatingBand::Grandmaster,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RatingBand::Beginner => "beginner",
            RatingBand::Intermediate => "intermediate",
            RatingBand::Expert => "expert",
            RatingBand::Master => "master",
            RatingBand::Grandmaster => "grandmaster",
        }
    }

    /// Tactics tried in order; the first one to propose a move wins.
    pub fn chain(self) -> &'static [Tactic] {
        match self {
            RatingBand::Beginner => BEGINNER_CHAIN,
            RatingBand::Intermediate => INTERMEDIATE_CHAIN,
            RatingBand::Expert => EXPERT_CHAIN,
            RatingBand::Master => MASTER_CHAIN,
            RatingBand::Grandmaster => GRANDMASTER_CHAIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        assert_eq!(RatingBand::for_rating(0), RatingBand::Beginner);
        assert_eq!(RatingBand::for_rating(999), RatingBand::Beginner);
        assert_eq!(RatingBand::for_rating(1000), RatingBand::Intermediate);
        assert_eq!(RatingBand::for_rating(1500), RatingBand::Expert);
        assert_eq!(RatingBand::for_rating(2000), RatingBand::Master);
        assert_eq!(RatingBand::for_rating(2399), RatingBand::Master);
        assert_eq!(RatingBand::for_rating(2400), RatingBand::Grandmaster);
    }

    #[test]
    fn every_chain_starts_with_mate_and_ends_uniform() {
        for band in [
            RatingBand::Beginner,
            RatingBand::Intermediate,
            RatingBand::Expert,
            RatingBand::Master,
            RatingBand::Grandmaster,
        ] {
            let chain = band.chain();
            assert!(matches!(chain.first(), Some(Tactic::MateSearch { .. })), "{}", band.name());
            assert_eq!(chain.last(), Some(&Tactic::UniformRandom), "{}", band.name());
        }
    }

    #[test]
    fn mate_depth_grows_with_band() {
        let depth = |band: RatingBand| match band.chain()[0] {
            Tactic::MateSearch { max_depth, .. } => max_depth,
            _ => 0,
        };
        assert_eq!(depth(RatingBand::Expert), 1);
        assert_eq!(depth(RatingBand::Master), 2);
        assert_eq!(depth(RatingBand::Grandmaster), 3);
    }
}
