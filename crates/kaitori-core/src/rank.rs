use serde::{Deserialize, Serialize};

/// Categorical attractiveness of a candidate site.
///
/// The calculator only emits S through C. Stores ranked "D" elsewhere in the
/// product have no threshold defined here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::S => write!(f, "S"),
            Rank::A => write!(f, "A"),
            Rank::B => write!(f, "B"),
            Rank::C => write!(f, "C"),
        }
    }
}

/// Threshold ladder, highest first.
const RANK_THRESHOLDS: &[(f64, Rank)] = &[(8.0, Rank::S), (5.0, Rank::A), (3.0, Rank::B)];

/// Maps a market-power score to a rank: ≥8 S, ≥5 A, ≥3 B, otherwise C.
#[must_use]
pub fn rank_from_score(score: f64) -> Rank {
    RANK_THRESHOLDS
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map_or(Rank::C, |(_, rank)| *rank)
}
