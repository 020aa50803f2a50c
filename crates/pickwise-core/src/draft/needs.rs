// Remaining positional needs for a team, derived from its roster.
//
// Needs are recomputed from the live roster on every call and never cached.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::RosterRequirements;
use crate::draft::player::{Position, FLEX_ELIGIBLE};
use crate::draft::roster::TeamRoster;

/// Open roster spots per position, including FLEX and BENCH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TeamNeeds(BTreeMap<Position, usize>);

impl TeamNeeds {
    /// Open spots at `pos` (0 when the position is not part of the roster plan).
    pub fn get(&self, pos: Position) -> usize {
        self.0.get(&pos).copied().unwrap_or(0)
    }

    /// Whether a directly named starter slot at `pos` is still open.
    pub fn needs_starter(&self, pos: Position) -> bool {
        !pos.is_meta_slot() && self.get(pos) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        self.0.iter().map(|(&pos, &n)| (pos, n))
    }
}

impl FromIterator<(Position, usize)> for TeamNeeds {
    fn from_iter<I: IntoIterator<Item = (Position, usize)>>(iter: I) -> Self {
        TeamNeeds(iter.into_iter().collect())
    }
}

/// Compute a team's remaining needs.
///
/// - Named positions: `required - drafted`, floored at zero.
/// - FLEX: RB/WR/TE drafted beyond their own starter requirements count
///   toward FLEX first.
/// - BENCH: `required BENCH - total drafted`, floored at zero.
pub fn compute_needs(roster: &TeamRoster, requirements: &RosterRequirements) -> TeamNeeds {
    let mut needs = BTreeMap::new();

    for (pos, required) in requirements.iter() {
        if pos.is_meta_slot() {
            continue;
        }
        needs.insert(pos, required.saturating_sub(roster.count(pos)));
    }

    let flex_candidates: usize = FLEX_ELIGIBLE.iter().map(|&p| roster.count(p)).sum();
    let required_starters: usize = FLEX_ELIGIBLE.iter().map(|&p| requirements.required(p)).sum();
    let flex_filled = flex_candidates.saturating_sub(required_starters);
    needs.insert(
        Position::Flex,
        requirements.required(Position::Flex).saturating_sub(flex_filled),
    );

    needs.insert(
        Position::Bench,
        requirements.required(Position::Bench).saturating_sub(roster.total()),
    );

    TeamNeeds(needs)
}
