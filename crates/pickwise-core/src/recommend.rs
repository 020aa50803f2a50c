// Recommendation scoring for the team on the clock.
//
// Each available player gets a composite of VORP, projected points and ADP
// value, scaled by how well they fit the team's open roster spots. The pool
// is scanned once per call; nothing here mutates draft state.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::draft::needs::TeamNeeds;
use crate::draft::player::{PlayerRecord, Position};

/// Number of recommendations returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

pub const VORP_WEIGHT: f64 = 0.6;
pub const PROJECTION_WEIGHT: f64 = 0.3;
pub const ADP_WEIGHT: f64 = 0.1;

// ---------------------------------------------------------------------------
// Need fit
// ---------------------------------------------------------------------------

/// How a player's position lines up with a team's open roster spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NeedFit {
    /// Fills an open starter slot at the player's own position.
    Starter,
    /// RB/WR/TE who would fill an open FLEX slot.
    Flex,
    /// No open starting spot for this position.
    Depth,
}

impl NeedFit {
    /// Classify a position against the team's needs.
    pub fn classify(position: Position, needs: &TeamNeeds) -> Self {
        if needs.needs_starter(position) {
            NeedFit::Starter
        } else if position.is_flex_eligible() && needs.get(Position::Flex) > 0 {
            NeedFit::Flex
        } else {
            NeedFit::Depth
        }
    }

    /// Score multiplier: 2.0 / 1.5 / 1.0.
    pub fn multiplier(&self) -> f64 {
        match self {
            NeedFit::Starter => 2.0,
            NeedFit::Flex => 1.5,
            NeedFit::Depth => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// A ranked suggestion for the team on the clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub player: Arc<PlayerRecord>,
    /// Composite score rounded to two decimals.
    pub score: f64,
    pub reason: String,
}

/// How far past their typical draft slot a player is still available.
/// Positive values mean the player is falling (a value pick).
pub fn adp_value(player: &PlayerRecord, current_pick: u32) -> f64 {
    player.adp - f64::from(current_pick)
}

/// Unrounded composite score for one player.
pub fn composite_score(player: &PlayerRecord, needs: &TeamNeeds, current_pick: u32) -> f64 {
    let fit = NeedFit::classify(player.position, needs);
    let base = player.vorp * VORP_WEIGHT
        + player.projected_points * PROJECTION_WEIGHT
        + adp_value(player, current_pick) * ADP_WEIGHT;
    base * fit.multiplier()
}

/// Rank the available pool and return the top `count` players.
///
/// Sorted by composite score descending; equal scores fall back to ascending
/// `player_id` so the output does not depend on pool iteration order.
pub fn recommend<'a, I>(
    pool: I,
    needs: &TeamNeeds,
    current_pick: u32,
    count: usize,
) -> Vec<Recommendation>
where
    I: IntoIterator<Item = &'a Arc<PlayerRecord>>,
{
    let mut scored: Vec<(f64, &Arc<PlayerRecord>)> = pool
        .into_iter()
        .map(|p| (composite_score(p, needs, current_pick), p))
        .collect();

    debug!(
        "Scored {} available players for pick {}",
        scored.len(),
        current_pick
    );

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    scored
        .into_iter()
        .take(count)
        .map(|(score, player)| {
            let fit = NeedFit::classify(player.position, needs);
            Recommendation {
                score: round2(score),
                reason: reason(player, adp_value(player, current_pick), fit),
                player: Arc::clone(player),
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn reason(player: &PlayerRecord, adp_value: f64, fit: NeedFit) -> String {
    let adp_phrase = if adp_value > 0.0 {
        format!("falling {adp_value:.1} picks past ADP")
    } else if adp_value < 0.0 {
        format!("ADP value {adp_value:.1}")
    } else {
        "going right at ADP".to_string()
    };

    let need_phrase = match fit {
        NeedFit::Starter => format!("fills an open {} starter slot", player.position),
        NeedFit::Flex => "fills the open FLEX slot".to_string(),
        NeedFit::Depth => "best available value".to_string(),
    };

    format!("VORP {:.1}, {adp_phrase}, {need_phrase}.", player.vorp)
}
