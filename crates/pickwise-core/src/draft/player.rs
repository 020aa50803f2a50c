// Player records and the football positions they are drafted at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions, plus the FLEX and BENCH meta-slots that only appear
/// in roster requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DEF", alias = "DST", alias = "D/ST")]
    Defense,
    #[serde(rename = "FLEX")]
    Flex,
    #[serde(rename = "BENCH", alias = "BN", alias = "BE")]
    Bench,
}

/// Positions that may fill a FLEX slot.
pub const FLEX_ELIGIBLE: &[Position] = &[
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
];

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles the provider's abbreviations:
    /// - "DEF" / "DST" / "D/ST" -> Defense
    /// - "BENCH" / "BN" / "BE" -> Bench
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            "FLEX" => Some(Position::Flex),
            "BENCH" | "BN" | "BE" => Some(Position::Bench),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
            Position::Flex => "FLEX",
            Position::Bench => "BENCH",
        }
    }

    /// Whether this is a meta-slot (not a position a player is listed at).
    pub fn is_meta_slot(&self) -> bool {
        matches!(self, Position::Flex | Position::Bench)
    }

    /// Whether a player at this position can start in a FLEX slot.
    pub fn is_flex_eligible(&self) -> bool {
        FLEX_ELIGIBLE.contains(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player as supplied by the catalog provider.
///
/// Projection numbers (`projected_points`, `vorp`) are produced upstream and
/// treated as opaque here. Records are shared behind `Arc` once loaded and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: String,
    pub player_name: String,
    pub position: Position,
    /// NFL team abbreviation (e.g. "KC").
    pub team_abbr: String,
    pub projected_points: f64,
    /// Average draft position across the provider's leagues.
    pub adp: f64,
    pub bye_week: u8,
    pub tier: u32,
    /// Value over a replacement-level player at the same position.
    pub vorp: f64,
}
