// Draft board generation: turns league settings into the full pick schedule.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LeagueConfig};
use crate::draft::player::PlayerRecord;
use crate::draft::roster::Team;

/// How the team order evolves from round to round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftOrder {
    /// Every round uses the configured order.
    Linear,
    /// Even rounds reverse the configured order.
    Snake,
}

/// One pick in the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSlot {
    /// Overall pick number (1-indexed).
    pub pick_number: u32,
    /// Round number (1-indexed).
    pub round: u32,
    /// Pick number within the round (1-indexed).
    pub round_pick: u32,
    /// Team on the clock for this pick.
    pub team_id: String,
    /// The drafted player. Set exactly once, when the pick is committed.
    pub player: Option<Arc<PlayerRecord>>,
}

impl DraftSlot {
    pub fn is_filled(&self) -> bool {
        self.player.is_some()
    }
}

/// Check that the team list can drive a board for this league.
///
/// Rejects an empty list, a list whose length differs from
/// `league.num_teams`, and duplicate team ids.
pub fn validate_teams(league: &LeagueConfig, teams: &[Team]) -> Result<(), ConfigError> {
    if teams.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "teams".into(),
            message: "at least one team is required".into(),
        });
    }

    if teams.len() != league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "teams".into(),
            message: format!(
                "league.num_teams is {} but {} teams were provided",
                league.num_teams,
                teams.len()
            ),
        });
    }

    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.team_id.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "teams".into(),
                message: format!("duplicate team_id '{}'", team.team_id),
            });
        }
    }

    Ok(())
}

/// Build the board for a league after validating the team list.
pub fn generate_board(league: &LeagueConfig, teams: &[Team]) -> Result<Vec<DraftSlot>, ConfigError> {
    validate_teams(league, teams)?;
    let team_ids: Vec<&str> = teams.iter().map(|t| t.team_id.as_str()).collect();
    Ok(build_schedule(&team_ids, league.rounds, league.draft_order))
}

/// Lay out `rounds × team_ids.len()` empty slots.
///
/// Team order is taken as given. With [`DraftOrder::Snake`], odd rounds use
/// it directly and even rounds use it reversed.
pub fn build_schedule(team_ids: &[&str], rounds: u32, order: DraftOrder) -> Vec<DraftSlot> {
    let mut slots = Vec::with_capacity(team_ids.len() * rounds as usize);
    let mut pick_number = 1;

    for round in 1..=rounds {
        let reversed = order == DraftOrder::Snake && round % 2 == 0;
        let round_order: Vec<&str> = if reversed {
            team_ids.iter().rev().copied().collect()
        } else {
            team_ids.to_vec()
        };

        for (idx, team_id) in round_order.into_iter().enumerate() {
            slots.push(DraftSlot {
                pick_number,
                round,
                round_pick: idx as u32 + 1,
                team_id: team_id.to_string(),
                player: None,
            });
            pick_number += 1;
        }
    }

    slots
}
