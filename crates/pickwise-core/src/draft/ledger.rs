// Pick ledger: the draft state machine.
//
// Owns the board, the per-team rosters, and the pool of undrafted players,
// and advances a single cursor through the board as picks are committed.
// The ledger itself is not synchronized; `DraftSession` wraps it in a lock.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, LeagueConfig};
use crate::draft::board::{generate_board, DraftSlot};
use crate::draft::needs::{compute_needs, TeamNeeds};
use crate::draft::player::PlayerRecord;
use crate::draft::roster::{Team, TeamRoster};
use crate::error::{DraftError, Result};
use crate::recommend::{recommend, Recommendation};

/// Lifecycle of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Complete,
}

/// A consistent, owned copy of the full draft state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSnapshot {
    pub status: DraftStatus,
    pub board: Vec<DraftSlot>,
    /// Rosters in first-round draft order.
    pub rosters: Vec<TeamRoster>,
    /// Undrafted players, ordered by player id.
    pub available_players: Vec<Arc<PlayerRecord>>,
    /// Index of the next unfilled slot.
    pub cursor: usize,
    pub total_picks: usize,
    /// The slot on the clock, or `None` once the draft is complete.
    pub current_slot: Option<DraftSlot>,
}

/// Recommendations for whichever team is on the clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockRecommendations {
    pub slot: DraftSlot,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug)]
pub struct DraftLedger {
    status: DraftStatus,
    league: Option<LeagueConfig>,
    board: Vec<DraftSlot>,
    rosters: Vec<TeamRoster>,
    available: BTreeMap<String, Arc<PlayerRecord>>,
    cursor: usize,
}

impl Default for DraftLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftLedger {
    /// An empty ledger waiting for [`DraftLedger::start`].
    pub fn new() -> Self {
        DraftLedger {
            status: DraftStatus::NotStarted,
            league: None,
            board: Vec::new(),
            rosters: Vec::new(),
            available: BTreeMap::new(),
            cursor: 0,
        }
    }

    /// Build the board and load the player pool.
    ///
    /// Only valid once. On error the ledger stays `NotStarted`.
    pub fn start(
        &mut self,
        league: LeagueConfig,
        teams: Vec<Team>,
        players: Vec<PlayerRecord>,
    ) -> Result<()> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::AlreadyStarted);
        }

        let board = generate_board(&league, &teams)?;
        let available = build_pool(players)?;
        let rosters: Vec<TeamRoster> = teams.into_iter().map(TeamRoster::new).collect();

        info!(
            "Draft '{}' started: {} teams, {} rounds ({:?}), {} picks, {} players in pool",
            league.name,
            rosters.len(),
            league.rounds,
            league.draft_order,
            board.len(),
            available.len()
        );

        self.status = if board.is_empty() {
            DraftStatus::Complete
        } else {
            DraftStatus::InProgress
        };
        self.league = Some(league);
        self.board = board;
        self.rosters = rosters;
        self.available = available;
        self.cursor = 0;

        Ok(())
    }

    /// Commit the pick for the slot on the clock.
    ///
    /// Validation happens before any mutation, so a rejected pick leaves the
    /// ledger untouched. Returns the filled slot.
    pub fn commit_pick(&mut self, player_id: &str) -> Result<DraftSlot> {
        match self.status {
            DraftStatus::NotStarted => return Err(DraftError::SessionNotStarted),
            DraftStatus::Complete => return Err(DraftError::SessionComplete),
            DraftStatus::InProgress => {}
        }

        if !self.available.contains_key(player_id) {
            warn!("Rejected pick {}: player '{}' unavailable", self.cursor + 1, player_id);
            return Err(DraftError::PlayerUnavailable {
                player_id: player_id.to_string(),
            });
        }

        let team_id = self.board[self.cursor].team_id.clone();
        let team_idx = self.team_index(&team_id)?;

        let Some(player) = self.available.remove(player_id) else {
            return Err(DraftError::PlayerUnavailable {
                player_id: player_id.to_string(),
            });
        };

        self.rosters[team_idx].add_player(Arc::clone(&player));
        let slot = &mut self.board[self.cursor];
        slot.player = Some(player);
        let filled = slot.clone();
        self.cursor += 1;

        info!(
            "Pick {} (round {}.{}): {} selects {} ({})",
            filled.pick_number,
            filled.round,
            filled.round_pick,
            self.rosters[team_idx].team.team_name,
            filled.player.as_ref().map_or("", |p| p.player_name.as_str()),
            filled.player.as_ref().map_or("", |p| p.position.display_str()),
        );

        if self.cursor == self.board.len() {
            self.status = DraftStatus::Complete;
            info!("Draft complete after {} picks", self.cursor);
        }

        Ok(filled)
    }

    /// Full snapshot of the current state.
    pub fn snapshot(&self) -> Result<DraftSnapshot> {
        self.ensure_started()?;
        Ok(DraftSnapshot {
            status: self.status,
            board: self.board.clone(),
            rosters: self.rosters.clone(),
            available_players: self.available.values().cloned().collect(),
            cursor: self.cursor,
            total_picks: self.board.len(),
            current_slot: self.current_slot().cloned(),
        })
    }

    /// Remaining needs for a team, recomputed from its live roster.
    pub fn team_needs(&self, team_id: &str) -> Result<TeamNeeds> {
        let league = self.ensure_started()?;
        let roster = &self.rosters[self.team_index(team_id)?];
        Ok(compute_needs(roster, &league.roster))
    }

    /// Top `count` available players for a team at the current pick.
    pub fn recommendations(&self, team_id: &str, count: usize) -> Result<Vec<Recommendation>> {
        let needs = self.team_needs(team_id)?;
        Ok(recommend(
            self.available.values(),
            &needs,
            self.current_pick_number(),
            count,
        ))
    }

    /// Recommendations for the team on the clock, or `None` once the draft
    /// is complete.
    pub fn clock_recommendations(&self, count: usize) -> Result<Option<ClockRecommendations>> {
        self.ensure_started()?;
        let Some(slot) = self.current_slot() else {
            return Ok(None);
        };
        let recommendations = self.recommendations(&slot.team_id, count)?;
        Ok(Some(ClockRecommendations {
            slot: slot.clone(),
            recommendations,
        }))
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 1-indexed number of the pick on the clock.
    pub fn current_pick_number(&self) -> u32 {
        self.cursor as u32 + 1
    }

    pub fn current_slot(&self) -> Option<&DraftSlot> {
        self.board.get(self.cursor)
    }

    pub fn board(&self) -> &[DraftSlot] {
        &self.board
    }

    pub fn roster(&self, team_id: &str) -> Option<&TeamRoster> {
        self.rosters.iter().find(|r| r.team_id() == team_id)
    }

    pub fn is_available(&self, player_id: &str) -> bool {
        self.available.contains_key(player_id)
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    fn ensure_started(&self) -> Result<&LeagueConfig> {
        match (&self.status, &self.league) {
            (DraftStatus::NotStarted, _) | (_, None) => Err(DraftError::SessionNotStarted),
            (_, Some(league)) => Ok(league),
        }
    }

    fn team_index(&self, team_id: &str) -> Result<usize> {
        self.rosters
            .iter()
            .position(|r| r.team_id() == team_id)
            .ok_or_else(|| DraftError::TeamNotFound {
                team_id: team_id.to_string(),
            })
    }
}

/// Key the catalog by player id, rejecting duplicates, players listed at a
/// meta-slot and projections that are NaN or infinite.
fn build_pool(players: Vec<PlayerRecord>) -> std::result::Result<BTreeMap<String, Arc<PlayerRecord>>, ConfigError> {
    let mut pool = BTreeMap::new();
    for player in players {
        if player.position.is_meta_slot() {
            return Err(ConfigError::ValidationError {
                field: "players".into(),
                message: format!(
                    "player '{}' is listed at meta-slot {}",
                    player.player_id, player.position
                ),
            });
        }
        let numbers = [
            ("vorp", player.vorp),
            ("projected_points", player.projected_points),
            ("adp", player.adp),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::ValidationError {
                field: "players".into(),
                message: format!("player '{}' has non-finite {}", player.player_id, name),
            });
        }
        match pool.entry(player.player_id.clone()) {
            Entry::Occupied(_) => {
                return Err(ConfigError::ValidationError {
                    field: "players".into(),
                    message: format!("duplicate player_id '{}'", player.player_id),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(player));
            }
        }
    }
    Ok(pool)
}
