// Team identity and the per-team roster of drafted players.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::player::{PlayerRecord, Position};

/// A fantasy team participating in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub team_name: String,
    #[serde(default)]
    pub owner_name: String,
}

impl Team {
    pub fn new(
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        owner_name: impl Into<String>,
    ) -> Self {
        Team {
            team_id: team_id.into(),
            team_name: team_name.into(),
            owner_name: owner_name.into(),
        }
    }
}

/// The players a team has drafted, bucketed by position.
///
/// Buckets only grow; players are kept in the order they were drafted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team: Team,
    pub players: BTreeMap<Position, Vec<Arc<PlayerRecord>>>,
}

impl TeamRoster {
    pub fn new(team: Team) -> Self {
        TeamRoster {
            team,
            players: BTreeMap::new(),
        }
    }

    pub fn team_id(&self) -> &str {
        &self.team.team_id
    }

    /// Append a drafted player to the bucket for their position.
    pub(crate) fn add_player(&mut self, player: Arc<PlayerRecord>) {
        self.players.entry(player.position).or_default().push(player);
    }

    /// Number of drafted players listed at `pos`.
    pub fn count(&self, pos: Position) -> usize {
        self.players.get(&pos).map_or(0, Vec::len)
    }

    /// Total number of drafted players across all positions.
    pub fn total(&self) -> usize {
        self.players.values().map(Vec::len).sum()
    }

    /// Whether the given player id is on this roster.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players
            .values()
            .flatten()
            .any(|p| p.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, position: Position) -> Arc<PlayerRecord> {
        Arc::new(PlayerRecord {
            player_id: id.into(),
            player_name: format!("Player {id}"),
            position,
            team_abbr: "KC".into(),
            projected_points: 100.0,
            adp: 10.0,
            bye_week: 6,
            tier: 1,
            vorp: 20.0,
        })
    }

    #[test]
    fn new_roster_is_empty() {
        let roster = TeamRoster::new(Team::new("T1", "Team 1", "Owner 1"));
        assert_eq!(roster.total(), 0);
        assert_eq!(roster.count(Position::Quarterback), 0);
        assert_eq!(roster.team_id(), "T1");
    }

    #[test]
    fn add_player_buckets_by_position() {
        let mut roster = TeamRoster::new(Team::new("T1", "Team 1", "Owner 1"));
        roster.add_player(player("rb1", Position::RunningBack));
        roster.add_player(player("wr1", Position::WideReceiver));
        roster.add_player(player("rb2", Position::RunningBack));

        assert_eq!(roster.count(Position::RunningBack), 2);
        assert_eq!(roster.count(Position::WideReceiver), 1);
        assert_eq!(roster.total(), 3);
    }

    #[test]
    fn bucket_preserves_draft_order() {
        let mut roster = TeamRoster::new(Team::new("T1", "Team 1", "Owner 1"));
        roster.add_player(player("rb_b", Position::RunningBack));
        roster.add_player(player("rb_a", Position::RunningBack));

        let ids: Vec<&str> = roster.players[&Position::RunningBack]
            .iter()
            .map(|p| p.player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["rb_b", "rb_a"]);
    }

    #[test]
    fn has_player_checks_all_buckets() {
        let mut roster = TeamRoster::new(Team::new("T1", "Team 1", "Owner 1"));
        roster.add_player(player("te1", Position::TightEnd));
        assert!(roster.has_player("te1"));
        assert!(!roster.has_player("qb1"));
    }
}
