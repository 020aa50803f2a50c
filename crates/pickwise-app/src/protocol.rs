// WebSocket message protocol between draft viewers and the pickwise server.
//
// All messages are JSON objects tagged by a SCREAMING_SNAKE_CASE `type`
// field. Server messages carry an RFC 3339 `timestamp`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pickwise_core::draft::board::DraftSlot;
use pickwise_core::draft::ledger::DraftSnapshot;
use pickwise_core::recommend::Recommendation;

// ---------------------------------------------------------------------------
// Viewer -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Draft `player_id` for the team on the clock.
    MakePick { player_id: String },
    /// Request a full state snapshot.
    GetState,
    /// Request recommendations. Without `team_id` the team on the clock is
    /// used; without `count` the configured default applies.
    GetRecommendations {
        #[serde(default)]
        team_id: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },
}

// ---------------------------------------------------------------------------
// Server -> viewers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    DraftUpdate {
        timestamp: DateTime<Utc>,
        pick: DraftSlot,
    },
    RecommendationUpdate {
        timestamp: DateTime<Utc>,
        team_id: String,
        recommendations: Vec<Recommendation>,
    },
    State {
        timestamp: DateTime<Utc>,
        snapshot: Box<DraftSnapshot>,
    },
    DraftComplete {
        timestamp: DateTime<Utc>,
        total_picks: u32,
    },
    Error {
        timestamp: DateTime<Utc>,
        message: String,
    },
}

impl ServerMessage {
    pub fn draft_update(pick: DraftSlot) -> Self {
        ServerMessage::DraftUpdate {
            timestamp: Utc::now(),
            pick,
        }
    }

    pub fn recommendation_update(team_id: String, recommendations: Vec<Recommendation>) -> Self {
        ServerMessage::RecommendationUpdate {
            timestamp: Utc::now(),
            team_id,
            recommendations,
        }
    }

    pub fn state(snapshot: DraftSnapshot) -> Self {
        ServerMessage::State {
            timestamp: Utc::now(),
            snapshot: Box::new(snapshot),
        }
    }

    pub fn draft_complete(total_picks: u32) -> Self {
        ServerMessage::DraftComplete {
            timestamp: Utc::now(),
            total_picks,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn make_pick_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"MAKE_PICK","player_id":"nfl.p.30001"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::MakePick {
                player_id: "nfl.p.30001".into()
            }
        );
    }

    #[test]
    fn get_state_has_no_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"GET_STATE"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetState);
    }

    #[test]
    fn get_recommendations_fields_are_optional() {
        let bare: ClientMessage =
            serde_json::from_str(r#"{"type":"GET_RECOMMENDATIONS"}"#).unwrap();
        assert_eq!(
            bare,
            ClientMessage::GetRecommendations {
                team_id: None,
                count: None
            }
        );

        let full: ClientMessage = serde_json::from_str(
            r#"{"type":"GET_RECOMMENDATIONS","team_id":"T03","count":3}"#,
        )
        .unwrap();
        assert_eq!(
            full,
            ClientMessage::GetRecommendations {
                team_id: Some("T03".into()),
                count: Some(3)
            }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"UNDO_PICK"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"player_id":"x"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn server_messages_are_type_tagged_with_timestamp() {
        let json = ServerMessage::error("player 'x' is unknown").to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "ERROR");
        assert_eq!(value["message"], "player 'x' is unknown");
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");

        let json = ServerMessage::draft_complete(180).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "DRAFT_COMPLETE");
        assert_eq!(value["total_picks"], 180);
    }

    #[test]
    fn recommendation_update_serializes_players_inline() {
        let json = ServerMessage::recommendation_update("T01".into(), vec![])
            .to_json()
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "RECOMMENDATION_UPDATE");
        assert_eq!(value["team_id"], "T01");
        assert!(value["recommendations"].as_array().unwrap().is_empty());
    }
}
