// Application state and orchestration logic.
//
// The event loop that turns viewer commands from the WebSocket relay into
// draft session calls. Draft events from the session observers go to every
// viewer; answers to GET_STATE, GET_RECOMMENDATIONS and rejected picks go
// only to the viewer that asked.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use pickwise_core::draft::session::DraftSession;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::ws_server::{ReplyTx, WsEvent};

/// Capacity of the outbound broadcast channel shared by all viewers.
pub const OUTBOUND_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub session: Arc<DraftSession>,
    /// Serialized draft events for every connected viewer.
    pub outbound: broadcast::Sender<String>,
    /// Recommendation count used when a viewer does not ask for one.
    pub recommendation_count: usize,
    /// Reply queue of each connected viewer, keyed by address.
    pub viewers: HashMap<String, ReplyTx>,
}

impl AppState {
    pub fn new(
        session: Arc<DraftSession>,
        outbound: broadcast::Sender<String>,
        recommendation_count: usize,
    ) -> Self {
        AppState {
            session,
            outbound,
            recommendation_count,
            viewers: HashMap::new(),
        }
    }

    /// Queue `msg` for the viewer at `addr` only. A viewer that has gone
    /// away or stopped reading loses the reply.
    pub fn reply_to(&self, addr: &str, msg: &ServerMessage) {
        let Some(ReplyTx(reply)) = self.viewers.get(addr) else {
            debug!("Reply for unknown viewer {} dropped", addr);
            return;
        };
        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize reply: {}", e);
                return;
            }
        };
        match reply.try_send(json) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Viewer {} is not reading; reply dropped", addr),
            Err(TrySendError::Closed(_)) => debug!("Viewer {} already gone; reply dropped", addr),
        }
    }
}

/// Serialize `msg` and send it to every viewer. Having no viewers connected
/// is not an error.
pub fn publish(outbound: &broadcast::Sender<String>, msg: &ServerMessage) {
    let json = match msg.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize server message: {}", e);
            return;
        }
    };
    if outbound.send(json).is_err() {
        debug!("No viewers connected; message dropped");
    }
}

/// Register session observers that publish pick, completion and
/// recommendation events to viewers.
pub fn forward_session_events(session: &DraftSession, outbound: &broadcast::Sender<String>) {
    let picks = outbound.clone();
    session.on_pick_committed(move |event| {
        publish(&picks, &ServerMessage::draft_update(event.slot.clone()));
        if event.next_slot.is_none() {
            publish(&picks, &ServerMessage::draft_complete(event.slot.pick_number));
        }
        Ok(())
    });

    let recs = outbound.clone();
    session.on_recommendations_changed(move |upcoming| {
        publish(
            &recs,
            &ServerMessage::recommendation_update(
                upcoming.slot.team_id.clone(),
                upcoming.recommendations.clone(),
            ),
        );
        Ok(())
    });
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Uses `tokio::select!` over viewer events from the relay and the
/// `shutdown` future. Exits when either fires or the relay channel closes.
pub async fn run<F>(
    mut ws_rx: mpsc::Receiver<WsEvent>,
    shutdown: F,
    mut state: AppState,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    info!("Application event loop started");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(WsEvent::Connected { addr, reply }) => {
                        state.viewers.insert(addr.clone(), reply);
                        info!("Viewer connected from {} ({} connected)", addr, state.viewers.len());
                    }
                    Some(WsEvent::Disconnected { addr }) => {
                        state.viewers.remove(&addr);
                        info!("Viewer {} disconnected ({} connected)", addr, state.viewers.len());
                    }
                    Some(WsEvent::Message { addr, text }) => {
                        if let Some(reply) = handle_ws_message(&state, &text) {
                            state.reply_to(&addr, &reply);
                        }
                    }
                    None => {
                        info!("WebSocket channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Handle one viewer message and return the reply for that viewer, if any.
///
/// Successful picks have no direct reply: the session observers publish the
/// DRAFT_UPDATE to every viewer, including the one who picked.
pub fn handle_ws_message(state: &AppState, json_str: &str) -> Option<ServerMessage> {
    let msg: ClientMessage = match serde_json::from_str(json_str) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse viewer message: {}", e);
            return Some(ServerMessage::error(format!("invalid message: {e}")));
        }
    };

    match msg {
        ClientMessage::MakePick { player_id } => match state.session.commit_pick(&player_id) {
            Ok(_) => None,
            Err(e) => Some(ServerMessage::error(e.to_string())),
        },
        ClientMessage::GetState => match state.session.get_state() {
            Ok(snapshot) => Some(ServerMessage::state(snapshot)),
            Err(e) => Some(ServerMessage::error(e.to_string())),
        },
        ClientMessage::GetRecommendations { team_id, count } => {
            let count = count.unwrap_or(state.recommendation_count);
            Some(recommendations_reply(&state.session, team_id, count))
        }
    }
}

fn recommendations_reply(
    session: &DraftSession,
    team_id: Option<String>,
    count: usize,
) -> ServerMessage {
    match team_id {
        Some(team_id) => match session.get_recommendations(&team_id, count) {
            Ok(recs) => ServerMessage::recommendation_update(team_id, recs),
            Err(e) => ServerMessage::error(e.to_string()),
        },
        None => match session.recommendations_for_current_pick(count) {
            Ok(Some(clock)) => {
                ServerMessage::recommendation_update(clock.slot.team_id, clock.recommendations)
            }
            Ok(None) => ServerMessage::error("draft is complete; no team is on the clock"),
            Err(e) => ServerMessage::error(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickwise_core::config::{LeagueConfig, RosterRequirements};
    use pickwise_core::draft::board::DraftOrder;
    use pickwise_core::draft::player::{PlayerRecord, Position};
    use pickwise_core::draft::roster::Team;
    use serde_json::Value;

    fn started_session() -> Arc<DraftSession> {
        let league = LeagueConfig {
            name: "App Test".into(),
            num_teams: 2,
            rounds: 1,
            draft_order: DraftOrder::Snake,
            roster: RosterRequirements::from_iter([(Position::Quarterback, 1)]),
        };
        let teams = vec![Team::new("T1", "Team 1", "Owner 1"), Team::new("T2", "Team 2", "Owner 2")];
        let players = ["qb1", "qb2", "qb3"]
            .iter()
            .map(|id| PlayerRecord {
                player_id: id.to_string(),
                player_name: id.to_uppercase(),
                position: Position::Quarterback,
                team_abbr: "KC".into(),
                projected_points: 300.0,
                adp: 10.0,
                bye_week: 6,
                tier: 1,
                vorp: 40.0,
            })
            .collect();
        let session = Arc::new(DraftSession::new());
        session.start(league, teams, players).unwrap();
        session
    }

    fn app_state() -> (AppState, broadcast::Receiver<String>) {
        let (outbound, rx) = broadcast::channel(OUTBOUND_CAPACITY);
        let session = started_session();
        forward_session_events(&session, &outbound);
        (AppState::new(session, outbound, 2), rx)
    }

    fn message_type(msg: &ServerMessage) -> String {
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        value["type"].as_str().unwrap().to_string()
    }

    #[test]
    fn malformed_json_replies_with_error() {
        let (state, _rx) = app_state();
        let reply = handle_ws_message(&state, "{not json").unwrap();
        assert_eq!(message_type(&reply), "ERROR");
    }

    #[test]
    fn successful_pick_is_published_by_observers() {
        let (state, mut rx) = app_state();
        let reply = handle_ws_message(&state, r#"{"type":"MAKE_PICK","player_id":"qb1"}"#);
        assert!(reply.is_none());

        let update: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(update["type"], "DRAFT_UPDATE");
        assert_eq!(update["pick"]["player"]["player_id"], "qb1");

        let recs: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(recs["type"], "RECOMMENDATION_UPDATE");
        assert_eq!(recs["team_id"], "T2");
        assert_eq!(recs["recommendations"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn last_pick_publishes_draft_complete() {
        let (state, mut rx) = app_state();
        handle_ws_message(&state, r#"{"type":"MAKE_PICK","player_id":"qb1"}"#);
        handle_ws_message(&state, r#"{"type":"MAKE_PICK","player_id":"qb2"}"#);

        let types: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|json| {
                let v: Value = serde_json::from_str(&json).unwrap();
                v["type"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            types,
            vec!["DRAFT_UPDATE", "RECOMMENDATION_UPDATE", "DRAFT_UPDATE", "DRAFT_COMPLETE"]
        );
    }

    #[test]
    fn rejected_pick_replies_with_error() {
        let (state, mut rx) = app_state();
        let reply = handle_ws_message(&state, r#"{"type":"MAKE_PICK","player_id":"ghost"}"#).unwrap();
        match reply {
            ServerMessage::Error { message, .. } => assert!(message.contains("ghost")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn get_recommendations_defaults_to_team_on_clock() {
        let (state, _rx) = app_state();
        let reply = handle_ws_message(&state, r#"{"type":"GET_RECOMMENDATIONS"}"#).unwrap();
        match reply {
            ServerMessage::RecommendationUpdate {
                team_id,
                recommendations,
                ..
            } => {
                assert_eq!(team_id, "T1");
                assert_eq!(recommendations.len(), 2);
            }
            other => panic!("expected recommendations, got {other:?}"),
        }
    }

    #[test]
    fn get_recommendations_for_unknown_team_is_error() {
        let (state, _rx) = app_state();
        let reply =
            handle_ws_message(&state, r#"{"type":"GET_RECOMMENDATIONS","team_id":"T9"}"#).unwrap();
        assert_eq!(message_type(&reply), "ERROR");
    }

    #[test]
    fn get_state_returns_snapshot() {
        let (state, _rx) = app_state();
        let reply = handle_ws_message(&state, r#"{"type":"GET_STATE"}"#).unwrap();
        match reply {
            ServerMessage::State { snapshot, .. } => {
                assert_eq!(snapshot.total_picks, 2);
                assert_eq!(snapshot.available_players.len(), 3);
            }
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn replies_reach_only_the_addressed_viewer() {
        let (mut state, mut rx) = app_state();
        let (a_tx, mut a_rx) = mpsc::channel(4);
        let (b_tx, mut b_rx) = mpsc::channel(4);
        state.viewers.insert("a".into(), ReplyTx(a_tx));
        state.viewers.insert("b".into(), ReplyTx(b_tx));

        state.reply_to("a", &ServerMessage::error("not your turn"));
        state.reply_to("gone", &ServerMessage::error("nobody home"));

        let reply: Value = serde_json::from_str(&a_rx.try_recv().unwrap()).unwrap();
        assert_eq!(reply["message"], "not your turn");
        assert!(b_rx.try_recv().is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_reply_queue_drops_instead_of_blocking() {
        let (mut state, _rx) = app_state();
        let (tx, mut reply_rx) = mpsc::channel(1);
        state.viewers.insert("slow".into(), ReplyTx(tx));

        state.reply_to("slow", &ServerMessage::error("first"));
        state.reply_to("slow", &ServerMessage::error("second"));

        let first: Value = serde_json::from_str(&reply_rx.try_recv().unwrap()).unwrap();
        assert_eq!(first["message"], "first");
        assert!(reply_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_tracks_viewers_by_address() {
        let (state, _rx) = app_state();
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let (reply, mut replies) = mpsc::channel(4);
        ws_tx
            .send(WsEvent::Connected { addr: "a".into(), reply: ReplyTx(reply) })
            .await
            .unwrap();
        ws_tx.send(WsEvent::Disconnected { addr: "a".into() }).await.unwrap();
        ws_tx
            .send(WsEvent::Message { addr: "a".into(), text: r#"{"type":"GET_STATE"}"#.into() })
            .await
            .unwrap();
        drop(ws_tx);

        run(ws_rx, std::future::pending(), state).await.unwrap();

        // The viewer left before asking, so its queue is closed and empty.
        assert!(replies.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_exits_when_channel_closes() {
        let (state, _rx) = app_state();
        let (ws_tx, ws_rx) = mpsc::channel(8);
        drop(ws_tx);
        run(ws_rx, std::future::pending(), state).await.unwrap();
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let (state, _rx) = app_state();
        let (_ws_tx, ws_rx) = mpsc::channel::<WsEvent>(8);
        run(ws_rx, std::future::ready(()), state).await.unwrap();
    }
}
