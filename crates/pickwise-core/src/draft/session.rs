// Shared draft session: a locked ledger plus observer fan-out.
//
// Every read and every commit goes through one mutex, so concurrent callers
// can never claim the same slot or player and never see a half-applied pick.
// Observers run after the lock is released; their failures are logged and
// do not affect the committed pick.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LeagueConfig;
use crate::draft::board::DraftSlot;
use crate::draft::ledger::{ClockRecommendations, DraftLedger, DraftSnapshot, DraftStatus};
use crate::draft::needs::TeamNeeds;
use crate::draft::player::PlayerRecord;
use crate::draft::roster::Team;
use crate::error::Result;
use crate::recommend::{Recommendation, DEFAULT_RECOMMENDATIONS};

/// Emitted after each successful commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickCommitted {
    /// The slot that was just filled.
    pub slot: DraftSlot,
    /// The slot now on the clock, if any.
    pub next_slot: Option<DraftSlot>,
    pub committed_at: DateTime<Utc>,
}

pub type PickObserver = Box<dyn Fn(&PickCommitted) -> anyhow::Result<()> + Send + Sync>;
pub type RecommendationObserver =
    Box<dyn Fn(&ClockRecommendations) -> anyhow::Result<()> + Send + Sync>;

/// One draft, shareable across threads behind an `Arc`.
pub struct DraftSession {
    ledger: Mutex<DraftLedger>,
    pick_observers: RwLock<Vec<PickObserver>>,
    recommendation_observers: RwLock<Vec<RecommendationObserver>>,
    /// How many recommendations to include in change notifications.
    notify_count: usize,
}

impl Default for DraftSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftSession {
    pub fn new() -> Self {
        Self::with_notify_count(DEFAULT_RECOMMENDATIONS)
    }

    /// Create a session whose recommendation notifications carry
    /// `notify_count` players.
    pub fn with_notify_count(notify_count: usize) -> Self {
        DraftSession {
            ledger: Mutex::new(DraftLedger::new()),
            pick_observers: RwLock::new(Vec::new()),
            recommendation_observers: RwLock::new(Vec::new()),
            notify_count,
        }
    }

    /// Build the board and load the catalog. Only valid once per session.
    pub fn start(
        &self,
        league: LeagueConfig,
        teams: Vec<Team>,
        players: Vec<PlayerRecord>,
    ) -> Result<()> {
        self.ledger().start(league, teams, players)
    }

    pub fn status(&self) -> DraftStatus {
        self.ledger().status()
    }

    /// Consistent snapshot of the whole draft.
    pub fn get_state(&self) -> Result<DraftSnapshot> {
        self.ledger().snapshot()
    }

    /// Commit a pick for the team on the clock and notify observers.
    pub fn commit_pick(&self, player_id: &str) -> Result<DraftSlot> {
        let (event, upcoming) = {
            let mut ledger = self.ledger();
            let slot = ledger.commit_pick(player_id)?;
            let next_slot = ledger.current_slot().cloned();
            let upcoming = ledger
                .clock_recommendations(self.notify_count)
                .ok()
                .flatten();
            let event = PickCommitted {
                slot,
                next_slot,
                committed_at: Utc::now(),
            };
            (event, upcoming)
        };

        self.notify_pick(&event);
        if let Some(upcoming) = upcoming {
            self.notify_recommendations(&upcoming);
        }

        Ok(event.slot)
    }

    /// Top `count` available players for `team_id` at the current pick.
    pub fn get_recommendations(&self, team_id: &str, count: usize) -> Result<Vec<Recommendation>> {
        self.ledger().recommendations(team_id, count)
    }

    /// Recommendations for whichever team is on the clock; `None` once the
    /// draft is complete.
    pub fn recommendations_for_current_pick(
        &self,
        count: usize,
    ) -> Result<Option<ClockRecommendations>> {
        self.ledger().clock_recommendations(count)
    }

    pub fn team_needs(&self, team_id: &str) -> Result<TeamNeeds> {
        self.ledger().team_needs(team_id)
    }

    /// Register a callback fired after every successful pick.
    ///
    /// Callbacks run after the ledger lock is released, so picks committed
    /// from several threads may be delivered out of order. Consumers that
    /// care about order should sort on `slot.pick_number`. Callbacks must not
    /// register further observers.
    pub fn on_pick_committed<F>(&self, observer: F)
    where
        F: Fn(&PickCommitted) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pick_observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Register a callback fired with fresh recommendations for the next team
    /// on the clock after every successful pick.
    ///
    /// Delivery order follows the same rules as [`Self::on_pick_committed`];
    /// `slot.pick_number` names the pick the recommendations were computed for.
    pub fn on_recommendations_changed<F>(&self, observer: F)
    where
        F: Fn(&ClockRecommendations) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.recommendation_observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    fn ledger(&self) -> MutexGuard<'_, DraftLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_pick(&self, event: &PickCommitted) {
        let observers = self
            .pick_observers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        debug!("Notifying {} pick observers", observers.len());
        for observer in observers.iter() {
            if let Err(e) = observer(event) {
                warn!("Pick observer failed for pick {}: {e:#}", event.slot.pick_number);
            }
        }
    }

    fn notify_recommendations(&self, upcoming: &ClockRecommendations) {
        let observers = self
            .recommendation_observers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            if let Err(e) = observer(upcoming) {
                warn!(
                    "Recommendation observer failed for pick {}: {e:#}",
                    upcoming.slot.pick_number
                );
            }
        }
    }
}
