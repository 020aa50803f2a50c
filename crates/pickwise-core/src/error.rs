//! Error types for draft session operations.

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, DraftError>;

/// Rejections returned by [`DraftSession`](crate::draft::session::DraftSession).
///
/// None of these are retried by the engine; the caller decides whether to
/// resubmit.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("invalid league configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("draft session has already been started")]
    AlreadyStarted,

    #[error("draft session has not been started")]
    SessionNotStarted,

    #[error("draft is complete; no picks remain")]
    SessionComplete,

    #[error("player '{player_id}' is unknown or has already been drafted")]
    PlayerUnavailable { player_id: String },

    #[error("team '{team_id}' is not part of this draft")]
    TeamNotFound { team_id: String },
}
