// Player catalog loading.
//
// Reads the provider's flattened player export, either as a JSON array or as
// a CSV file with the same column names, and converts each row into a
// `PlayerRecord`. Rows that cannot be drafted (unknown position, meta-slot
// position, malformed CSV) are skipped with a warning.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::draft::player::{PlayerRecord, Position};

/// ADP assigned to players the provider has no draft data for.
pub const UNDRAFTED_ADP: f64 = 999.0;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("unsupported catalog format for {path}: expected .json or .csv")]
    UnsupportedFormat { path: String },
}

// ---------------------------------------------------------------------------
// Raw provider row (private)
// ---------------------------------------------------------------------------

/// One player as exported by the provider. Every numeric column is optional;
/// CSV exports leave blanks where JSON exports omit the key.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    player_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_position: String,
    #[serde(default)]
    editorial_team_abbr: Option<String>,
    #[serde(default)]
    projected_points: Option<f64>,
    #[serde(default)]
    average_draft_pick: Option<f64>,
    #[serde(default)]
    bye: Option<u8>,
    #[serde(default)]
    tier: Option<u32>,
    #[serde(default)]
    player_points_value: Option<f64>,
}

impl RawPlayer {
    /// Convert to a draftable record, or `None` if the position is not a
    /// player position.
    fn into_record(self) -> Option<PlayerRecord> {
        let player_id = self.player_id.trim().to_string();
        let position = match Position::from_str_pos(&self.display_position) {
            Some(pos) if !pos.is_meta_slot() => pos,
            _ => {
                warn!(
                    "skipping player '{}': unsupported position '{}'",
                    player_id, self.display_position
                );
                return None;
            }
        };

        let player_name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Player {player_id}"));

        Some(PlayerRecord {
            player_name,
            position,
            team_abbr: self
                .editorial_team_abbr
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
            projected_points: finite_or(self.projected_points, 0.0),
            adp: finite_or(self.average_draft_pick, UNDRAFTED_ADP),
            bye_week: self.bye.unwrap_or(0),
            tier: self.tier.unwrap_or(1),
            vorp: finite_or(self.player_points_value, 0.0),
            player_id,
        })
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_json_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, serde_json::Error> {
    let raw: Vec<RawPlayer> = serde_json::from_reader(rdr)?;
    Ok(raw.into_iter().filter_map(RawPlayer::into_record).collect())
}

fn load_csv_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => players.extend(raw.into_record()),
            Err(e) => warn!("skipping malformed player row: {}", e),
        }
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load the player catalog from `path`, choosing the parser by extension.
///
/// Catalog order is preserved; duplicate ids are left for the draft session
/// to reject.
pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, CatalogError> {
    let path_str = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let players = match extension.as_deref() {
        Some("json") => {
            let file = open(path, &path_str)?;
            load_json_from_reader(file).map_err(|source| CatalogError::Json {
                path: path_str.clone(),
                source,
            })?
        }
        Some("csv") => {
            let file = open(path, &path_str)?;
            load_csv_from_reader(file).map_err(|source| CatalogError::Csv {
                path: path_str.clone(),
                source,
            })?
        }
        _ => return Err(CatalogError::UnsupportedFormat { path: path_str }),
    };

    info!("Loaded {} players from {}", players.len(), path_str);
    Ok(players)
}

fn open(path: &Path, path_str: &str) -> Result<std::io::BufReader<std::fs::File>, CatalogError> {
    std::fs::File::open(path)
        .map(std::io::BufReader::new)
        .map_err(|source| CatalogError::Io {
            path: path_str.to_string(),
            source,
        })
}
