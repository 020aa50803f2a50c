// League and app configuration.
//
// Everything is resolved against one base directory: `$PICKWISE_HOME` when
// set, the working directory otherwise. `config/league.toml` describes the
// league, its roster plan and the ordered team list; `config/app.toml` holds
// the relay port, the catalog path and the recommendation count. A fresh
// base is seeded from the shipped `defaults/` copies of those two files.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::draft::board::{validate_teams, DraftOrder};
use crate::draft::player::Position;
use crate::draft::roster::Team;
use crate::recommend::DEFAULT_RECOMMENDATIONS;

/// Environment variable that overrides the base directory.
pub const HOME_ENV_VAR: &str = "PICKWISE_HOME";

/// League settings file under `config/`.
pub const LEAGUE_FILE: &str = "league.toml";
/// Relay and catalog settings file under `config/`.
pub const APP_FILE: &str = "app.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid TOML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("cannot seed config/ from defaults/: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the relative paths below are resolved against.
    pub base_dir: PathBuf,
    pub league: LeagueConfig,
    /// Teams in first-round draft order.
    pub teams: Vec<Team>,
    pub ws_port: u16,
    pub data_paths: DataPaths,
    /// Recommendations pushed after each pick and returned by default.
    pub recommendation_count: usize,
}

impl Config {
    /// Absolute location of the player catalog.
    pub fn players_path(&self) -> PathBuf {
        self.base_dir.join(&self.data_paths.players)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    pub rounds: u32,
    pub draft_order: DraftOrder,
    pub roster: RosterRequirements,
}

/// Required spots per slot, e.g.
/// `{QB = 1, RB = 2, WR = 2, TE = 1, FLEX = 1, K = 1, DEF = 1, BENCH = 6}`.
///
/// Keys go through the same alias table as player positions, so `BN` and
/// `D/ST` are accepted; naming one slot twice is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, usize>")]
pub struct RosterRequirements(BTreeMap<Position, usize>);

impl RosterRequirements {
    /// Required count for a slot type (0 when absent).
    pub fn required(&self, pos: Position) -> usize {
        self.0.get(&pos).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, usize)> + '_ {
        self.0.iter().map(|(&pos, &n)| (pos, n))
    }
}

impl FromIterator<(Position, usize)> for RosterRequirements {
    fn from_iter<I: IntoIterator<Item = (Position, usize)>>(iter: I) -> Self {
        RosterRequirements(iter.into_iter().collect())
    }
}

impl TryFrom<HashMap<String, usize>> for RosterRequirements {
    type Error = String;

    fn try_from(raw: HashMap<String, usize>) -> Result<Self, Self::Error> {
        // Sorted so the reported pair does not depend on hash order.
        let mut keys: Vec<(String, usize)> = raw.into_iter().collect();
        keys.sort();

        let mut slots: BTreeMap<Position, (String, usize)> = BTreeMap::new();
        for (key, count) in keys {
            let pos = Position::from_str_pos(&key)
                .ok_or_else(|| format!("unknown roster slot '{key}'"))?;
            if let Some((first, _)) = slots.get(&pos) {
                return Err(format!(
                    "roster slots '{first}' and '{key}' both name {pos}"
                ));
            }
            slots.insert(pos, (key, count));
        }
        Ok(slots
            .into_iter()
            .map(|(pos, (_, count))| (pos, count))
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Player catalog (.json or .csv), relative to the base directory.
    pub players: String,
}

// ---------------------------------------------------------------------------
// File layouts (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
struct AppFile {
    websocket: WebsocketSection,
    data_paths: DataPaths,
    #[serde(default)]
    recommendations: RecommendationsSection,
}

#[derive(Debug, Deserialize)]
struct WebsocketSection {
    port: u16,
}

#[derive(Debug, Deserialize)]
struct RecommendationsSection {
    count: usize,
}

impl Default for RecommendationsSection {
    fn default() -> Self {
        RecommendationsSection {
            count: DEFAULT_RECOMMENDATIONS,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// The base directory: `$PICKWISE_HOME` when set and non-empty, otherwise
/// the current working directory.
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    match std::env::var_os(HOME_ENV_VAR) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
            path: PathBuf::from("."),
        }),
    }
}

/// Seed, load and validate configuration from [`base_dir`].
pub fn load_config() -> Result<Config, ConfigError> {
    let base = base_dir()?;
    seed_config_files(&base)?;
    load_config_from(&base)
}

/// Load and validate `config/league.toml` and `config/app.toml` under
/// `base`, without seeding.
pub fn load_config_from(base: &Path) -> Result<Config, ConfigError> {
    let config_dir = base.join("config");
    let league_file: LeagueFile = read_toml(&config_dir.join(LEAGUE_FILE))?;
    let app_file: AppFile = read_toml(&config_dir.join(APP_FILE))?;

    let config = Config {
        base_dir: base.to_path_buf(),
        league: league_file.league,
        teams: league_file.teams,
        ws_port: app_file.websocket.port,
        data_paths: app_file.data_paths,
        recommendation_count: app_file.recommendations.count,
    };
    validate(&config)?;
    Ok(config)
}

/// Copy `league.toml` / `app.toml` from `defaults/` into `config/` for each
/// one that is missing. Existing files are left alone. Returns the paths
/// that were written.
pub fn seed_config_files(base: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base.join("config");
    let defaults_dir = base.join("defaults");
    let mut seeded = Vec::new();

    for name in [LEAGUE_FILE, APP_FILE] {
        let target = config_dir.join(name);
        if target.is_file() {
            continue;
        }
        let source = defaults_dir.join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "{} is missing and there is no {}; run from the project root or set {HOME_ENV_VAR}",
                    target.display(),
                    source.display()
                ),
            });
        }

        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot copy {} to {}: {e}", source.display(), target.display()),
        })?;
        info!("Seeded {} from defaults", target.display());
        seeded.push(target);
    }

    Ok(seeded)
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    validate_teams(&config.league, &config.teams)?;

    if config.recommendation_count == 0 {
        return Err(ConfigError::ValidationError {
            field: "recommendations.count".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}
