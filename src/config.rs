//! Application-level configuration loading, including the built-in game defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MISSION_CONTROL_CONFIG_PATH";

const DEFAULT_ROUND_NAME: &str = "Mission Alpha";
const DEFAULT_ROUND_DETAILS: &str = "Complete all tasks to prepare the spaceship for departure. Work together as a team, but beware of impostors among you!";
const DEFAULT_NEXT_ROUND_NAME: &str = "Mission Beta";
const DEFAULT_NEXT_ROUND_DETAILS: &str = "New challenges await! Complete the reactor tasks and identify the impostor before time runs out.";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    defaults: GameDefaults,
    history_limit: i64,
    actions_limit: i64,
}

/// Values a fresh game starts from; `end_game` restores exactly these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDefaults {
    /// Display name of the first round.
    pub round_name: String,
    /// Display text of the first round.
    pub round_details: String,
    /// Timer budget (seconds) of the current round.
    pub current_timer: u64,
    /// Timer budget (seconds) used when a round expires naturally.
    pub next_timer: u64,
    /// Placeholder name for the queued round.
    pub next_round_name: String,
    /// Placeholder text for the queued round.
    pub next_round_details: String,
    /// Placeholder timer budget (seconds) for the queued round.
    pub next_round_timer: u64,
    /// Planned number of rounds (informational).
    pub total_rounds: u32,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            round_name: DEFAULT_ROUND_NAME.into(),
            round_details: DEFAULT_ROUND_DETAILS.into(),
            current_timer: 300,
            next_timer: 180,
            next_round_name: DEFAULT_NEXT_ROUND_NAME.into(),
            next_round_details: DEFAULT_NEXT_ROUND_DETAILS.into(),
            next_round_timer: 300,
            total_rounds: 4,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        round = %app_config.defaults.round_name,
                        "loaded game defaults from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Defaults used for first-ever initialisation and for `end_game`.
    pub fn defaults(&self) -> &GameDefaults {
        &self.defaults
    }

    /// Maximum number of round history entries returned by the history listing.
    pub fn history_limit(&self) -> i64 {
        self.history_limit
    }

    /// Maximum number of audit entries returned by the admin action listing.
    pub fn actions_limit(&self) -> i64 {
        self.actions_limit
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: GameDefaults::default(),
            history_limit: 20,
            actions_limit: 50,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    defaults: RawDefaults,
    history_limit: Option<i64>,
    actions_limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
/// Every field is optional; anything omitted keeps its built-in value.
struct RawDefaults {
    round_name: Option<String>,
    round_details: Option<String>,
    current_timer: Option<u64>,
    next_timer: Option<u64>,
    next_round_name: Option<String>,
    next_round_details: Option<String>,
    next_round_timer: Option<u64>,
    total_rounds: Option<u32>,
}

impl From<RawDefaults> for GameDefaults {
    fn from(value: RawDefaults) -> Self {
        let base = GameDefaults::default();
        Self {
            round_name: value.round_name.unwrap_or(base.round_name),
            round_details: value.round_details.unwrap_or(base.round_details),
            current_timer: value.current_timer.unwrap_or(base.current_timer),
            next_timer: value.next_timer.unwrap_or(base.next_timer),
            next_round_name: value.next_round_name.unwrap_or(base.next_round_name),
            next_round_details: value.next_round_details.unwrap_or(base.next_round_details),
            next_round_timer: value.next_round_timer.unwrap_or(base.next_round_timer),
            total_rounds: value.total_rounds.unwrap_or(base.total_rounds),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let base = AppConfig::default();
        Self {
            defaults: value.defaults.into(),
            history_limit: value
                .history_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(base.history_limit),
            actions_limit: value
                .actions_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(base.actions_limit),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_builtin_values() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "defaults": { "roundName": "Mission Zero", "currentTimer": 120 }, "historyLimit": 5 }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.defaults().round_name, "Mission Zero");
        assert_eq!(config.defaults().current_timer, 120);
        assert_eq!(config.defaults().next_timer, 180);
        assert_eq!(config.defaults().next_round_name, "Mission Beta");
        assert_eq!(config.history_limit(), 5);
        assert_eq!(config.actions_limit(), 50);
    }

    #[test]
    fn non_positive_limits_are_ignored() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "historyLimit": 0, "actionsLimit": -3 }"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.history_limit(), 20);
        assert_eq!(config.actions_limit(), 50);
    }
}
