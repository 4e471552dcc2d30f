use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::reports::pipeline::DEFAULT_MOVE_LOOKBACK_DAYS;
use crate::workflows::reports::{PipelineSettings, ReportDestinations};
use crate::workflows::trello::{TrelloConfig, DEFAULT_API_URL};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub board: BoardConfig,
    pub reports: ReportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let board = BoardConfig {
            api_url: optional("TRELLO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            key: optional("TRELLO_KEY"),
            token: optional("TRELLO_TOKEN"),
            board_id: optional("TRELLO_BOARD_ID"),
        };

        let reports = ReportConfig {
            destinations: ReportDestinations {
                billing: optional("BILLING_REPORT_CARD"),
                vacancy: optional("VACANCY_REPORT_CARD"),
                starter: optional("STARTERS_REPORT_CARD"),
                candidate: optional("CANDIDATE_REPORT_CARD"),
                moves: optional("MOVE_REPORT_CARD"),
            },
            hash_dir: optional("REPORT_HASH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/tmp")),
            move_lookback_days: match optional("MOVE_LOOKBACK_DAYS") {
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        var: "MOVE_LOOKBACK_DAYS",
                        value: raw,
                    })?,
                None => DEFAULT_MOVE_LOOKBACK_DAYS,
            },
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            board,
            reports,
        })
    }
}

fn optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Trello credentials. Optional until a command needs the live board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub api_url: String,
    pub key: Option<String>,
    pub token: Option<String>,
    pub board_id: Option<String>,
}

impl BoardConfig {
    pub fn trello(&self) -> Result<TrelloConfig, ConfigError> {
        let key = self.key.clone().ok_or(ConfigError::Missing("TRELLO_KEY"))?;
        let token = self
            .token
            .clone()
            .ok_or(ConfigError::Missing("TRELLO_TOKEN"))?;
        let board_id = self
            .board_id
            .clone()
            .ok_or(ConfigError::Missing("TRELLO_BOARD_ID"))?;

        Ok(TrelloConfig {
            api_url: self.api_url.trim_end_matches('/').to_string(),
            key,
            token,
            board_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub destinations: ReportDestinations,
    pub hash_dir: PathBuf,
    pub move_lookback_days: u32,
}

impl ReportConfig {
    pub fn pipeline_settings(&self, dry_run: bool) -> PipelineSettings {
        PipelineSettings {
            destinations: self.destinations.clone(),
            move_lookback_days: self.move_lookback_days,
            dry_run,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str, value: String },
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative whole number, got '{value}'")
            }
            ConfigError::Missing(var) => write!(f, "{var} must be set to talk to the board"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::Missing(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::reports::ReportKind;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARS: [&str; 15] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "TRELLO_API_URL",
        "TRELLO_KEY",
        "TRELLO_TOKEN",
        "TRELLO_BOARD_ID",
        "BILLING_REPORT_CARD",
        "VACANCY_REPORT_CARD",
        "STARTERS_REPORT_CARD",
        "CANDIDATE_REPORT_CARD",
        "MOVE_REPORT_CARD",
        "REPORT_HASH_DIR",
        "MOVE_LOOKBACK_DAYS",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.board.api_url, DEFAULT_API_URL);
        assert_eq!(config.reports.hash_dir, PathBuf::from("/tmp"));
        assert_eq!(config.reports.move_lookback_days, 7);
        assert_eq!(config.reports.destinations, ReportDestinations::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_destinations_and_lookback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("VACANCY_REPORT_CARD", "card-v");
        env::set_var("MOVE_REPORT_CARD", "  ");
        env::set_var("MOVE_LOOKBACK_DAYS", "14");
        env::set_var("REPORT_HASH_DIR", "/var/lib/reports");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        let settings = config.reports.pipeline_settings(true);
        assert!(settings.dry_run);
        assert_eq!(settings.move_lookback_days, 14);
        assert_eq!(settings.destinations.card_for(ReportKind::Vacancy), Some("card-v"));
        assert_eq!(settings.destinations.card_for(ReportKind::Move), None);
        assert_eq!(config.reports.hash_dir, PathBuf::from("/var/lib/reports"));
        reset_env();
    }

    #[test]
    fn rejects_bad_lookback() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MOVE_LOOKBACK_DAYS", "a week");
        let err = AppConfig::load().expect_err("lookback must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { var: "MOVE_LOOKBACK_DAYS", .. }
        ));
        reset_env();
    }

    #[test]
    fn trello_settings_require_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRELLO_KEY", "key");
        env::set_var("TRELLO_TOKEN", "token");
        let config = AppConfig::load().expect("config loads");
        let err = config.board.trello().expect_err("board id missing");
        assert!(matches!(err, ConfigError::Missing("TRELLO_BOARD_ID")));

        env::set_var("TRELLO_BOARD_ID", "board-1");
        env::set_var("TRELLO_API_URL", "http://localhost:9000/1/");
        let trello = AppConfig::load()
            .expect("config loads")
            .board
            .trello()
            .expect("credentials complete");
        assert_eq!(trello.api_url, "http://localhost:9000/1");
        assert_eq!(trello.board_id, "board-1");
        reset_env();
    }
}
