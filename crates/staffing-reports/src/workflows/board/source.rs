use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::domain::{BoardSnapshot, MoveEvent};
use super::wire::{move_events_from_wire, snapshot_from_wire, WireAction, WireList};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("failed to read board data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid board data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("custom field '{field}' on card {card_id} is invalid: {reason}")]
    InvalidField {
        card_id: String,
        field: String,
        reason: String,
    },
    #[error("action for card {card_id} is invalid: {reason}")]
    InvalidAction { card_id: String, reason: String },
    #[error("board request {path} failed with status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("board request {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("board request {path} gave up after {attempts} attempts")]
    RetriesExhausted { path: String, attempts: u32 },
    #[error("board list '{0}' not found")]
    ListNotFound(String),
}

/// Where snapshots and the action log come from.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn snapshot(&self) -> Result<BoardSnapshot, BoardError>;
    async fn move_events(&self, since: DateTime<Utc>) -> Result<Vec<MoveEvent>, BoardError>;
}

/// Board data exported to disk, used for offline runs and previews.
#[derive(Debug, Clone)]
pub struct JsonFileBoard {
    snapshot_path: PathBuf,
    actions_path: Option<PathBuf>,
}

impl JsonFileBoard {
    pub fn new(snapshot_path: impl Into<PathBuf>, actions_path: Option<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            actions_path,
        }
    }

    async fn read(path: &Path) -> Result<Vec<u8>, BoardError> {
        tokio::fs::read(path).await.map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl BoardSource for JsonFileBoard {
    async fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        let bytes = Self::read(&self.snapshot_path).await?;
        let lists: Vec<WireList> = serde_json::from_slice(&bytes)?;
        snapshot_from_wire(lists)
    }

    async fn move_events(&self, since: DateTime<Utc>) -> Result<Vec<MoveEvent>, BoardError> {
        let Some(path) = &self.actions_path else {
            return Ok(Vec::new());
        };
        let bytes = Self::read(path).await?;
        let actions: Vec<WireAction> = serde_json::from_slice(&bytes)?;
        let events = move_events_from_wire(actions)?;
        Ok(events
            .into_iter()
            .filter(|event| event.occurred_at >= since)
            .collect())
    }
}
