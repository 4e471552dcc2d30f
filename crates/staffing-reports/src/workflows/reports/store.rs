use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::gate::ReportDigest;
use super::ReportKind;

#[derive(Debug, thiserror::Error)]
pub enum HashStoreError {
    #[error("failed to read stored digest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write stored digest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("digest store unavailable: {0}")]
    Unavailable(String),
}

/// Last published digest per report kind. Absent means never published.
#[async_trait]
pub trait HashStore: Send + Sync {
    async fn load(&self, kind: ReportKind) -> Result<Option<ReportDigest>, HashStoreError>;
    async fn save(&self, kind: ReportKind, digest: &ReportDigest) -> Result<(), HashStoreError>;
}

/// One `<storage key>.txt` file per kind under a directory.
#[derive(Debug, Clone)]
pub struct FileHashStore {
    dir: PathBuf,
}

impl FileHashStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ReportKind) -> PathBuf {
        self.dir.join(format!("{}.txt", kind.storage_key()))
    }
}

#[async_trait]
impl HashStore for FileHashStore {
    async fn load(&self, kind: ReportKind) -> Result<Option<ReportDigest>, HashStoreError> {
        let path = self.path_for(kind);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(ReportDigest::from_stored(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HashStoreError::Read { path, source }),
        }
    }

    async fn save(&self, kind: ReportKind, digest: &ReportDigest) -> Result<(), HashStoreError> {
        let path = self.path_for(kind);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| HashStoreError::Write {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, digest.as_str())
            .await
            .map_err(|source| HashStoreError::Write { path, source })
    }
}

/// Process-local store for previews and tests.
#[derive(Debug, Default)]
pub struct InMemoryHashStore {
    digests: Mutex<HashMap<ReportKind, ReportDigest>>,
}

impl InMemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ReportKind) -> Option<ReportDigest> {
        self.digests
            .lock()
            .ok()
            .and_then(|digests| digests.get(&kind).cloned())
    }
}

#[async_trait]
impl HashStore for InMemoryHashStore {
    async fn load(&self, kind: ReportKind) -> Result<Option<ReportDigest>, HashStoreError> {
        let digests = self
            .digests
            .lock()
            .map_err(|_| HashStoreError::Unavailable("digest map poisoned".to_string()))?;
        Ok(digests.get(&kind).cloned())
    }

    async fn save(&self, kind: ReportKind, digest: &ReportDigest) -> Result<(), HashStoreError> {
        let mut digests = self
            .digests
            .lock()
            .map_err(|_| HashStoreError::Unavailable("digest map poisoned".to_string()))?;
        digests.insert(kind, digest.clone());
        Ok(())
    }
}
