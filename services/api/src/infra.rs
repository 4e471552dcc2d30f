use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use staffing_reports::config::{AppConfig, ConfigError};
use staffing_reports::error::AppError;
use staffing_reports::workflows::board::{BoardSource, JsonFileBoard};
use staffing_reports::workflows::reports::{
    FileHashStore, Publication, PublishError, ReportPipeline, ReportPublisher, SvgRenderer,
};
use staffing_reports::workflows::trello::TrelloClient;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) pipeline: PipelineHandle,
}

/// The live pipeline, or the setting that kept it from being built.
#[derive(Clone)]
pub(crate) enum PipelineHandle {
    Ready(Arc<ReportPipeline>),
    Unconfigured(&'static str),
}

impl PipelineHandle {
    pub(crate) fn get(&self) -> Result<&ReportPipeline, AppError> {
        match self {
            PipelineHandle::Ready(pipeline) => Ok(pipeline),
            PipelineHandle::Unconfigured(var) => Err(ConfigError::Missing(*var).into()),
        }
    }
}

/// Where the board comes from for a single pipeline run.
#[derive(Debug, Clone, Default)]
pub(crate) struct BoardOverride {
    pub(crate) snapshot: Option<PathBuf>,
    pub(crate) actions: Option<PathBuf>,
}

/// Stands in for the board when a dry run has no credentials. Dry runs never publish.
#[derive(Debug, Default)]
pub(crate) struct DisabledPublisher;

#[async_trait]
impl ReportPublisher for DisabledPublisher {
    async fn publish(&self, publication: &Publication) -> Result<(), PublishError> {
        Err(PublishError::Rejected {
            card_id: publication.card_id.clone(),
            reason: "board credentials are not configured".to_string(),
        })
    }
}

pub(crate) fn build_pipeline(
    config: &AppConfig,
    board: BoardOverride,
    dry_run: bool,
) -> Result<ReportPipeline, AppError> {
    let trello = match config.board.trello() {
        Ok(trello) => Some(Arc::new(TrelloClient::new(trello))),
        Err(err) if dry_run || board.snapshot.is_some() => {
            tracing::debug!(error = %err, "running without board credentials");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let source: Arc<dyn BoardSource> = match (board.snapshot, &trello) {
        (Some(snapshot), _) => Arc::new(JsonFileBoard::new(snapshot, board.actions)),
        (None, Some(client)) => client.clone(),
        (None, None) => return Err(ConfigError::Missing("TRELLO_KEY").into()),
    };

    let publisher: Arc<dyn ReportPublisher> = match trello {
        Some(client) => client,
        None if dry_run => Arc::new(DisabledPublisher),
        None => return Err(ConfigError::Missing("TRELLO_KEY").into()),
    };

    Ok(ReportPipeline::new(
        source,
        Arc::new(SvgRenderer::new()),
        publisher,
        Arc::new(FileHashStore::new(config.reports.hash_dir.clone())),
        config.reports.pipeline_settings(dry_run),
    ))
}

/// Evaluation instant for a run pinned to `today`, keeping the current wall-clock time.
pub(crate) fn instant_on(today: NaiveDate) -> DateTime<Utc> {
    today.and_time(Utc::now().time()).and_utc()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
