use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::gate::{decide, digest, GateDecision, ReportDigest};
use super::publish::{Publication, PublishError, ReportPublisher};
use super::render::{RenderError, ReportRenderer};
use super::store::{HashStore, HashStoreError};
use super::{compute, ReportError, ReportInputs, ReportKind, ReportRecord};
use crate::workflows::board::{BoardError, BoardSnapshot, BoardSource, MoveEvent};

pub const DEFAULT_MOVE_LOOKBACK_DAYS: u32 = 7;

/// Destination card id per report kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDestinations {
    pub billing: Option<String>,
    pub vacancy: Option<String>,
    pub starter: Option<String>,
    pub candidate: Option<String>,
    pub moves: Option<String>,
}

impl ReportDestinations {
    pub fn card_for(&self, kind: ReportKind) -> Option<&str> {
        let card = match kind {
            ReportKind::Billing => &self.billing,
            ReportKind::Vacancy => &self.vacancy,
            ReportKind::Starter => &self.starter,
            ReportKind::Candidate => &self.candidate,
            ReportKind::Move => &self.moves,
        };
        card.as_deref().filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub destinations: ReportDestinations,
    pub move_lookback_days: u32,
    pub dry_run: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            destinations: ReportDestinations::default(),
            move_lookback_days: DEFAULT_MOVE_LOOKBACK_DAYS,
            dry_run: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load board snapshot: {0}")]
    Snapshot(#[source] BoardError),
    #[error("failed to load move history: {0}")]
    Moves(#[source] BoardError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] HashStoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("no destination card configured for the {0} report")]
    MissingDestination(ReportKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeStatus {
    Published,
    Unchanged,
    /// Changed, but the run was a dry run.
    Skipped,
    Failed,
}

impl OutcomeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Unchanged => "unchanged",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub kind: ReportKind,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<ReportDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReportOutcome {
    fn completed(
        kind: ReportKind,
        status: OutcomeStatus,
        record: &ReportRecord,
        digest: ReportDigest,
    ) -> Self {
        Self {
            kind,
            status,
            digest: Some(digest),
            entries: Some(record.entry_count()),
            message: None,
        }
    }

    fn failed(kind: ReportKind, err: &PipelineError) -> Self {
        Self {
            kind,
            status: OutcomeStatus::Failed,
            digest: None,
            entries: None,
            message: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub today: NaiveDate,
    pub dry_run: bool,
    pub outcomes: Vec<ReportOutcome>,
}

impl RunSummary {
    pub fn outcome(&self, kind: ReportKind) -> Option<&ReportOutcome> {
        self.outcomes.iter().find(|outcome| outcome.kind == kind)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failed) > 0
    }
}

/// A report computed for preview, with its digest or the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPreview {
    pub kind: ReportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ReportRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<ReportDigest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Computes and digests every report without touching the board.
pub fn preview(inputs: ReportInputs<'_>) -> Vec<ReportPreview> {
    ReportKind::ordered()
        .into_iter()
        .map(|kind| {
            let computed = compute(kind, inputs)
                .map_err(PipelineError::from)
                .and_then(|record| Ok((digest(&record)?, record)));
            match computed {
                Ok((digest, record)) => ReportPreview {
                    kind,
                    record: Some(record),
                    digest: Some(digest),
                    error: None,
                },
                Err(err) => ReportPreview {
                    kind,
                    record: None,
                    digest: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect()
}

/// Runs every report against one snapshot: compute, gate, render, publish,
/// then remember the digest.
pub struct ReportPipeline {
    source: Arc<dyn BoardSource>,
    renderer: Arc<dyn ReportRenderer>,
    publisher: Arc<dyn ReportPublisher>,
    store: Arc<dyn HashStore>,
    settings: PipelineSettings,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn BoardSource>,
        renderer: Arc<dyn ReportRenderer>,
        publisher: Arc<dyn ReportPublisher>,
        store: Arc<dyn HashStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            renderer,
            publisher,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let now = Utc::now();
        self.run_at(now.date_naive(), now).await
    }

    /// Fails as a whole only when the snapshot cannot be loaded. Every other
    /// failure is confined to its report.
    pub async fn run_at(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, PipelineError> {
        let snapshot = self.source.snapshot().await.map_err(PipelineError::Snapshot)?;
        info!(
            lists = snapshot.lists.len(),
            cards = snapshot.card_count(),
            %today,
            dry_run = self.settings.dry_run,
            "board snapshot loaded"
        );

        let since = now - Duration::days(i64::from(self.settings.move_lookback_days));
        let moves = self.source.move_events(since).await.map_err(PipelineError::Moves);
        if let Err(err) = &moves {
            warn!(error = %err, "move history unavailable; move report will fail");
        }

        let mut outcomes = Vec::with_capacity(ReportKind::ordered().len());
        for kind in ReportKind::ordered() {
            let events: &[MoveEvent] = match (&moves, kind) {
                (Err(err), ReportKind::Move) => {
                    error!(report = kind.label(), error = %err, "report failed");
                    outcomes.push(ReportOutcome::failed(kind, err));
                    continue;
                }
                (Ok(events), _) => events.as_slice(),
                (Err(_), _) => &[],
            };
            let inputs = ReportInputs {
                snapshot: &snapshot,
                moves: events,
                today,
            };
            let outcome = match self.run_report(kind, inputs).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    log_failure(kind, &err);
                    ReportOutcome::failed(kind, &err)
                }
            };
            outcomes.push(outcome);
        }

        Ok(RunSummary {
            today,
            dry_run: self.settings.dry_run,
            outcomes,
        })
    }

    async fn run_report(
        &self,
        kind: ReportKind,
        inputs: ReportInputs<'_>,
    ) -> Result<ReportOutcome, PipelineError> {
        let record = compute(kind, inputs)?;
        let current = digest(&record)?;
        let previous = self.store.load(kind).await?;

        if decide(&current, previous.as_ref()) == GateDecision::Unchanged {
            info!(report = kind.label(), digest = %current, "report unchanged; skipping publish");
            return Ok(ReportOutcome::completed(kind, OutcomeStatus::Unchanged, &record, current));
        }
        if self.settings.dry_run {
            info!(report = kind.label(), digest = %current, "report changed; dry run, not publishing");
            return Ok(ReportOutcome::completed(kind, OutcomeStatus::Skipped, &record, current));
        }

        let card_id = self
            .settings
            .destinations
            .card_for(kind)
            .ok_or(PipelineError::MissingDestination(kind))?;
        let publication = Publication {
            kind,
            card_id: card_id.to_string(),
            image: self.renderer.render(&record, inputs.today)?,
            description: record.description()?,
            title: record.card_title(),
        };
        self.publisher.publish(&publication).await?;
        self.store.save(kind, &current).await?;

        info!(report = kind.label(), card_id, digest = %current, "report published");
        Ok(ReportOutcome::completed(kind, OutcomeStatus::Published, &record, current))
    }
}

fn log_failure(kind: ReportKind, err: &PipelineError) {
    match err {
        PipelineError::Report(report_err) => error!(
            report = kind.label(),
            list_id = report_err.list_id(),
            card_id = report_err.card_id(),
            error = %err,
            "report failed"
        ),
        other => error!(report = kind.label(), error = %other, "report failed"),
    }
}

/// Convenience for callers that already hold the snapshot and move log.
pub fn inputs<'a>(
    snapshot: &'a BoardSnapshot,
    moves: &'a [MoveEvent],
    today: NaiveDate,
) -> ReportInputs<'a> {
    ReportInputs {
        snapshot,
        moves,
        today,
    }
}
