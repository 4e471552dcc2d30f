//! The five board reports, the change gate in front of publishing, and the
//! pipeline that runs them.

pub mod billing;
pub mod candidates;
pub mod gate;
pub mod moves;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod starters;
pub mod store;
pub mod vacancies;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::workflows::board::{BoardList, BoardSnapshot, FieldShapeError, MoveEvent};

pub use billing::{BillingReport, BillingTotals, ProjectBilling, RoleCategory};
pub use candidates::CandidateEntry;
pub use gate::{decide, digest, GateDecision, ReportDigest};
pub use moves::MoveEntry;
pub use pipeline::{
    preview, OutcomeStatus, PipelineError, PipelineSettings, ReportDestinations, ReportOutcome,
    ReportPipeline, ReportPreview, RunSummary,
};
pub use publish::{Publication, PublishError, ReportPublisher};
pub use render::{RenderError, RenderedImage, ReportRenderer, StartBand, SvgRenderer};
pub use starters::StarterEntry;
pub use store::{FileHashStore, HashStore, HashStoreError, InMemoryHashStore};
pub use vacancies::VacancyEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Billing,
    Vacancy,
    Starter,
    Candidate,
    Move,
}

impl ReportKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Billing,
            Self::Vacancy,
            Self::Starter,
            Self::Candidate,
            Self::Move,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Vacancy => "vacancy",
            Self::Starter => "starter",
            Self::Candidate => "candidate",
            Self::Move => "move",
        }
    }

    /// Key the last published digest is stored under.
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Billing => "billingReport",
            Self::Vacancy => "vacancyReport",
            Self::Starter => "starterReport",
            Self::Candidate => "candidateReport",
            Self::Move => "moveReport",
        }
    }

    pub const fn heading(self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Vacancy => "Vacancies coming up",
            Self::Starter => "Upcoming starters",
            Self::Candidate => "Candidates to move",
            Self::Move => "Manual moves this week",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report kind '{0}' (expected billing, vacancy, starter, candidate or move)")]
pub struct UnknownReportKind(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|kind| {
                normalized == kind.label() || normalized == kind.storage_key().to_ascii_lowercase()
            })
            .ok_or_else(|| UnknownReportKind(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("list {list_name} ({list_id}): {source}")]
    Field {
        list_id: String,
        list_name: String,
        #[source]
        source: FieldShapeError,
    },
}

impl ReportError {
    pub(crate) fn field(list: &BoardList, source: FieldShapeError) -> Self {
        Self::Field {
            list_id: list.id.clone(),
            list_name: list.name.clone(),
            source,
        }
    }

    pub fn card_id(&self) -> &str {
        match self {
            Self::Field { source, .. } => &source.card_id,
        }
    }

    pub fn list_id(&self) -> &str {
        match self {
            Self::Field { list_id, .. } => list_id,
        }
    }
}

/// Everything a report run reads: one snapshot, the recent move log, and the
/// reference date.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub snapshot: &'a BoardSnapshot,
    pub moves: &'a [MoveEvent],
    pub today: NaiveDate,
}

/// One computed report. Serializes as the bare record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportRecord {
    Billing(BillingReport),
    Vacancies(Vec<VacancyEntry>),
    Starters(Vec<StarterEntry>),
    Candidates(Vec<CandidateEntry>),
    Moves(Vec<MoveEntry>),
}

impl ReportRecord {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Billing(_) => ReportKind::Billing,
            Self::Vacancies(_) => ReportKind::Vacancy,
            Self::Starters(_) => ReportKind::Starter,
            Self::Candidates(_) => ReportKind::Candidate,
            Self::Moves(_) => ReportKind::Move,
        }
    }

    pub fn entry_count(&self) -> usize {
        match self {
            Self::Billing(report) => report.projects.len(),
            Self::Vacancies(entries) => entries.len(),
            Self::Starters(entries) => entries.len(),
            Self::Candidates(entries) => entries.len(),
            Self::Moves(entries) => entries.len(),
        }
    }

    /// New title for the destination card. The billing card keeps its own.
    pub fn card_title(&self) -> Option<String> {
        let count = self.entry_count();
        match self {
            Self::Billing(_) => None,
            Self::Vacancies(_) => Some(format!("Vacancies ({count})")),
            Self::Starters(_) => Some(format!("Upcoming Starters ({count})")),
            Self::Candidates(_) => Some(format!("Candidates ({count})")),
            Self::Moves(_) => Some(format!("Manual Moves this week ({count})")),
        }
    }

    /// Card description: pretty JSON in a fenced block. Billing shows totals only.
    pub fn description(&self) -> Result<String, serde_json::Error> {
        let body = match self {
            Self::Billing(report) => serde_json::to_string_pretty(&report.totals)?,
            other => serde_json::to_string_pretty(other)?,
        };
        Ok(format!("```\n{body}\n```"))
    }
}

/// Runs one reducer over the inputs.
pub fn compute(kind: ReportKind, inputs: ReportInputs<'_>) -> Result<ReportRecord, ReportError> {
    let ReportInputs {
        snapshot,
        moves: events,
        today,
    } = inputs;
    let record = match kind {
        ReportKind::Billing => ReportRecord::Billing(billing::build(snapshot, today)?),
        ReportKind::Vacancy => ReportRecord::Vacancies(vacancies::build(snapshot, today)?),
        ReportKind::Starter => ReportRecord::Starters(starters::build(snapshot, today)?),
        ReportKind::Candidate => ReportRecord::Candidates(candidates::build(snapshot, today)?),
        ReportKind::Move => ReportRecord::Moves(moves::build(events)),
    };
    Ok(record)
}
