use crate::infra::{build_pipeline, instant_on, parse_date, BoardOverride};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;
use staffing_reports::config::AppConfig;
use staffing_reports::error::AppError;
use staffing_reports::telemetry;
use staffing_reports::workflows::board::{BoardSnapshot, BoardSource, JsonFileBoard};
use staffing_reports::workflows::hiring::{
    apply_plan, plan_import, read_rows, ImportOutcome, ImportPlan,
};
use staffing_reports::workflows::reports::pipeline::DEFAULT_MOVE_LOOKBACK_DAYS;
use staffing_reports::workflows::reports::{compute, OutcomeStatus, ReportInputs, ReportKind};
use staffing_reports::workflows::trello::TrelloClient;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Compute and compare digests without rendering, publishing or saving
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Evaluation date (defaults to today, UTC)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Read the board from an exported snapshot instead of Trello
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Action log to pair with --snapshot
    #[arg(long, requires = "snapshot")]
    pub(crate) actions: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// billing, vacancy, starter, candidate or move
    pub(crate) kind: ReportKind,
    /// Exported board snapshot (JSON list array)
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Exported action log (JSON action array)
    #[arg(long)]
    pub(crate) actions: Option<PathBuf>,
    /// Evaluation date (defaults to today, UTC)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// How far back list moves are collected
    #[arg(long, default_value_t = DEFAULT_MOVE_LOOKBACK_DAYS)]
    pub(crate) lookback_days: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// HR new-starter export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Create the planned cards (otherwise only print the plan)
    #[arg(long)]
    pub(crate) apply: bool,
    /// Match against an exported snapshot instead of the live board
    #[arg(long, conflicts_with = "apply")]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run_pipeline(args: RunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let RunArgs {
        dry_run,
        today,
        snapshot,
        actions,
    } = args;

    let pipeline = build_pipeline(&config, BoardOverride { snapshot, actions }, dry_run)?;
    let summary = match today {
        Some(today) => pipeline.run_at(today, instant_on(today)).await?,
        None => pipeline.run().await?,
    };

    info!(
        published = summary.count(OutcomeStatus::Published),
        failed = summary.has_failures(),
        "report run finished"
    );
    print_json(&summary)
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        kind,
        snapshot,
        actions,
        today,
        lookback_days,
    } = args;

    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    let board = JsonFileBoard::new(snapshot, actions);
    let snapshot = board.snapshot().await?;
    let since = instant_on(today) - Duration::days(i64::from(lookback_days));
    let moves = board.move_events(since).await?;

    let record = compute(
        kind,
        ReportInputs {
            snapshot: &snapshot,
            moves: &moves,
            today,
        },
    )?;
    print_json(&record)
}

pub(crate) async fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let rows = read_rows(&args.csv)?;
    let snapshot: BoardSnapshot = match &args.snapshot {
        Some(path) => JsonFileBoard::new(path, None).snapshot().await?,
        None => TrelloClient::new(config.board.trello()?).snapshot().await?,
    };

    let plan = plan_import(&rows, &snapshot);
    info!(
        rows = rows.len(),
        create = plan.create.len(),
        existing = plan.existing.len(),
        conflicts = plan.conflicts.len(),
        skipped = plan.skipped.len(),
        "new hire import planned"
    );

    if !args.apply {
        return print_json(&plan);
    }

    let client = TrelloClient::new(config.board.trello()?);
    let outcome = apply_plan(&plan, &client).await;
    print_json(&ImportReport {
        plan: &plan,
        outcome: &outcome,
    })
}

#[derive(Serialize)]
struct ImportReport<'a> {
    plan: &'a ImportPlan,
    outcome: &'a ImportOutcome,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
