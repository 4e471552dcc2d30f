use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use staffing_reports::workflows::board::{BoardSource, JsonFileBoard, VacancyType};
use staffing_reports::workflows::hiring::{parse_rows, plan_import};
use staffing_reports::workflows::reports::{
    compute, FileHashStore, HashStore, OutcomeStatus, PipelineSettings, Publication, PublishError,
    ReportDestinations, ReportInputs, ReportKind, ReportPipeline, ReportPublisher, ReportRecord,
    SvgRenderer,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn board() -> JsonFileBoard {
    JsonFileBoard::new(fixture("board.json"), Some(fixture("actions.json")))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn destinations() -> ReportDestinations {
    ReportDestinations {
        billing: Some("card-billing".to_string()),
        vacancy: Some("card-vacancy".to_string()),
        starter: Some("card-starter".to_string()),
        candidate: Some("card-candidate".to_string()),
        moves: Some("card-moves".to_string()),
    }
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<Publication>>,
    reject_card: Option<String>,
}

impl RecordingPublisher {
    fn rejecting(card_id: &str) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            reject_card: Some(card_id.to_string()),
        }
    }

    fn published(&self) -> Vec<Publication> {
        self.published.lock().expect("publisher lock").clone()
    }
}

#[async_trait]
impl ReportPublisher for RecordingPublisher {
    async fn publish(&self, publication: &Publication) -> Result<(), PublishError> {
        if self.reject_card.as_deref() == Some(publication.card_id.as_str()) {
            return Err(PublishError::Rejected {
                card_id: publication.card_id.clone(),
                reason: "attachment upload refused".to_string(),
            });
        }
        self.published
            .lock()
            .expect("publisher lock")
            .push(publication.clone());
        Ok(())
    }
}

fn pipeline(
    publisher: Arc<RecordingPublisher>,
    store: Arc<FileHashStore>,
    dry_run: bool,
) -> ReportPipeline {
    ReportPipeline::new(
        Arc::new(board()),
        Arc::new(SvgRenderer::new()),
        publisher,
        store,
        PipelineSettings {
            destinations: destinations(),
            move_lookback_days: 7,
            dry_run,
        },
    )
}

async fn record(kind: ReportKind) -> ReportRecord {
    let board = board();
    let snapshot = board.snapshot().await.expect("snapshot loads");
    let moves = board
        .move_events(now() - chrono::Duration::days(7))
        .await
        .expect("actions load");
    compute(
        kind,
        ReportInputs {
            snapshot: &snapshot,
            moves: &moves,
            today: today(),
        },
    )
    .expect("report computes")
}

#[tokio::test]
async fn billing_totals_follow_board_rules() {
    let ReportRecord::Billing(report) = record(ReportKind::Billing).await else {
        panic!("expected billing record");
    };

    let projects: Vec<&str> = report
        .projects
        .iter()
        .map(|project| project.project.as_str())
        .collect();
    assert_eq!(projects, ["Acme Corp", "Lab", "Define Discovery"]);

    let on = &report.totals.on_project;
    assert_eq!(on.placed, 2);
    assert_eq!(on.billable, 1);
    assert_eq!(on.pending_start, 1);
    assert_eq!(on.non_billable, 1);
    assert_eq!(on.contractors, 1);
    assert_eq!(on.permanent, 1);

    let off = &report.totals.off_project;
    assert_eq!(off.total, 3);
    assert_eq!(off.lab.total, 2);
    assert_eq!(off.lab.gce, 1);
    assert_eq!(off.lab.non_academy, 1);
    assert_eq!(off.define, 1);

    let vacancies = &report.totals.vacancies;
    assert_eq!(vacancies.total, 1);
    assert_eq!(vacancies.new_business.filled.late, 1);
    assert_eq!(vacancies.backfill.total, 0);
}

#[tokio::test]
async fn vacancies_sorted_with_undated_last() {
    let ReportRecord::Vacancies(entries) = record(ReportKind::Vacancy).await else {
        panic!("expected vacancy record");
    };

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Senior engineer");
    assert_eq!(entries[0].client, "Acme Corp");
    assert_eq!(entries[0].filled_by.as_deref(), Some("Lab/Carol"));
    assert_eq!(entries[1].name, "Backfill tester");
    assert_eq!(entries[1].client, "Recruitment");
    assert_eq!(entries[1].start_date, None);
    assert_eq!(entries[1].vacancy_type, VacancyType::Backfill);
}

#[tokio::test]
async fn starters_and_candidates() {
    let ReportRecord::Starters(starters) = record(ReportKind::Starter).await else {
        panic!("expected starter record");
    };
    let names: Vec<(&str, &str)> = starters
        .iter()
        .map(|entry| (entry.name.as_str(), entry.to.as_str()))
        .collect();
    assert_eq!(names, [("Bob", "Acme Corp"), ("Dan", "Lab")]);

    let ReportRecord::Candidates(candidates) = record(ReportKind::Candidate).await else {
        panic!("expected candidate record");
    };
    let scored: Vec<(&str, u32)> = candidates
        .iter()
        .map(|entry| (entry.name.as_str(), entry.move_score))
        .collect();
    assert_eq!(scored, [("Dan", 100), ("Alice", 70), ("Eve", 20)]);
    assert_eq!(
        candidates[1].reasons,
        "is a candidate to move, has a start date over two years ago"
    );
}

#[tokio::test]
async fn moves_collapse_to_net_change() {
    let ReportRecord::Moves(moves) = record(ReportKind::Move).await else {
        panic!("expected move record");
    };

    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].name, "Alice");
    assert_eq!(moves[0].from, "Lab");
    assert_eq!(moves[0].to, "Acme Corp");
    assert_eq!(
        moves[0].date,
        Utc.with_ymd_and_hms(2024, 2, 28, 16, 40, 0)
            .single()
            .expect("valid instant")
    );
}

#[tokio::test]
async fn second_run_skips_unchanged_reports() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(FileHashStore::new(dir.path()));
    let publisher = Arc::new(RecordingPublisher::default());
    let pipeline = pipeline(publisher.clone(), store.clone(), false);

    let first = pipeline.run_at(today(), now()).await.expect("first run");
    assert_eq!(first.count(OutcomeStatus::Published), 5);
    assert!(dir.path().join("billingReport.txt").exists());
    assert!(dir.path().join("moveReport.txt").exists());

    let published = publisher.published();
    assert_eq!(published.len(), 5);
    let vacancy = published
        .iter()
        .find(|publication| publication.kind == ReportKind::Vacancy)
        .expect("vacancy published");
    assert_eq!(vacancy.card_id, "card-vacancy");
    assert_eq!(vacancy.title.as_deref(), Some("Vacancies (2)"));
    assert!(vacancy.description.starts_with("```\n"));
    assert_eq!(vacancy.image.file_name, "generated-report-vacancyReport.svg");

    let second = pipeline.run_at(today(), now()).await.expect("second run");
    assert_eq!(second.count(OutcomeStatus::Unchanged), 5);
    assert_eq!(publisher.published().len(), 5);
    for kind in ReportKind::ordered() {
        assert_eq!(
            first.outcome(kind).and_then(|outcome| outcome.digest.clone()),
            second.outcome(kind).and_then(|outcome| outcome.digest.clone())
        );
    }
}

#[tokio::test]
async fn failed_publish_leaves_digest_unsaved() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(FileHashStore::new(dir.path()));
    let publisher = Arc::new(RecordingPublisher::rejecting("card-vacancy"));
    let pipeline = pipeline(publisher.clone(), store.clone(), false);

    let summary = pipeline.run_at(today(), now()).await.expect("run completes");
    let vacancy = summary.outcome(ReportKind::Vacancy).expect("vacancy outcome");
    assert_eq!(vacancy.status, OutcomeStatus::Failed);
    assert!(vacancy
        .message
        .as_deref()
        .is_some_and(|message| message.contains("attachment upload refused")));
    assert_eq!(summary.count(OutcomeStatus::Published), 4);
    assert!(store
        .load(ReportKind::Vacancy)
        .await
        .expect("store readable")
        .is_none());
    assert!(store
        .load(ReportKind::Billing)
        .await
        .expect("store readable")
        .is_some());
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(FileHashStore::new(dir.path()));
    let publisher = Arc::new(RecordingPublisher::default());
    let pipeline = pipeline(publisher.clone(), store, true);

    let summary = pipeline.run_at(today(), now()).await.expect("dry run");
    assert!(summary.dry_run);
    assert_eq!(summary.count(OutcomeStatus::Skipped), 5);
    assert!(publisher.published().is_empty());
    assert_eq!(
        std::fs::read_dir(dir.path()).expect("dir readable").count(),
        0
    );
}

#[tokio::test]
async fn import_plan_matches_numeric_employee_ids() {
    let snapshot = board().snapshot().await.expect("snapshot loads");
    let csv = std::fs::read(fixture("new_hires.csv")).expect("csv fixture");
    let rows = parse_rows(csv.as_slice()).expect("csv parses");

    let plan = plan_import(&rows, &snapshot);
    assert_eq!(plan.existing.len(), 1);
    assert_eq!(plan.existing[0].card_id, "5f00000000000000000000d1");
    assert_eq!(plan.create.len(), 1);
    assert_eq!(plan.create[0].card.name, "Fay Green");
    assert_eq!(plan.create[0].card.list_name, "Engineering");
    assert!(plan.conflicts.is_empty());
}
