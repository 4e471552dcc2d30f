use crate::commands::{run_import, run_pipeline, run_report, ImportArgs, ReportArgs, RunArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use staffing_reports::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "staffing-reports",
    about = "Publish staffing board reports and import new hires from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run every report once and publish the ones that changed
    Run(RunArgs),
    /// Compute a single report from an exported snapshot and print it as JSON
    Report(ReportArgs),
    /// Plan (and optionally create) board cards for an HR new-starter export
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Run(args) => run_pipeline(args).await,
        Command::Report(args) => run_report(args).await,
        Command::Import(args) => run_import(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffing_reports::workflows::reports::ReportKind;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["staffing-reports"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_report_kind_and_dates() {
        let cli = Cli::try_parse_from([
            "staffing-reports",
            "report",
            "vacancyReport",
            "--snapshot",
            "board.json",
            "--today",
            "2024-03-01",
        ])
        .expect("parses");
        let Some(Command::Report(args)) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.kind, ReportKind::Vacancy);
        assert_eq!(args.today.map(|date| date.to_string()).as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn actions_require_a_snapshot() {
        let result = Cli::try_parse_from(["staffing-reports", "run", "--actions", "actions.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_report_kind() {
        let result = Cli::try_parse_from([
            "staffing-reports",
            "report",
            "weekly",
            "--snapshot",
            "board.json",
        ]);
        assert!(result.is_err());
    }
}
