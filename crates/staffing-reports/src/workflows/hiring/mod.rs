//! New-hire CSV import: parse the HR export, plan the missing cards, create them.

pub mod parser;
pub mod plan;

use std::path::{Path, PathBuf};

pub use parser::{parse_rows, NewHireRow};
pub use plan::{
    apply_plan, plan_import, BoardWriter, ExistingHire, FailedCreate, ImportConflict,
    ImportOutcome, ImportPlan, NewHireCard, PlannedCard, SkippedRow,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid new hire csv: {0}")]
    Csv(#[from] csv::Error),
}

pub fn read_rows(path: &Path) -> Result<Vec<NewHireRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_rows(file)?)
}
