use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::parser::NewHireRow;
use crate::workflows::board::{fields, BoardError, BoardSnapshot, Card, FieldValue};

/// A card the importer wants on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHireCard {
    pub list_name: String,
    pub name: String,
    pub location: String,
    /// Text custom fields, by field name.
    pub fields: Vec<(String, String)>,
}

/// Board writes the importer needs.
#[async_trait]
pub trait BoardWriter: Send + Sync {
    /// Creates the card (and its list, when missing) and returns the card id.
    async fn create_card(&self, card: &NewHireCard) -> Result<String, BoardError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCard {
    pub employee_id: String,
    pub card: NewHireCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingHire {
    pub employee_id: String,
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConflict {
    pub employee_id: String,
    pub card_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlan {
    pub create: Vec<PlannedCard>,
    pub existing: Vec<ExistingHire>,
    pub conflicts: Vec<ImportConflict>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub created: Vec<ExistingHire>,
    pub failed: Vec<FailedCreate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCreate {
    pub employee_id: String,
    pub message: String,
}

/// Employee id as written on a card. Whole numbers drop their fraction.
fn card_employee_id(card: &Card) -> Option<String> {
    match card.field(fields::EMPLOYEE_ID)? {
        FieldValue::Text(text) | FieldValue::ListOption(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        FieldValue::Number(number) if number.fract() == 0.0 => Some(format!("{number:.0}")),
        FieldValue::Number(number) => Some(number.to_string()),
        FieldValue::Date(_) | FieldValue::Checkbox(_) => None,
    }
}

/// Decides, per row, whether a card must be created. Pure: reads the snapshot only.
pub fn plan_import(rows: &[NewHireRow], snapshot: &BoardSnapshot) -> ImportPlan {
    let known: Vec<(String, &Card)> = snapshot
        .cards()
        .filter_map(|(_, card)| card_employee_id(card).map(|id| (id, card)))
        .collect();

    let mut plan = ImportPlan::default();
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        if row.employee_id.is_empty() {
            plan.skipped.push(SkippedRow {
                row: row_number,
                reason: "missing Employee Id".to_string(),
            });
            continue;
        }
        if row.department.is_empty() {
            plan.skipped.push(SkippedRow {
                row: row_number,
                reason: format!("employee {} has no Department", row.employee_id),
            });
            continue;
        }

        let matches: Vec<&Card> = known
            .iter()
            .filter(|(id, _)| id == &row.employee_id)
            .map(|(_, card)| *card)
            .collect();

        match matches.as_slice() {
            [] => plan.create.push(PlannedCard {
                employee_id: row.employee_id.clone(),
                card: NewHireCard {
                    list_name: row.department.clone(),
                    name: row.full_name(),
                    location: row.post_code.clone(),
                    fields: vec![
                        (fields::EMAIL.to_string(), row.work_email.clone()),
                        (fields::EMPLOYEE_ID.to_string(), row.employee_id.clone()),
                    ],
                },
            }),
            [card] => plan.existing.push(ExistingHire {
                employee_id: row.employee_id.clone(),
                card_id: card.id.clone(),
            }),
            many => {
                let card_ids: Vec<String> = many.iter().map(|card| card.id.clone()).collect();
                warn!(
                    employee_id = %row.employee_id,
                    cards = %card_ids.join(","),
                    "several cards share this employee id; not importing"
                );
                plan.conflicts.push(ImportConflict {
                    employee_id: row.employee_id.clone(),
                    card_ids,
                });
            }
        }
    }
    plan
}

/// Creates the planned cards one at a time. A failed card does not stop the rest.
pub async fn apply_plan(plan: &ImportPlan, writer: &dyn BoardWriter) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    for planned in &plan.create {
        match writer.create_card(&planned.card).await {
            Ok(card_id) => {
                info!(employee_id = %planned.employee_id, %card_id, "new hire card created");
                outcome.created.push(ExistingHire {
                    employee_id: planned.employee_id.clone(),
                    card_id,
                });
            }
            Err(err) => {
                warn!(employee_id = %planned.employee_id, error = %err, "failed to create new hire card");
                outcome.failed.push(FailedCreate {
                    employee_id: planned.employee_id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    outcome
}
