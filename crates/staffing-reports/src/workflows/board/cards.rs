use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::{Card, FieldKind, FieldShapeError, FieldValue};

/// Label vocabulary used on the staffing board.
pub mod labels {
    pub const VACANCY: &str = "Vacancy";
    pub const BACKFILL_VACANCY: &str = "Vacancy(Backfill)";
    pub const NON_BILLING: &str = "Non Billing";
    pub const CONTRACTOR: &str = "Contractor";
    pub const CANDIDATE_TO_MOVE: &str = "Candidate to Move";
    pub const NEW_JOINER: &str = "New Joiner";
    pub const LEAVE_COVER: &str = "Leave Cover";
    pub const BACKFILL_OPTION: &str = "Backfill Option";
}

/// Custom field names with meaning to the reports.
pub mod fields {
    pub const ROLE: &str = "Role";
    pub const PROJECT_START_DATE: &str = "Project Start Date";
    pub const PROJECT_END_DATE: &str = "Project End Date";
    pub const PLACEMENT: &str = "Placement";
    pub const SKILLS: &str = "Skills";
    pub const SC: &str = "SC";
    pub const NOT_SC_ELIGIBLE: &str = "Not SC Eligible";
    pub const EMPLOYEE_ID: &str = "Employee ID";
    pub const EMAIL: &str = "Email";

    /// Fields copied into the snapshot; anything else on a card is dropped.
    pub const TRACKED: [&str; 9] = [
        PROJECT_START_DATE,
        PROJECT_END_DATE,
        SC,
        NOT_SC_ELIGIBLE,
        SKILLS,
        ROLE,
        PLACEMENT,
        EMPLOYEE_ID,
        EMAIL,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VacancyType {
    NewBusiness,
    Backfill,
}

impl VacancyType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewBusiness => "New business",
            Self::Backfill => "Backfill",
        }
    }
}

impl Card {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    pub fn matches_label(&self, pattern: &Regex) -> bool {
        self.labels.iter().any(|label| pattern.is_match(label))
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.custom_fields.get(name)
    }

    /// Textual field lookup. List options count as text; any other kind is an error.
    pub fn text_field(&self, name: &str) -> Result<Option<&str>, FieldShapeError> {
        match self.field(name) {
            None => Ok(None),
            Some(FieldValue::Text(value)) | Some(FieldValue::ListOption(value)) => {
                Ok(Some(value.as_str()))
            }
            Some(other) => Err(self.shape_error(name, FieldKind::Text, other)),
        }
    }

    pub fn date_field(&self, name: &str) -> Result<Option<NaiveDate>, FieldShapeError> {
        match self.field(name) {
            None => Ok(None),
            Some(FieldValue::Date(value)) => Ok(Some(*value)),
            Some(other) => Err(self.shape_error(name, FieldKind::Date, other)),
        }
    }

    fn shape_error(&self, name: &str, expected: FieldKind, found: &FieldValue) -> FieldShapeError {
        FieldShapeError {
            card_id: self.id.clone(),
            field: name.to_string(),
            expected,
            found: found.kind(),
        }
    }

    /// Exact label match only: `Vacancy` or `Vacancy(Backfill)`.
    pub fn vacancy_type(&self) -> Option<VacancyType> {
        if self.has_label(labels::BACKFILL_VACANCY) {
            Some(VacancyType::Backfill)
        } else if self.has_label(labels::VACANCY) {
            Some(VacancyType::NewBusiness)
        } else {
            None
        }
    }

    pub fn is_vacancy(&self) -> bool {
        self.vacancy_type().is_some()
    }

    pub fn is_backfill_vacancy(&self) -> bool {
        self.vacancy_type() == Some(VacancyType::Backfill)
    }

    pub fn is_backfill_option(&self) -> bool {
        self.has_label(labels::BACKFILL_OPTION)
    }

    pub fn is_contractor(&self) -> bool {
        self.has_label(labels::CONTRACTOR)
    }

    pub fn is_non_billing(&self) -> bool {
        self.has_label(labels::NON_BILLING)
    }

    pub fn is_new_joiner(&self) -> bool {
        self.has_label(labels::NEW_JOINER)
    }

    pub fn is_leave_cover(&self) -> bool {
        self.has_label(labels::LEAVE_COVER)
    }

    pub fn is_candidate_to_move(&self) -> bool {
        self.has_label(labels::CANDIDATE_TO_MOVE)
    }

    /// A `Role` field, whatever its value, marks the card as a placed person.
    pub fn has_role_field(&self) -> bool {
        self.field(fields::ROLE).is_some()
    }

    pub fn role(&self) -> Result<Option<&str>, FieldShapeError> {
        self.text_field(fields::ROLE)
    }

    pub fn start_date(&self) -> Result<Option<NaiveDate>, FieldShapeError> {
        self.date_field(fields::PROJECT_START_DATE)
    }

    pub fn end_date(&self) -> Result<Option<NaiveDate>, FieldShapeError> {
        self.date_field(fields::PROJECT_END_DATE)
    }

    pub fn placement(&self) -> Result<Option<&str>, FieldShapeError> {
        self.text_field(fields::PLACEMENT)
    }
}
