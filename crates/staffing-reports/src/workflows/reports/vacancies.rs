use chrono::NaiveDate;
use serde::Serialize;

use super::ReportError;
use crate::workflows::board::{resolve_placement, BoardSnapshot, CardIndex, VacancyType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyEntry {
    pub name: String,
    pub client: String,
    pub start_date: Option<NaiveDate>,
    pub vacancy_type: VacancyType,
    pub filled_by: Option<String>,
}

/// Every vacancy on the board, soonest start first. Undated vacancies go last.
pub fn build(snapshot: &BoardSnapshot, today: NaiveDate) -> Result<Vec<VacancyEntry>, ReportError> {
    let index = CardIndex::new(snapshot);

    let mut entries = snapshot
        .cards()
        .filter_map(|(list, card)| card.vacancy_type().map(|kind| (list, card, kind)))
        .map(|(list, card, vacancy_type)| {
            let start_date = card
                .start_date()
                .map_err(|source| ReportError::field(list, source))?;
            let resolution = resolve_placement(&index, card, today)
                .map_err(|source| ReportError::field(list, source))?;
            Ok(VacancyEntry {
                name: card.name.clone(),
                client: list.display_name.clone(),
                start_date,
                vacancy_type,
                filled_by: resolution.placed_label(),
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    entries.sort_by_key(|entry| (entry.start_date.is_none(), entry.start_date));
    Ok(entries)
}
