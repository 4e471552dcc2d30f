use chrono::NaiveDate;
use serde::Serialize;

use super::ReportError;
use crate::workflows::board::{BoardSnapshot, Card};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterEntry {
    pub name: String,
    pub to: String,
    pub date: NaiveDate,
}

fn is_starter_candidate(card: &Card) -> bool {
    (card.has_role_field() || card.is_leave_cover())
        && !card.is_backfill_option()
        && !card.is_vacancy()
}

/// People due to start after `today`, in board order.
pub fn build(snapshot: &BoardSnapshot, today: NaiveDate) -> Result<Vec<StarterEntry>, ReportError> {
    snapshot
        .cards()
        .filter(|(_, card)| is_starter_candidate(card))
        .filter_map(|(list, card)| match card.start_date() {
            Ok(Some(date)) if date > today => Some(Ok(StarterEntry {
                name: card.name.clone(),
                to: list.display_name.clone(),
                date,
            })),
            Ok(_) => None,
            Err(source) => Some(Err(ReportError::field(list, source))),
        })
        .collect()
}
