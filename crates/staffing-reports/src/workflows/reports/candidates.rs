use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::ReportError;
use crate::workflows::board::{BoardList, BoardSnapshot, Card, FieldShapeError};

const CANDIDATE_SCORE: u32 = 50;
const NEW_JOINER_SCORE: u32 = 100;
const LONG_TENURE_SCORE: u32 = 20;
const ENDING_SOON_SCORE: u32 = 20;

const LONG_TENURE_DAYS: i64 = 730;
const ENDING_SOON_DAYS: i64 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntry {
    pub name: String,
    pub current_client: String,
    pub reasons: String,
    pub move_score: u32,
}

/// Why a card is worth moving, with the weight each reason adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveReason {
    CandidateToMove,
    NewJoiner,
    LongTenure,
    EndingSoon,
}

impl MoveReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CandidateToMove => "is a candidate to move",
            Self::NewJoiner => "is a new joiner",
            Self::LongTenure => "has a start date over two years ago",
            Self::EndingSoon => "has an end date that is soon",
        }
    }

    pub const fn score(self) -> u32 {
        match self {
            Self::CandidateToMove => CANDIDATE_SCORE,
            Self::NewJoiner => NEW_JOINER_SCORE,
            Self::LongTenure => LONG_TENURE_SCORE,
            Self::EndingSoon => ENDING_SOON_SCORE,
        }
    }
}

pub fn reasons_for(card: &Card, today: NaiveDate) -> Result<Vec<MoveReason>, FieldShapeError> {
    let mut reasons = Vec::new();
    if card.is_candidate_to_move() {
        reasons.push(MoveReason::CandidateToMove);
    }
    if card.is_new_joiner() {
        reasons.push(MoveReason::NewJoiner);
    }
    if card
        .start_date()?
        .is_some_and(|start| today - Duration::days(LONG_TENURE_DAYS) > start)
    {
        reasons.push(MoveReason::LongTenure);
    }
    if card
        .end_date()?
        .is_some_and(|end| today >= end - Duration::days(ENDING_SOON_DAYS))
    {
        reasons.push(MoveReason::EndingSoon);
    }
    Ok(reasons)
}

fn entry(list: &BoardList, card: &Card, reasons: &[MoveReason]) -> CandidateEntry {
    CandidateEntry {
        name: card.name.clone(),
        current_client: list.display_name.clone(),
        reasons: reasons
            .iter()
            .map(|reason| reason.label())
            .collect::<Vec<_>>()
            .join(", "),
        move_score: reasons.iter().map(|reason| reason.score()).sum(),
    }
}

/// Scores every card and keeps those with at least one reason, highest score first.
pub fn build(snapshot: &BoardSnapshot, today: NaiveDate) -> Result<Vec<CandidateEntry>, ReportError> {
    let mut candidates = Vec::new();
    for (list, card) in snapshot.cards() {
        let reasons = reasons_for(card, today).map_err(|source| ReportError::field(list, source))?;
        if !reasons.is_empty() {
            candidates.push(entry(list, card, &reasons));
        }
    }
    candidates.sort_by(|left, right| right.move_score.cmp(&left.move_score));
    Ok(candidates)
}
