use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::domain::{BoardList, BoardSnapshot, Card, FieldShapeError};

static CARD_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn looks_like_card_id(value: &str) -> bool {
    CARD_ID_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9a-f]{24,32}$").expect("card id pattern compiles"))
        .is_match(value)
}

/// Card id lookup over one snapshot.
#[derive(Debug)]
pub struct CardIndex<'a> {
    cards: HashMap<&'a str, (&'a BoardList, &'a Card)>,
}

impl<'a> CardIndex<'a> {
    pub fn new(snapshot: &'a BoardSnapshot) -> Self {
        let cards = snapshot
            .cards()
            .map(|(list, card)| (card.id.as_str(), (list, card)))
            .collect();
        Self { cards }
    }

    pub fn get(&self, card_id: &str) -> Option<(&'a BoardList, &'a Card)> {
        self.cards.get(card_id).copied()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillStatus {
    Unfilled,
    PendingStart,
    Late,
}

impl FillStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unfilled => "Unfilled",
            Self::PendingStart => "Filled, pending start",
            Self::Late => "Filled, late",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementResolution<'a> {
    pub status: FillStatus,
    pub placed: Option<(&'a BoardList, &'a Card)>,
}

impl PlacementResolution<'_> {
    fn unfilled() -> Self {
        Self {
            status: FillStatus::Unfilled,
            placed: None,
        }
    }

    /// `<project>/<card>` for the confirmed placement, if any.
    pub fn placed_label(&self) -> Option<String> {
        self.placed
            .map(|(list, card)| format!("{}/{}", list.display_name, card.name))
    }
}

/// Resolves a vacancy's `Placement` reference. A fill only counts when the
/// referenced card points back at the vacancy.
pub fn resolve_placement<'a>(
    index: &CardIndex<'a>,
    vacancy: &Card,
    today: NaiveDate,
) -> Result<PlacementResolution<'a>, FieldShapeError> {
    let Some(reference) = vacancy.placement()?.map(str::trim) else {
        return Ok(PlacementResolution::unfilled());
    };
    if !looks_like_card_id(reference) {
        return Ok(PlacementResolution::unfilled());
    }
    let Some((list, placed)) = index.get(reference) else {
        return Ok(PlacementResolution::unfilled());
    };
    if placed.placement()?.map(str::trim) != Some(vacancy.id.as_str()) {
        return Ok(PlacementResolution::unfilled());
    }

    let start = match placed.start_date()? {
        Some(date) => Some(date),
        None => vacancy.start_date()?,
    };
    let status = match start {
        Some(date) if date <= today => FillStatus::Late,
        _ => FillStatus::PendingStart,
    };

    Ok(PlacementResolution {
        status,
        placed: Some((list, placed)),
    })
}
