use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::lists::{classify, ListCategory};

/// A custom field value as stored on a card. One constructor per field kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Number(f64),
    Checkbox(bool),
    ListOption(String),
}

impl FieldValue {
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Date(_) => FieldKind::Date,
            Self::Number(_) => FieldKind::Number,
            Self::Checkbox(_) => FieldKind::Checkbox,
            Self::ListOption(_) => FieldKind::ListOption,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Date,
    Number,
    Checkbox,
    ListOption,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::ListOption => "list option",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a caller asks for a field as one kind and the card holds another.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("custom field '{field}' on card {card_id} holds a {found} value, expected {expected}")]
pub struct FieldShapeError {
    pub card_id: String,
    pub field: String,
    pub expected: FieldKind,
    pub found: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub list_id: String,
    pub labels: BTreeSet<String>,
    pub custom_fields: BTreeMap<String, FieldValue>,
}

impl Card {
    pub fn new(id: impl Into<String>, name: impl Into<String>, list_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            list_id: list_id.into(),
            labels: BTreeSet::new(),
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.custom_fields.insert(name.into(), value);
        self
    }
}

/// A board column after classification. Owns its cards for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardList {
    pub id: String,
    pub name: String,
    pub category: ListCategory,
    /// Project name when the list name decodes, otherwise the raw list name.
    pub display_name: String,
    pub cards: Vec<Card>,
}

impl BoardList {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cards: Vec<Card>) -> Self {
        let name = name.into();
        let (category, decoded) = classify(&name);
        Self {
            id: id.into(),
            name,
            category,
            display_name: decoded.name,
            cards,
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        match self.category {
            ListCategory::Project => Some(self.display_name.as_str()),
            ListCategory::System | ListCategory::Internal => None,
        }
    }

    pub fn is_system(&self) -> bool {
        self.category == ListCategory::System
    }
}

/// Normalized copy of every list and card on the board for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub lists: Vec<BoardList>,
}

impl BoardSnapshot {
    pub fn new(lists: Vec<BoardList>) -> Self {
        Self { lists }
    }

    /// Every card paired with its owning list, in board traversal order.
    pub fn cards(&self) -> impl Iterator<Item = (&BoardList, &Card)> {
        self.lists
            .iter()
            .flat_map(|list| list.cards.iter().map(move |card| (list, card)))
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|list| list.cards.len()).sum()
    }
}

/// A card changing list, taken from the board action log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub card_id: String,
    pub card_name: String,
    pub list_before: String,
    pub list_after: String,
    pub occurred_at: DateTime<Utc>,
}
