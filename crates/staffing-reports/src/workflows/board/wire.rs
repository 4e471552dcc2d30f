use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::domain::{BoardList, BoardSnapshot, Card, FieldValue, MoveEvent};
use super::source::BoardError;

/// Snapshot exchange format: lists with nested cards, field items already named.
#[derive(Debug, Clone, Deserialize)]
pub struct WireList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<WireCard>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCard {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<WireLabel>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_field_items: Vec<WireFieldItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLabel {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFieldItem {
    pub name: String,
    #[serde(default)]
    pub value: Option<WireFieldValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireFieldValue {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub checked: Option<Value>,
    #[serde(default)]
    pub option: Option<String>,
}

/// One entry of the board action log.
#[derive(Debug, Clone, Deserialize)]
pub struct WireAction {
    pub date: String,
    pub data: WireActionData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireActionData {
    pub card: WireActionCard,
    #[serde(default)]
    pub old: Option<WireActionOld>,
    #[serde(default)]
    pub list_before: Option<WireLabel>,
    #[serde(default)]
    pub list_after: Option<WireLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireActionCard {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireActionOld {
    #[serde(default)]
    pub id_list: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn snapshot_from_wire(lists: Vec<WireList>) -> Result<BoardSnapshot, BoardError> {
    let lists = lists
        .into_iter()
        .map(|list| {
            let cards = list
                .cards
                .into_iter()
                .map(|card| card_from_wire(card, &list.id))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BoardList::new(list.id, list.name, cards))
        })
        .collect::<Result<Vec<_>, BoardError>>()?;
    Ok(BoardSnapshot::new(lists))
}

fn card_from_wire(card: WireCard, list_id: &str) -> Result<Card, BoardError> {
    let labels: BTreeSet<String> = card
        .labels
        .into_iter()
        .map(|label| label.name)
        .filter(|name| !name.is_empty())
        .collect();

    let mut custom_fields = BTreeMap::new();
    for item in card.custom_field_items {
        let Some(value) = item.value else {
            continue;
        };
        match field_value(&card.id, &item.name, value)? {
            Some(value) => {
                custom_fields.insert(item.name, value);
            }
            None => {
                tracing::debug!(card_id = %card.id, field = %item.name, "skipping empty custom field item");
            }
        }
    }

    Ok(Card {
        id: card.id,
        name: card.name,
        list_id: list_id.to_string(),
        labels,
        custom_fields,
    })
}

pub(crate) fn field_value(
    card_id: &str,
    field: &str,
    value: WireFieldValue,
) -> Result<Option<FieldValue>, BoardError> {
    let invalid = |reason: String| BoardError::InvalidField {
        card_id: card_id.to_string(),
        field: field.to_string(),
        reason,
    };

    if let Some(text) = value.text {
        return Ok(Some(FieldValue::Text(text)));
    }
    if let Some(raw) = value.date {
        let date = parse_date(&raw).ok_or_else(|| invalid(format!("unparseable date '{raw}'")))?;
        return Ok(Some(FieldValue::Date(date)));
    }
    if let Some(raw) = value.number {
        let number = match &raw {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| invalid(format!("unparseable number {raw}")))?;
        return Ok(Some(FieldValue::Number(number)));
    }
    if let Some(raw) = value.checked {
        let checked = match &raw {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => text.trim().parse::<bool>().ok(),
            _ => None,
        }
        .ok_or_else(|| invalid(format!("unparseable checkbox {raw}")))?;
        return Ok(Some(FieldValue::Checkbox(checked)));
    }
    if let Some(option) = value.option {
        return Ok(Some(FieldValue::ListOption(option)));
    }
    Ok(None)
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Keeps only list changes (`old.idList` present) and types them.
pub fn move_events_from_wire(actions: Vec<WireAction>) -> Result<Vec<MoveEvent>, BoardError> {
    actions
        .into_iter()
        .filter(|action| {
            action
                .data
                .old
                .as_ref()
                .is_some_and(|old| old.id_list.is_some())
        })
        .map(|action| {
            let occurred_at = parse_timestamp(&action.date).ok_or_else(|| {
                BoardError::InvalidAction {
                    card_id: action.data.card.id.clone(),
                    reason: format!("unparseable timestamp '{}'", action.date),
                }
            })?;
            let list_name = |label: Option<WireLabel>, side: &str| {
                label.map(|label| label.name).ok_or_else(|| BoardError::InvalidAction {
                    card_id: action.data.card.id.clone(),
                    reason: format!("list move without {side} list"),
                })
            };
            let list_before = list_name(action.data.list_before.clone(), "source")?;
            let list_after = list_name(action.data.list_after.clone(), "target")?;

            Ok(MoveEvent {
                card_id: action.data.card.id,
                card_name: action.data.card.name,
                list_before,
                list_after,
                occurred_at,
            })
        })
        .collect()
}
