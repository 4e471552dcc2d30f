use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::workflows::board::fields;
use crate::workflows::board::wire::{WireCard, WireFieldItem, WireFieldValue, WireLabel, WireList};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiList {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCard {
    pub id: String,
    pub name: String,
    pub id_list: String,
    #[serde(default)]
    pub labels: Vec<WireLabel>,
    #[serde(default)]
    pub custom_field_items: Vec<ApiFieldItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFieldItem {
    pub id_custom_field: String,
    #[serde(default)]
    pub value: Option<WireFieldValue>,
    #[serde(default)]
    pub id_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCustomField {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub options: Vec<ApiFieldOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFieldOption {
    pub id: String,
    pub value: ApiOptionValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOptionValue {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAttachment {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreated {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate<'a> {
    pub desc: &'a str,
    pub id_attachment_cover: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardBody<'a> {
    pub id_list: &'a str,
    pub name: &'a str,
    pub location_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewListBody<'a> {
    pub name: &'a str,
    pub pos: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFieldBody<'a> {
    pub value: TextValue<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextValue<'a> {
    pub text: &'a str,
}

/// Groups cards under their lists and names their tracked custom field items.
/// List-type items are resolved to their option text.
pub fn assemble_lists(
    lists: Vec<ApiList>,
    cards: Vec<ApiCard>,
    definitions: &[ApiCustomField],
) -> Vec<WireList> {
    let tracked: HashMap<&str, &ApiCustomField> = definitions
        .iter()
        .filter(|definition| fields::TRACKED.contains(&definition.name.as_str()))
        .map(|definition| (definition.id.as_str(), definition))
        .collect();

    let mut by_list: HashMap<String, Vec<WireCard>> = HashMap::new();
    for card in cards {
        let custom_field_items = card
            .custom_field_items
            .into_iter()
            .filter_map(|item| {
                let definition = tracked.get(item.id_custom_field.as_str())?;
                let value = match (item.value, item.id_value) {
                    (Some(value), _) => Some(value),
                    (None, Some(option_id)) => definition
                        .options
                        .iter()
                        .find(|option| option.id == option_id)
                        .map(|option| WireFieldValue {
                            option: Some(option.value.text.clone()),
                            ..WireFieldValue::default()
                        }),
                    (None, None) => None,
                };
                Some(WireFieldItem {
                    name: definition.name.clone(),
                    value,
                })
            })
            .collect();

        by_list.entry(card.id_list).or_default().push(WireCard {
            id: card.id,
            name: card.name,
            labels: card.labels,
            custom_field_items,
        });
    }

    lists
        .into_iter()
        .map(|list| WireList {
            cards: by_list.remove(&list.id).unwrap_or_default(),
            id: list.id,
            name: list.name,
        })
        .collect()
}
