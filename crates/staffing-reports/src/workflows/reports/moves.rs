use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::workflows::board::{decode_project_name, MoveEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEntry {
    pub name: String,
    pub from: String,
    pub to: String,
    pub date: DateTime<Utc>,
}

/// Collapses each card's moves into one net move, dropping round trips.
pub fn build(events: &[MoveEvent]) -> Vec<MoveEntry> {
    let mut order: Vec<&str> = Vec::new();
    let mut windows: HashMap<&str, (&MoveEvent, &MoveEvent)> = HashMap::new();

    for event in events {
        windows
            .entry(event.card_id.as_str())
            .and_modify(|(earliest, latest)| {
                if event.occurred_at < earliest.occurred_at {
                    *earliest = event;
                }
                if event.occurred_at >= latest.occurred_at {
                    *latest = event;
                }
            })
            .or_insert_with(|| {
                order.push(event.card_id.as_str());
                (event, event)
            });
    }

    let mut entries: Vec<MoveEntry> = order
        .into_iter()
        .filter_map(|card_id| windows.get(card_id))
        .filter_map(|(earliest, latest)| {
            let from = decode_project_name(&earliest.list_before).name;
            let to = decode_project_name(&latest.list_after).name;
            if from == to {
                tracing::debug!(card_id = %latest.card_id, list = %to, "skipping net no-op move");
                return None;
            }
            Some(MoveEntry {
                name: latest.card_name.clone(),
                from,
                to,
                date: latest.occurred_at,
            })
        })
        .collect();

    entries.sort_by_key(|entry| entry.date);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(card: &str, before: &str, after: &str, day: u32, hour: u32) -> MoveEvent {
        MoveEvent {
            card_id: card.to_string(),
            card_name: format!("Person {card}"),
            list_before: before.to_string(),
            list_after: after.to_string(),
            occurred_at: Utc
                .with_ymd_and_hms(2024, 6, day, hour, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn keeps_first_source_and_last_target() {
        let events = vec![
            event("c1", "list2", "list3", 11, 9),
            event("c1", "list1", "list2", 10, 9),
        ];
        let moves = build(&events);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].from, "list1");
        assert_eq!(moves[0].to, "list3");
        assert_eq!(moves[0].date, events[0].occurred_at);
    }

    #[test]
    fn drops_moves_that_net_out() {
        let events = vec![
            event("c1", "Lab", "Project - Acme", 10, 9),
            event("c1", "Project - Acme", "Lab", 10, 15),
            event("c2", "Project - Acme (phase 1)", "Project - Acme (phase 2)", 11, 9),
        ];
        assert!(build(&events).is_empty());
    }

    #[test]
    fn decodes_project_names_and_sorts_by_date() {
        let events = vec![
            event("c1", "Lab", "Project - Acme (retainer)", 12, 9),
            event("c2", "Project - Globex", "Bench", 10, 9),
        ];
        let moves = build(&events);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].name, "Person c2");
        assert_eq!(moves[0].from, "Globex");
        assert_eq!(moves[1].to, "Acme");
    }
}
