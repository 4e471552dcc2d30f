use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Lists that hold board furniture rather than people or engagements.
pub const SYSTEM_LISTS: [&str; 6] = [
    "Reports",
    "Done",
    "Actions",
    "Recruitment",
    "Tests",
    "Unrequired Confirmed Vacancies",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListCategory {
    System,
    Project,
    Internal,
}

impl ListCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Project => "Project",
            Self::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    pub name: String,
    pub replaced: bool,
}

static PROJECT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn project_pattern() -> &'static Regex {
    PROJECT_PATTERN.get_or_init(|| {
        // `Project <sep> <name> (optional suffix)`; the suffix never matches [\w\s].
        Regex::new(r"^(?i:project)\s\W\s([\w\s]+)").expect("project name pattern compiles")
    })
}

/// Pulls the client name out of a `Project - Name (notes)` style list name.
pub fn decode_project_name(raw: &str) -> DecodedName {
    let decoded = project_pattern()
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().trim())
        .filter(|name| !name.is_empty());

    match decoded {
        Some(name) => DecodedName {
            name: name.to_string(),
            replaced: true,
        },
        None => DecodedName {
            name: raw.to_string(),
            replaced: false,
        },
    }
}

/// Assigns exactly one category to a list name.
pub fn classify(raw: &str) -> (ListCategory, DecodedName) {
    let decoded = decode_project_name(raw);
    let category = if SYSTEM_LISTS.contains(&raw) {
        ListCategory::System
    } else if decoded.replaced {
        ListCategory::Project
    } else {
        ListCategory::Internal
    };
    (category, decoded)
}
