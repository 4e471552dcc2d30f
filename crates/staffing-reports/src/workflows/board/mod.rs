//! Normalized board snapshot and the classification rules applied to it.

pub mod cards;
pub mod domain;
pub mod lists;
pub mod placement;
pub mod source;
pub mod wire;

pub use cards::{fields, labels, VacancyType};
pub use domain::{
    BoardList, BoardSnapshot, Card, FieldKind, FieldShapeError, FieldValue, MoveEvent,
};
pub use lists::{classify, decode_project_name, DecodedName, ListCategory, SYSTEM_LISTS};
pub use placement::{resolve_placement, CardIndex, FillStatus, PlacementResolution};
pub use source::{BoardError, BoardSource, JsonFileBoard};
