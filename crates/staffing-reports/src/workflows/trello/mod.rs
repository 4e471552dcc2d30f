//! Trello REST adapter: board snapshots, the move log, report publishing and
//! new-hire card creation.

pub mod api;
pub mod client;

pub use client::{RetryPolicy, TrelloClient, TrelloConfig, DEFAULT_API_URL};
