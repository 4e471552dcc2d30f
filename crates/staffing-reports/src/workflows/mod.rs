pub mod board;
pub mod hiring;
pub mod reports;
pub mod trello;
