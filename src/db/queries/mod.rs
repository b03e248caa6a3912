//! Database queries

pub mod activity;
pub mod import;
pub mod lead;
pub mod overview;
pub mod reminder;
pub mod status;
