//! Business logic services

pub mod activity;
pub mod bulk_upsert;
pub mod header_mapper;
pub mod import_pipeline;
pub mod import_tracker;
pub mod lead;
pub mod lead_status;
pub mod overview;
pub mod reminder;
pub mod row_extractor;
pub mod spreadsheet;
pub mod status_cache;
