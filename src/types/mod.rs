//! Type definitions

pub mod activity;
pub mod import;
pub mod lead;
pub mod messages;
pub mod overview;
pub mod reminder;
pub mod status;

pub use activity::*;
pub use import::*;
pub use lead::*;
pub use messages::*;
pub use overview::*;
pub use reminder::*;
pub use status::*;
