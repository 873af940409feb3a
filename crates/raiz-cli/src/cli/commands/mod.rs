//! CLI command handlers.

pub mod check;
pub mod config;
pub mod images;
pub mod normalize;
