//! CLI command implementations

pub mod config;
pub mod create;
pub mod delete;
pub mod diff;
pub mod fork;
pub mod gc;
pub mod list;
pub mod restore;
pub mod show;
pub mod timeline;
