//! CLI command implementations

pub mod bug;
pub mod completions;
pub mod doc;
pub mod employee;
pub mod event;
pub mod init;
pub mod project;
pub mod report;
pub mod task;
