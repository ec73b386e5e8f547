//! Project Tracker
//!
//! Projects, their teams, tasks, bug reports, events and documentation,
//! persisted through one of three interchangeable backends (SQLite, XML or
//! CSV). Every mutation is checked for referential integrity, answered with
//! a uniform [`Outcome`](core::Outcome) and recorded in an audit trail.

pub mod cli;
pub mod core;
pub mod entities;
pub mod storage;
