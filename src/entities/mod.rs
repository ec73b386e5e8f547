//! Entity type definitions
//!
//! - [`Project`] - a project with a team and an optional manager
//! - [`Employee`] - a person who can join projects
//! - [`EmployeeProject`] - the membership link between the two
//!
//! **Project entities** (belong to one project, authored by one employee):
//! - [`Task`] - work items with deadline, priority and tags
//! - [`BugReport`] - defects with status and priority
//! - [`Event`] - scheduled events with a start and end
//! - [`Documentation`] - titled articles

pub mod bug_report;
pub mod documentation;
pub mod employee;
pub mod event;
pub mod link;
pub mod project;
pub mod task;

pub use bug_report::BugReport;
pub use documentation::Documentation;
pub use employee::Employee;
pub use event::Event;
pub use link::EmployeeProject;
pub use project::Project;
pub use task::Task;
