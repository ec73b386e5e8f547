//! Core module - fundamental types and utilities

pub mod analytics;
pub mod audit;
pub mod config;
pub mod entity;
pub mod error;
pub mod integrity;
pub mod outcome;
pub mod workspace;

pub use analytics::{EmployeeEfficiency, ProjectCharacteristics, Report, StatusSnapshot};
pub use audit::{AuditRecord, AuditSink, AuditStatus, ChangeType};
pub use config::{BackendKind, Config};
pub use entity::{BugStatus, Entity, Priority, ProjectEntity, ProjectStatus, TaskStatus};
pub use error::StoreError;
pub use integrity::{ExistenceIndex, IntegrityChecker, Violations};
pub use outcome::{Outcome, ResultCode};
pub use workspace::{Workspace, WorkspaceError};
