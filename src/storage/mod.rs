//! Storage backends and the data provider built on top of them
//!
//! Three interchangeable backends implement [`StorageBackend`]:
//! - [`SqliteBackend`] - relational, foreign keys enforced by SQLite
//! - [`XmlBackend`] - one XML file per entity kind
//! - [`CsvBackend`] - one CSV file per entity kind
//!
//! Backends only persist. Validation, audit and result shaping live in
//! [`DataProvider`], so every backend behaves identically to callers.

mod file;
mod provider;
mod records;
mod sqlite;

pub use file::{Csv, CsvBackend, FileBackend, TableFormat, Xml, XmlBackend};
pub use provider::DataProvider;
pub use sqlite::SqliteBackend;

use uuid::Uuid;

use crate::core::config::BackendKind;
use crate::core::error::StoreError;
use crate::core::integrity::ExistenceIndex;
use crate::entities::{BugReport, Documentation, Employee, EmployeeProject, Event, Project, Task};

/// Raw persistence for every entity kind.
///
/// `replace_*` and `remove_*` return `false` when the row does not exist.
/// Removing a project or an employee cascades to its dependents on every
/// backend: project entities and links are removed, and a project manager
/// pointing at a removed employee is cleared.
pub trait StorageBackend: ExistenceIndex {
    fn kind(&self) -> BackendKind;

    // Projects. `team` is ignored on write and rebuilt from links on read.
    fn insert_project(&self, project: &Project) -> Result<(), StoreError>;
    fn fetch_project(&self, id: &str) -> Result<Option<Project>, StoreError>;
    fn replace_project(&self, project: &Project) -> Result<bool, StoreError>;
    fn remove_project(&self, id: &str) -> Result<bool, StoreError>;

    // Employees
    fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError>;
    fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError>;
    fn fetch_team(&self, project_id: &str) -> Result<Vec<Employee>, StoreError>;
    fn replace_employee(&self, employee: &Employee) -> Result<bool, StoreError>;
    fn remove_employee(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the pair is already linked
    fn insert_link(&self, link: &EmployeeProject) -> Result<(), StoreError>;

    // Tasks
    fn insert_task(&self, task: &Task) -> Result<(), StoreError>;
    fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
    fn fetch_tasks_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError>;
    fn fetch_tasks_by_employee(&self, employee_id: Uuid) -> Result<Vec<Task>, StoreError>;
    fn replace_task(&self, task: &Task) -> Result<bool, StoreError>;
    fn remove_task(&self, id: Uuid) -> Result<bool, StoreError>;

    // Bug reports
    fn insert_bug_report(&self, bug: &BugReport) -> Result<(), StoreError>;
    fn fetch_bug_report(&self, id: Uuid) -> Result<Option<BugReport>, StoreError>;
    fn fetch_bug_reports_by_project(&self, project_id: &str) -> Result<Vec<BugReport>, StoreError>;
    fn replace_bug_report(&self, bug: &BugReport) -> Result<bool, StoreError>;
    fn remove_bug_report(&self, id: Uuid) -> Result<bool, StoreError>;

    // Events
    fn insert_event(&self, event: &Event) -> Result<(), StoreError>;
    fn fetch_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
    fn fetch_events_by_project(&self, project_id: &str) -> Result<Vec<Event>, StoreError>;
    fn replace_event(&self, event: &Event) -> Result<bool, StoreError>;
    fn remove_event(&self, id: Uuid) -> Result<bool, StoreError>;

    // Documentation
    fn insert_documentation(&self, doc: &Documentation) -> Result<(), StoreError>;
    fn fetch_documentation(&self, id: Uuid) -> Result<Option<Documentation>, StoreError>;
    fn fetch_documentation_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Documentation>, StoreError>;
    fn replace_documentation(&self, doc: &Documentation) -> Result<bool, StoreError>;
    fn remove_documentation(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Open the backend named by `kind` over `config`'s data location
pub fn open_backend(
    config: &crate::core::config::Config,
) -> Result<Box<dyn StorageBackend>, StoreError> {
    let backend: Box<dyn StorageBackend> = match config.backend() {
        BackendKind::Sqlite => Box::new(SqliteBackend::open(&config.database_path())?),
        BackendKind::Xml => Box::new(XmlBackend::open(&config.data_dir())?),
        BackendKind::Csv => Box::new(CsvBackend::open(&config.data_dir())?),
    };
    tracing::debug!(backend = %config.backend(), "storage backend opened");
    Ok(backend)
}
