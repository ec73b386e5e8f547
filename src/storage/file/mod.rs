//! File-table backends
//!
//! One file per entity kind inside a data directory, each holding a flat
//! list of records. There is no index: existence and uniqueness checks are
//! linear scans, and every write rewrites the whole table (temp file, then
//! rename). The on-disk format is pluggable through [`TableFormat`].

mod csv_format;
mod xml_format;

pub use csv_format::Csv;
pub use xml_format::Xml;

use std::collections::BTreeSet;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::core::config::BackendKind;
use crate::core::error::StoreError;
use crate::core::integrity::ExistenceIndex;
use crate::entities::{BugReport, Documentation, Employee, EmployeeProject, Event, Project, Task};
use crate::storage::records::{
    decode_uuid, BugReportRecord, DocumentationRecord, EmployeeRecord, EventRecord, LinkRecord, OwnedRecord,
    ProjectRecord, Record, TaskRecord,
};
use crate::storage::StorageBackend;

/// Serialization of a whole table to and from one file
pub trait TableFormat {
    /// File extension without the dot
    const EXTENSION: &'static str;

    const KIND: BackendKind;

    fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StoreError>;

    fn write_rows<R: Serialize>(path: &Path, table: &str, rows: &[R]) -> Result<(), StoreError>;
}

/// XML file store (`tasks.xml`, `projects.xml`, ...)
pub type XmlBackend = FileBackend<Xml>;

/// CSV file store (`tasks.csv`, `projects.csv`, ...)
pub type CsvBackend = FileBackend<Csv>;

/// Flat-file backend over a [`TableFormat`]
#[derive(Debug)]
pub struct FileBackend<F: TableFormat> {
    dir: PathBuf,
    _format: PhantomData<F>,
}

impl<F: TableFormat> FileBackend<F> {
    /// Open a store rooted at `dir`, creating the directory when missing
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            _format: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding table `R`
    fn path<R: Record>(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", R::TABLE, F::EXTENSION))
    }

    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let path = self.path::<R>();
        if !path.exists() {
            return Ok(Vec::new());
        }
        F::read_rows(&path)
    }

    fn save<R: Record>(&self, rows: &[R]) -> Result<(), StoreError> {
        let path = self.path::<R>();
        let tmp = path.with_extension(format!("{}.tmp", F::EXTENSION));
        F::write_rows(&tmp, R::TABLE, rows)?;
        fs::rename(&tmp, &path)?;
        tracing::trace!(table = R::TABLE, rows = rows.len(), "table rewritten");
        Ok(())
    }

    fn find<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        Ok(self.load::<R>()?.into_iter().find(|r| r.key() == key))
    }

    fn select<R: Record>(&self, keep: impl Fn(&R) -> bool) -> Result<Vec<R>, StoreError> {
        Ok(self.load::<R>()?.into_iter().filter(|r| keep(r)).collect())
    }

    fn insert<R: Record>(&self, row: R) -> Result<(), StoreError> {
        let mut rows = self.load::<R>()?;
        let key = row.key();
        if rows.iter().any(|r| r.key() == key) {
            return Err(StoreError::Conflict(format!(
                "{} already contains {}",
                R::TABLE,
                key
            )));
        }
        rows.push(row);
        self.save(&rows)
    }

    fn replace<R: Record>(&self, row: R) -> Result<bool, StoreError> {
        let mut rows = self.load::<R>()?;
        let key = row.key();
        match rows.iter_mut().find(|r| r.key() == key) {
            Some(slot) => {
                *slot = row;
                self.save(&rows)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove<R: Record>(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.retain::<R>(|r| r.key() != key)? > 0)
    }

    /// Keep rows matching `keep`; returns the number removed
    fn retain<R: Record>(&self, keep: impl Fn(&R) -> bool) -> Result<usize, StoreError> {
        let mut rows = self.load::<R>()?;
        let before = rows.len();
        rows.retain(|r| keep(r));
        let removed = before - rows.len();
        if removed > 0 {
            self.save(&rows)?;
        }
        Ok(removed)
    }

    /// Remove every owned row matching `doomed` from all four project-entity
    /// tables
    fn cascade_owned(&self, doomed: impl Fn(&str, &str) -> bool) -> Result<(), StoreError> {
        fn sweep<F: TableFormat, R: OwnedRecord>(
            backend: &FileBackend<F>,
            doomed: &impl Fn(&str, &str) -> bool,
        ) -> Result<usize, StoreError> {
            backend.retain::<R>(|r| !doomed(r.project_id(), r.employee_id()))
        }

        let removed = sweep::<F, TaskRecord>(self, &doomed)?
            + sweep::<F, BugReportRecord>(self, &doomed)?
            + sweep::<F, EventRecord>(self, &doomed)?
            + sweep::<F, DocumentationRecord>(self, &doomed)?;
        if removed > 0 {
            tracing::debug!(removed, "cascaded delete of project entities");
        }
        Ok(())
    }

    fn team_ids(&self, project_id: &str) -> Result<BTreeSet<Uuid>, StoreError> {
        self.select::<LinkRecord>(|l| l.project_id == project_id)?
            .into_iter()
            .map(|l| decode_uuid(LinkRecord::TABLE, &l.employee_id))
            .collect()
    }

    fn decode_all<R: Record, T: TryFrom<R, Error = StoreError>>(
        rows: Vec<R>,
    ) -> Result<Vec<T>, StoreError> {
        rows.into_iter().map(T::try_from).collect()
    }
}

impl<F: TableFormat> ExistenceIndex for FileBackend<F> {
    fn project_exists(&self, project_id: &str) -> Result<bool, StoreError> {
        Ok(self.find::<ProjectRecord>(project_id)?.is_some())
    }

    fn employee_exists(&self, employee_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.find::<EmployeeRecord>(&employee_id.to_string())?.is_some())
    }

    fn is_member(&self, employee_id: Uuid, project_id: &str) -> Result<bool, StoreError> {
        let key = LinkRecord::from(&EmployeeProject::new(employee_id, project_id)).key();
        Ok(self.find::<LinkRecord>(&key)?.is_some())
    }

    fn task_project(&self, task_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self
            .find::<TaskRecord>(&task_id.to_string())?
            .map(|t| t.project_id))
    }
}

impl<F: TableFormat> StorageBackend for FileBackend<F> {
    fn kind(&self) -> BackendKind {
        F::KIND
    }

    fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        self.insert(ProjectRecord::from(project))
    }

    fn fetch_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        match self.find::<ProjectRecord>(id)? {
            Some(record) => Ok(Some(record.into_project(self.team_ids(id)?)?)),
            None => Ok(None),
        }
    }

    fn replace_project(&self, project: &Project) -> Result<bool, StoreError> {
        self.replace(ProjectRecord::from(project))
    }

    fn remove_project(&self, id: &str) -> Result<bool, StoreError> {
        if !self.remove::<ProjectRecord>(id)? {
            return Ok(false);
        }
        self.cascade_owned(|project_id, _| project_id == id)?;
        self.retain::<LinkRecord>(|l| l.project_id != id)?;
        Ok(true)
    }

    fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        self.insert(EmployeeRecord::from(employee))
    }

    fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        self.find::<EmployeeRecord>(&id.to_string())?
            .map(Employee::try_from)
            .transpose()
    }

    fn fetch_team(&self, project_id: &str) -> Result<Vec<Employee>, StoreError> {
        let ids: BTreeSet<String> = self
            .team_ids(project_id)?
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        let rows = self.select::<EmployeeRecord>(|e| ids.contains(&e.id))?;
        Self::decode_all(rows)
    }

    fn replace_employee(&self, employee: &Employee) -> Result<bool, StoreError> {
        self.replace(EmployeeRecord::from(employee))
    }

    fn remove_employee(&self, id: Uuid) -> Result<bool, StoreError> {
        let key = id.to_string();
        if !self.remove::<EmployeeRecord>(&key)? {
            return Ok(false);
        }
        self.cascade_owned(|_, employee_id| employee_id == key)?;
        self.retain::<LinkRecord>(|l| l.employee_id != key)?;

        let mut projects = self.load::<ProjectRecord>()?;
        let mut cleared = false;
        for p in projects.iter_mut().filter(|p| p.manager_id == key) {
            p.manager_id.clear();
            cleared = true;
        }
        if cleared {
            self.save(&projects)?;
        }
        Ok(true)
    }

    fn insert_link(&self, link: &EmployeeProject) -> Result<(), StoreError> {
        self.insert(LinkRecord::from(link)).map_err(|e| match e {
            StoreError::Conflict(_) => StoreError::Conflict(format!(
                "Employee {} is already linked to project {}",
                link.employee_id, link.project_id
            )),
            other => other,
        })
    }

    fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.insert(TaskRecord::try_from(task)?)
    }

    fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.find::<TaskRecord>(&id.to_string())?
            .map(Task::try_from)
            .transpose()
    }

    fn fetch_tasks_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        Self::decode_all(self.select::<TaskRecord>(|t| t.project_id == project_id)?)
    }

    fn fetch_tasks_by_employee(&self, employee_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let key = employee_id.to_string();
        Self::decode_all(self.select::<TaskRecord>(|t| t.employee_id == key)?)
    }

    fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        self.replace(TaskRecord::try_from(task)?)
    }

    fn remove_task(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove::<TaskRecord>(&id.to_string())
    }

    fn insert_bug_report(&self, bug: &BugReport) -> Result<(), StoreError> {
        self.insert(BugReportRecord::from(bug))
    }

    fn fetch_bug_report(&self, id: Uuid) -> Result<Option<BugReport>, StoreError> {
        self.find::<BugReportRecord>(&id.to_string())?
            .map(BugReport::try_from)
            .transpose()
    }

    fn fetch_bug_reports_by_project(&self, project_id: &str) -> Result<Vec<BugReport>, StoreError> {
        Self::decode_all(self.select::<BugReportRecord>(|b| b.project_id == project_id)?)
    }

    fn replace_bug_report(&self, bug: &BugReport) -> Result<bool, StoreError> {
        self.replace(BugReportRecord::from(bug))
    }

    fn remove_bug_report(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove::<BugReportRecord>(&id.to_string())
    }

    fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        self.insert(EventRecord::from(event))
    }

    fn fetch_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        self.find::<EventRecord>(&id.to_string())?
            .map(Event::try_from)
            .transpose()
    }

    fn fetch_events_by_project(&self, project_id: &str) -> Result<Vec<Event>, StoreError> {
        Self::decode_all(self.select::<EventRecord>(|e| e.project_id == project_id)?)
    }

    fn replace_event(&self, event: &Event) -> Result<bool, StoreError> {
        self.replace(EventRecord::from(event))
    }

    fn remove_event(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove::<EventRecord>(&id.to_string())
    }

    fn insert_documentation(&self, doc: &Documentation) -> Result<(), StoreError> {
        self.insert(DocumentationRecord::try_from(doc)?)
    }

    fn fetch_documentation(&self, id: Uuid) -> Result<Option<Documentation>, StoreError> {
        self.find::<DocumentationRecord>(&id.to_string())?
            .map(Documentation::try_from)
            .transpose()
    }

    fn fetch_documentation_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Documentation>, StoreError> {
        Self::decode_all(self.select::<DocumentationRecord>(|d| d.project_id == project_id)?)
    }

    fn replace_documentation(&self, doc: &Documentation) -> Result<bool, StoreError> {
        self.replace(DocumentationRecord::try_from(doc)?)
    }

    fn remove_documentation(&self, id: Uuid) -> Result<bool, StoreError> {
        self.remove::<DocumentationRecord>(&id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn seeded<F: TableFormat>(dir: &Path) -> (FileBackend<F>, Employee, Project) {
        let backend = FileBackend::<F>::open(dir).unwrap();
        let employee = Employee::new("Ann", "Lee", "Dev");
        let mut project = Project::new("apollo", "Apollo", Utc::now());
        backend.insert_employee(&employee).unwrap();
        backend.insert_project(&project).unwrap();
        backend
            .insert_link(&EmployeeProject::new(employee.id, "apollo"))
            .unwrap();
        project.manager_id = Some(employee.id);
        backend.replace_project(&project).unwrap();
        (backend, employee, project)
    }

    fn check_cascade<F: TableFormat>() {
        let dir = tempdir().unwrap();
        let (backend, employee, _) = seeded::<F>(dir.path());
        let task = Task::new("apollo", employee.id, "Lee Ann", "Ship", Utc::now());
        backend.insert_task(&task).unwrap();

        assert!(backend.remove_project("apollo").unwrap());

        assert!(backend.fetch_task(task.id).unwrap().is_none());
        assert!(!backend.is_member(employee.id, "apollo").unwrap());
        assert!(backend.fetch_employee(employee.id).unwrap().is_some());
        assert!(!backend.remove_project("apollo").unwrap());
    }

    fn check_employee_cascade<F: TableFormat>() {
        let dir = tempdir().unwrap();
        let (backend, employee, _) = seeded::<F>(dir.path());
        let bug = BugReport::new("apollo", employee.id, "Lee Ann", "Crash");
        backend.insert_bug_report(&bug).unwrap();

        assert!(backend.remove_employee(employee.id).unwrap());

        let project = backend.fetch_project("apollo").unwrap().unwrap();
        assert!(project.manager_id.is_none());
        assert!(project.team.is_empty());
        assert!(backend.fetch_bug_report(bug.id).unwrap().is_none());
    }

    fn check_duplicate_link<F: TableFormat>() {
        let dir = tempdir().unwrap();
        let (backend, employee, _) = seeded::<F>(dir.path());

        let err = backend
            .insert_link(&EmployeeProject::new(employee.id, "apollo"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_xml_cascade() {
        check_cascade::<Xml>();
        check_employee_cascade::<Xml>();
        check_duplicate_link::<Xml>();
    }

    #[test]
    fn test_csv_cascade() {
        check_cascade::<Csv>();
        check_employee_cascade::<Csv>();
        check_duplicate_link::<Csv>();
    }

    #[test]
    fn test_fetch_project_builds_team_from_links() {
        let dir = tempdir().unwrap();
        let (backend, employee, project) = seeded::<Xml>(dir.path());

        let stored = backend.fetch_project("apollo").unwrap().unwrap();
        assert_eq!(stored.team, BTreeSet::from([employee.id]));
        assert_eq!(stored.manager_id, project.manager_id);
        assert_eq!(backend.fetch_team("apollo").unwrap(), vec![employee]);
    }

    #[test]
    fn test_tables_live_in_one_file_per_kind() {
        let dir = tempdir().unwrap();
        seeded::<Csv>(dir.path());

        assert!(dir.path().join("projects.csv").exists());
        assert!(dir.path().join("employees.csv").exists());
        assert!(dir.path().join("employee_project.csv").exists());
        assert!(!dir.path().join("tasks.csv").exists());
    }
}
