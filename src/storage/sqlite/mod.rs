//! SQLite backend
//!
//! The relational store. Foreign keys are enforced by SQLite itself
//! (`PRAGMA foreign_keys = ON`), so deleting a project or employee cascades
//! in the database and a removed manager is set to NULL.

mod rows;
mod schema;

use std::fs;
use std::path::Path;

use rusqlite::{ffi, params, Connection, OptionalExtension, Params, Row};
use uuid::Uuid;

use crate::core::config::BackendKind;
use crate::core::error::StoreError;
use crate::core::integrity::ExistenceIndex;
use crate::entities::{BugReport, Documentation, Employee, EmployeeProject, Event, Project, Task};
use crate::storage::records::{
    decode_uuid, encode_time, BugReportRecord, Record, TaskRecord,
};
use crate::storage::StorageBackend;

use rows::{
    bug_report_record, documentation_row, employee_record, event_record, nullable,
    project_record, task_record, BUG_REPORT_COLUMNS, DOCUMENTATION_COLUMNS, EMPLOYEE_COLUMNS,
    EVENT_COLUMNS, PROJECT_COLUMNS, TASK_COLUMNS,
};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Relational store backed by a single SQLite file
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let backend = Self { conn };
        backend.init_schema()?;
        Ok(backend)
    }

    fn query_all<P: Params, T>(
        &self,
        sql: &str,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn exists(&self, sql: &str, params: impl Params) -> Result<bool, StoreError> {
        let found: Option<i32> = self
            .conn
            .query_row(sql, params, |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn team_ids(&self, project_id: &str) -> Result<std::collections::BTreeSet<Uuid>, StoreError> {
        self.query_all(
            "SELECT employee_id FROM employee_project WHERE project_id = ?1",
            params![project_id],
            |row| row.get::<_, String>(0),
        )?
        .iter()
        .map(|id| decode_uuid("employee_project", id))
        .collect()
    }

    fn insert_task_record(&self, r: &TaskRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO tasks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    TASK_COLUMNS
                ),
                params![
                    r.id,
                    r.project_id,
                    r.employee_id,
                    r.employee_full_name,
                    r.name,
                    r.description,
                    r.created_at,
                    r.status,
                    r.priority,
                    r.tags,
                    r.deadline,
                    nullable(&r.completed_at),
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, TaskRecord::TABLE, &r.id))?;
        Ok(())
    }

    fn fetch_tasks_where(&self, clause: &str, key: &str) -> Result<Vec<Task>, StoreError> {
        self.query_all(
            &format!(
                "SELECT {} FROM tasks WHERE {} = ?1 ORDER BY rowid",
                TASK_COLUMNS, clause
            ),
            params![key],
            task_record,
        )?
        .into_iter()
        .map(Task::try_from)
        .collect()
    }

    fn delete_by_id(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;
        Ok(changed > 0)
    }
}

/// Primary-key collisions become [`StoreError::Conflict`]
fn duplicate_as_conflict(e: rusqlite::Error, table: &str, key: &str) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::Conflict(format!("{} already contains {}", table, key))
        }
        _ => e.into(),
    }
}

impl ExistenceIndex for SqliteBackend {
    fn project_exists(&self, project_id: &str) -> Result<bool, StoreError> {
        self.exists("SELECT 1 FROM projects WHERE id = ?1", params![project_id])
    }

    fn employee_exists(&self, employee_id: Uuid) -> Result<bool, StoreError> {
        self.exists(
            "SELECT 1 FROM employees WHERE id = ?1",
            params![employee_id.to_string()],
        )
    }

    fn is_member(&self, employee_id: Uuid, project_id: &str) -> Result<bool, StoreError> {
        self.exists(
            "SELECT 1 FROM employee_project WHERE employee_id = ?1 AND project_id = ?2",
            params![employee_id.to_string(), project_id],
        )
    }

    fn task_project(&self, task_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT project_id FROM tasks WHERE id = ?1",
                params![task_id.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO projects ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    PROJECT_COLUMNS
                ),
                params![
                    project.id,
                    project.name,
                    project.description,
                    project.status.as_str(),
                    encode_time(&project.deadline),
                    project.manager_id.map(|m| m.to_string()),
                    encode_time(&project.created_at),
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, "projects", &project.id))?;
        Ok(())
    }

    fn fetch_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![id],
                project_record,
            )
            .optional()?;
        match record {
            Some(r) => Ok(Some(r.into_project(self.team_ids(id)?)?)),
            None => Ok(None),
        }
    }

    fn replace_project(&self, project: &Project) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?2, description = ?3, status = ?4, deadline = ?5, \
             manager_id = ?6 WHERE id = ?1",
            params![
                project.id,
                project.name,
                project.description,
                project.status.as_str(),
                encode_time(&project.deadline),
                project.manager_id.map(|m| m.to_string()),
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_project(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_by_id("projects", id)
    }

    fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        let id = employee.id.to_string();
        self.conn
            .execute(
                &format!(
                    "INSERT INTO employees ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    EMPLOYEE_COLUMNS
                ),
                params![
                    id,
                    employee.first_name,
                    employee.last_name,
                    employee.patronymic,
                    employee.birthday.map(|d| d.to_string()),
                    employee.email,
                    employee.phone_number,
                    employee.position,
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, "employees", &id))?;
        Ok(())
    }

    fn fetch_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM employees WHERE id = ?1", EMPLOYEE_COLUMNS),
                params![id.to_string()],
                employee_record,
            )
            .optional()?
            .map(Employee::try_from)
            .transpose()
    }

    fn fetch_team(&self, project_id: &str) -> Result<Vec<Employee>, StoreError> {
        let columns = EMPLOYEE_COLUMNS
            .split(", ")
            .map(|c| format!("e.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        self.query_all(
            &format!(
                "SELECT {} FROM employees e \
                 JOIN employee_project l ON l.employee_id = e.id \
                 WHERE l.project_id = ?1 ORDER BY e.rowid",
                columns
            ),
            params![project_id],
            employee_record,
        )?
        .into_iter()
        .map(Employee::try_from)
        .collect()
    }

    fn replace_employee(&self, employee: &Employee) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE employees SET first_name = ?2, last_name = ?3, patronymic = ?4, \
             birthday = ?5, email = ?6, phone_number = ?7, position = ?8 WHERE id = ?1",
            params![
                employee.id.to_string(),
                employee.first_name,
                employee.last_name,
                employee.patronymic,
                employee.birthday.map(|d| d.to_string()),
                employee.email,
                employee.phone_number,
                employee.position,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_employee(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("employees", &id.to_string())
    }

    fn insert_link(&self, link: &EmployeeProject) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO employee_project (employee_id, project_id) VALUES (?1, ?2)",
                params![link.employee_id.to_string(), link.project_id],
            )
            .map_err(|e| match duplicate_as_conflict(e, "employee_project", "") {
                StoreError::Conflict(_) => StoreError::Conflict(format!(
                    "Employee {} is already linked to project {}",
                    link.employee_id, link.project_id
                )),
                other => other,
            })?;
        Ok(())
    }

    fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.insert_task_record(&TaskRecord::try_from(task)?)
    }

    fn fetch_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id.to_string()],
                task_record,
            )
            .optional()?
            .map(Task::try_from)
            .transpose()
    }

    fn fetch_tasks_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        self.fetch_tasks_where("project_id", project_id)
    }

    fn fetch_tasks_by_employee(&self, employee_id: Uuid) -> Result<Vec<Task>, StoreError> {
        self.fetch_tasks_where("employee_id", &employee_id.to_string())
    }

    fn replace_task(&self, task: &Task) -> Result<bool, StoreError> {
        let r = TaskRecord::try_from(task)?;
        let changed = self.conn.execute(
            "UPDATE tasks SET project_id = ?2, employee_id = ?3, employee_full_name = ?4, \
             name = ?5, description = ?6, status = ?7, priority = ?8, tags = ?9, \
             deadline = ?10, completed_at = ?11, created_at = ?12 WHERE id = ?1",
            params![
                r.id,
                r.project_id,
                r.employee_id,
                r.employee_full_name,
                r.name,
                r.description,
                r.status,
                r.priority,
                r.tags,
                r.deadline,
                nullable(&r.completed_at),
                r.created_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_task(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("tasks", &id.to_string())
    }

    fn insert_bug_report(&self, bug: &BugReport) -> Result<(), StoreError> {
        let r = BugReportRecord::from(bug);
        self.conn
            .execute(
                &format!(
                    "INSERT INTO bug_reports ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    BUG_REPORT_COLUMNS
                ),
                params![
                    r.id,
                    r.project_id,
                    r.employee_id,
                    r.employee_full_name,
                    r.name,
                    r.description,
                    r.created_at,
                    r.status,
                    r.priority,
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, BugReportRecord::TABLE, &r.id))?;
        Ok(())
    }

    fn fetch_bug_report(&self, id: Uuid) -> Result<Option<BugReport>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM bug_reports WHERE id = ?1", BUG_REPORT_COLUMNS),
                params![id.to_string()],
                bug_report_record,
            )
            .optional()?
            .map(BugReport::try_from)
            .transpose()
    }

    fn fetch_bug_reports_by_project(&self, project_id: &str) -> Result<Vec<BugReport>, StoreError> {
        self.query_all(
            &format!(
                "SELECT {} FROM bug_reports WHERE project_id = ?1 ORDER BY rowid",
                BUG_REPORT_COLUMNS
            ),
            params![project_id],
            bug_report_record,
        )?
        .into_iter()
        .map(BugReport::try_from)
        .collect()
    }

    fn replace_bug_report(&self, bug: &BugReport) -> Result<bool, StoreError> {
        let r = BugReportRecord::from(bug);
        let changed = self.conn.execute(
            "UPDATE bug_reports SET project_id = ?2, employee_id = ?3, employee_full_name = ?4, \
             name = ?5, description = ?6, status = ?7, priority = ?8, created_at = ?9 \
             WHERE id = ?1",
            params![
                r.id,
                r.project_id,
                r.employee_id,
                r.employee_full_name,
                r.name,
                r.description,
                r.status,
                r.priority,
                r.created_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_bug_report(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("bug_reports", &id.to_string())
    }

    fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let id = event.id.to_string();
        self.conn
            .execute(
                &format!(
                    "INSERT INTO events ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    EVENT_COLUMNS
                ),
                params![
                    id,
                    event.project_id,
                    event.employee_id.to_string(),
                    event.employee_full_name,
                    event.name,
                    event.description,
                    encode_time(&event.created_at),
                    encode_time(&event.start_date),
                    encode_time(&event.end_date),
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, "events", &id))?;
        Ok(())
    }

    fn fetch_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS),
                params![id.to_string()],
                event_record,
            )
            .optional()?
            .map(Event::try_from)
            .transpose()
    }

    fn fetch_events_by_project(&self, project_id: &str) -> Result<Vec<Event>, StoreError> {
        self.query_all(
            &format!(
                "SELECT {} FROM events WHERE project_id = ?1 ORDER BY rowid",
                EVENT_COLUMNS
            ),
            params![project_id],
            event_record,
        )?
        .into_iter()
        .map(Event::try_from)
        .collect()
    }

    fn replace_event(&self, event: &Event) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE events SET project_id = ?2, employee_id = ?3, employee_full_name = ?4, \
             name = ?5, description = ?6, start_date = ?7, end_date = ?8, created_at = ?9 \
             WHERE id = ?1",
            params![
                event.id.to_string(),
                event.project_id,
                event.employee_id.to_string(),
                event.employee_full_name,
                event.name,
                event.description,
                encode_time(&event.start_date),
                encode_time(&event.end_date),
                encode_time(&event.created_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_event(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("events", &id.to_string())
    }

    fn insert_documentation(&self, doc: &Documentation) -> Result<(), StoreError> {
        let id = doc.id.to_string();
        let (titles, articles) = doc.article_columns();
        self.conn
            .execute(
                &format!(
                    "INSERT INTO documentations ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    DOCUMENTATION_COLUMNS
                ),
                params![
                    id,
                    doc.project_id,
                    doc.employee_id.to_string(),
                    doc.employee_full_name,
                    doc.name,
                    doc.description,
                    encode_time(&doc.created_at),
                    serde_json::to_string(&titles)?,
                    serde_json::to_string(&articles)?,
                ],
            )
            .map_err(|e| duplicate_as_conflict(e, "documentations", &id))?;
        Ok(())
    }

    fn fetch_documentation(&self, id: Uuid) -> Result<Option<Documentation>, StoreError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM documentations WHERE id = ?1",
                    DOCUMENTATION_COLUMNS
                ),
                params![id.to_string()],
                documentation_row,
            )
            .optional()?
            .map(Documentation::try_from)
            .transpose()
    }

    fn fetch_documentation_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<Documentation>, StoreError> {
        self.query_all(
            &format!(
                "SELECT {} FROM documentations WHERE project_id = ?1 ORDER BY rowid",
                DOCUMENTATION_COLUMNS
            ),
            params![project_id],
            documentation_row,
        )?
        .into_iter()
        .map(Documentation::try_from)
        .collect()
    }

    fn replace_documentation(&self, doc: &Documentation) -> Result<bool, StoreError> {
        let (titles, articles) = doc.article_columns();
        let changed = self.conn.execute(
            "UPDATE documentations SET project_id = ?2, employee_id = ?3, \
             employee_full_name = ?4, name = ?5, description = ?6, article_titles = ?7, \
             articles = ?8, created_at = ?9 WHERE id = ?1",
            params![
                doc.id.to_string(),
                doc.project_id,
                doc.employee_id.to_string(),
                doc.employee_full_name,
                doc.name,
                doc.description,
                serde_json::to_string(&titles)?,
                serde_json::to_string(&articles)?,
                encode_time(&doc.created_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn remove_documentation(&self, id: Uuid) -> Result<bool, StoreError> {
        self.delete_by_id("documentations", &id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn seeded() -> (SqliteBackend, Employee) {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let employee = Employee::new("Ann", "Lee", "Dev");
        backend.insert_employee(&employee).unwrap();
        backend
            .insert_project(&Project::new("apollo", "Apollo", Utc::now()))
            .unwrap();
        backend
            .insert_link(&EmployeeProject::new(employee.id, "apollo"))
            .unwrap();
        (backend, employee)
    }

    #[test]
    fn test_open_creates_database_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tracker.db");
        SqliteBackend::open(&path).unwrap();
        assert!(path.exists());

        // Reopening finds a matching schema version
        SqliteBackend::open(&path).unwrap();
    }

    #[test]
    fn test_project_delete_cascades() {
        let (backend, employee) = seeded();
        let task = Task::new("apollo", employee.id, "Lee Ann", "Ship", Utc::now());
        backend.insert_task(&task).unwrap();
        let doc = Documentation::new("apollo", employee.id, "Lee Ann", "Guide")
            .with_article("Intro", "Hello");
        backend.insert_documentation(&doc).unwrap();

        assert!(backend.remove_project("apollo").unwrap());
        assert!(backend.fetch_task(task.id).unwrap().is_none());
        assert!(backend.fetch_documentation(doc.id).unwrap().is_none());
        assert!(!backend.is_member(employee.id, "apollo").unwrap());
    }

    #[test]
    fn test_removed_manager_is_cleared() {
        let (backend, employee) = seeded();
        let mut project = backend.fetch_project("apollo").unwrap().unwrap();
        project.manager_id = Some(employee.id);
        assert!(backend.replace_project(&project).unwrap());

        assert!(backend.remove_employee(employee.id).unwrap());
        let project = backend.fetch_project("apollo").unwrap().unwrap();
        assert!(project.manager_id.is_none());
        assert!(project.team.is_empty());
    }

    #[test]
    fn test_duplicate_keys_conflict() {
        let (backend, employee) = seeded();
        let err = backend
            .insert_link(&EmployeeProject::new(employee.id, "apollo"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = backend
            .insert_project(&Project::new("apollo", "Again", Utc::now()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_documentation_body_round_trips_through_columns() {
        let (backend, employee) = seeded();
        let doc = Documentation::new("apollo", employee.id, "Lee Ann", "Guide")
            .with_article("Intro", "Hello")
            .with_article("Setup", "Install it");
        backend.insert_documentation(&doc).unwrap();

        let stored = backend.fetch_documentation(doc.id).unwrap().unwrap();
        assert_eq!(stored, doc);
    }

    #[test]
    fn test_team_and_task_queries() {
        let (backend, employee) = seeded();
        let task = Task::new("apollo", employee.id, "Lee Ann", "Ship", Utc::now()).with_tags(["x"]);
        backend.insert_task(&task).unwrap();

        assert_eq!(backend.fetch_team("apollo").unwrap(), vec![employee.clone()]);
        assert_eq!(backend.fetch_tasks_by_employee(employee.id).unwrap(), vec![task.clone()]);
        assert_eq!(
            backend.task_project(task.id).unwrap(),
            Some("apollo".to_string())
        );
    }
}
