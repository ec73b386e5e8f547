//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{SqliteBackend, SCHEMA_VERSION};
use crate::core::error::StoreError;

impl SqliteBackend {
    /// Create tables on a fresh database, or verify the version of an
    /// existing one
    pub(super) fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS employees (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                patronymic TEXT,
                birthday TEXT,
                email TEXT NOT NULL DEFAULT '',
                phone_number TEXT NOT NULL DEFAULT '',
                position TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                deadline TEXT NOT NULL,
                manager_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (manager_id) REFERENCES employees(id) ON DELETE SET NULL
            );

            -- Team membership
            CREATE TABLE IF NOT EXISTS employee_project (
                employee_id TEXT NOT NULL,
                project_id TEXT NOT NULL,
                PRIMARY KEY (employee_id, project_id),
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_employee_project_project ON employee_project(project_id);

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                employee_full_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                deadline TEXT NOT NULL,
                completed_at TEXT,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_employee ON tasks(employee_id);

            CREATE TABLE IF NOT EXISTS bug_reports (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                employee_full_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_bug_reports_project ON bug_reports(project_id);

            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                employee_full_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_events_project ON events(project_id);

            -- Article titles and texts are parallel JSON arrays
            CREATE TABLE IF NOT EXISTS documentations (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                employee_full_name TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                article_titles TEXT NOT NULL DEFAULT '[]',
                articles TEXT NOT NULL DEFAULT '[]',
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_documentations_project ON documentations(project_id);
            "#,
        )?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match version {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                Ok(())
            }
            Some(v) if v == SCHEMA_VERSION => Ok(()),
            Some(v) => Err(StoreError::Storage(format!(
                "database schema version {} is not supported (expected {})",
                v, SCHEMA_VERSION
            ))),
        }
    }
}
