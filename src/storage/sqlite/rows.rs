//! Row mapping between SQLite rows and entities
//!
//! Rows are read into the same flat records the file backends use, so
//! decoding (timestamps, enums, uuids) goes through one code path.

use rusqlite::Row;

use crate::core::error::StoreError;
use crate::entities::Documentation;
use crate::storage::records::{
    decode_time, decode_uuid, BugReportRecord, EmployeeRecord, EventRecord, ProjectRecord,
    TaskRecord,
};

pub(super) const PROJECT_COLUMNS: &str =
    "id, name, description, status, deadline, manager_id, created_at";

pub(super) const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, patronymic, birthday, email, phone_number, position";

pub(super) const TASK_COLUMNS: &str = "id, project_id, employee_id, employee_full_name, name, \
     description, created_at, status, priority, tags, deadline, completed_at";

pub(super) const BUG_REPORT_COLUMNS: &str = "id, project_id, employee_id, employee_full_name, \
     name, description, created_at, status, priority";

pub(super) const EVENT_COLUMNS: &str = "id, project_id, employee_id, employee_full_name, name, \
     description, created_at, start_date, end_date";

pub(super) const DOCUMENTATION_COLUMNS: &str = "id, project_id, employee_id, \
     employee_full_name, name, description, created_at, article_titles, articles";

/// Empty strings are stored as NULL in nullable columns
pub(super) fn nullable(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn text_or_empty(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

pub(super) fn project_record(row: &Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        deadline: row.get(4)?,
        manager_id: text_or_empty(row, 5)?,
        created_at: row.get(6)?,
    })
}

pub(super) fn employee_record(row: &Row<'_>) -> rusqlite::Result<EmployeeRecord> {
    Ok(EmployeeRecord {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        patronymic: text_or_empty(row, 3)?,
        birthday: text_or_empty(row, 4)?,
        email: row.get(5)?,
        phone_number: row.get(6)?,
        position: row.get(7)?,
    })
}

pub(super) fn task_record(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        employee_id: row.get(2)?,
        employee_full_name: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        status: row.get(7)?,
        priority: row.get(8)?,
        tags: row.get(9)?,
        deadline: row.get(10)?,
        completed_at: text_or_empty(row, 11)?,
    })
}

pub(super) fn bug_report_record(row: &Row<'_>) -> rusqlite::Result<BugReportRecord> {
    Ok(BugReportRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        employee_id: row.get(2)?,
        employee_full_name: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        status: row.get(7)?,
        priority: row.get(8)?,
    })
}

pub(super) fn event_record(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    Ok(EventRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        employee_id: row.get(2)?,
        employee_full_name: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
    })
}

/// Raw documentation row; the body is still split into JSON columns
pub(super) struct DocumentationRow {
    id: String,
    project_id: String,
    employee_id: String,
    employee_full_name: String,
    name: String,
    description: String,
    created_at: String,
    article_titles: String,
    articles: String,
}

pub(super) fn documentation_row(row: &Row<'_>) -> rusqlite::Result<DocumentationRow> {
    Ok(DocumentationRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        employee_id: row.get(2)?,
        employee_full_name: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        article_titles: row.get(7)?,
        articles: row.get(8)?,
    })
}

impl TryFrom<DocumentationRow> for Documentation {
    type Error = StoreError;

    fn try_from(r: DocumentationRow) -> Result<Self, Self::Error> {
        let t = "documentations";
        let titles: Vec<String> =
            serde_json::from_str(&r.article_titles).map_err(|e| StoreError::malformed(t, e))?;
        let articles: Vec<String> =
            serde_json::from_str(&r.articles).map_err(|e| StoreError::malformed(t, e))?;
        Ok(Documentation {
            id: decode_uuid(t, &r.id)?,
            employee_id: decode_uuid(t, &r.employee_id)?,
            created_at: decode_time(t, &r.created_at)?,
            body: Documentation::body_from_columns(titles, articles),
            project_id: r.project_id,
            employee_full_name: r.employee_full_name,
            name: r.name,
            description: r.description,
        })
    }
}
