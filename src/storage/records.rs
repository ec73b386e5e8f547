//! Flat record shapes for the file backends
//!
//! Every column is a string so the same record type serializes cleanly to
//! both CSV rows and XML elements. Collections (task tags, documentation
//! bodies) are embedded as JSON text. Timestamps use RFC 3339.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::StoreError;
use crate::entities::{BugReport, Documentation, Employee, EmployeeProject, Event, Project, Task};

/// A row of one file table
pub(crate) trait Record: Serialize + DeserializeOwned + Clone {
    /// File stem and XML root element
    const TABLE: &'static str;

    /// Primary key rendered as text
    fn key(&self) -> String;
}

/// A row that belongs to a project and an employee
pub(crate) trait OwnedRecord: Record {
    fn project_id(&self) -> &str;
    fn employee_id(&self) -> &str;
}

pub(crate) fn encode_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub(crate) fn decode_time(table: &str, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::malformed(table, format!("timestamp '{}': {}", s, e)))
}

pub(crate) fn decode_opt_time(table: &str, s: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    if s.is_empty() {
        Ok(None)
    } else {
        decode_time(table, s).map(Some)
    }
}

pub(crate) fn decode_uuid(table: &str, s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::malformed(table, format!("uuid '{}': {}", s, e)))
}

pub(crate) fn decode_enum<T: std::str::FromStr<Err = String>>(
    table: &str,
    s: &str,
) -> Result<T, StoreError> {
    s.parse().map_err(|e| StoreError::malformed(table, e))
}

fn opt_string(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProjectRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    pub deadline: String,
    #[serde(default)]
    pub manager_id: String,
    pub created_at: String,
}

impl Record for ProjectRecord {
    const TABLE: &'static str = "projects";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl From<&Project> for ProjectRecord {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            status: p.status.to_string(),
            deadline: encode_time(&p.deadline),
            manager_id: p.manager_id.map(|m| m.to_string()).unwrap_or_default(),
            created_at: encode_time(&p.created_at),
        }
    }
}

impl ProjectRecord {
    pub fn into_project(self, team: BTreeSet<Uuid>) -> Result<Project, StoreError> {
        let t = Self::TABLE;
        Ok(Project {
            status: decode_enum(t, &self.status)?,
            deadline: decode_time(t, &self.deadline)?,
            manager_id: match self.manager_id.as_str() {
                "" => None,
                m => Some(decode_uuid(t, m)?),
            },
            created_at: decode_time(t, &self.created_at)?,
            team,
            id: self.id,
            name: self.name,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EmployeeRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub patronymic: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    pub position: String,
}

impl Record for EmployeeRecord {
    const TABLE: &'static str = "employees";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl From<&Employee> for EmployeeRecord {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id.to_string(),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            patronymic: e.patronymic.clone().unwrap_or_default(),
            birthday: e.birthday.map(|d| d.to_string()).unwrap_or_default(),
            email: e.email.clone(),
            phone_number: e.phone_number.clone(),
            position: e.position.clone(),
        }
    }
}

impl TryFrom<EmployeeRecord> for Employee {
    type Error = StoreError;

    fn try_from(r: EmployeeRecord) -> Result<Self, Self::Error> {
        let t = EmployeeRecord::TABLE;
        let birthday = match r.birthday.as_str() {
            "" => None,
            b => Some(
                NaiveDate::parse_from_str(b, "%Y-%m-%d")
                    .map_err(|e| StoreError::malformed(t, format!("birthday '{}': {}", b, e)))?,
            ),
        };
        let mut employee = Employee {
            id: decode_uuid(t, &r.id)?,
            first_name: r.first_name,
            last_name: r.last_name,
            patronymic: opt_string(&r.patronymic),
            full_name: String::new(),
            birthday,
            email: r.email,
            phone_number: r.phone_number,
            position: r.position,
        };
        employee.refresh_full_name();
        Ok(employee)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LinkRecord {
    pub employee_id: String,
    pub project_id: String,
}

impl Record for LinkRecord {
    const TABLE: &'static str = "employee_project";

    fn key(&self) -> String {
        format!("{}:{}", self.employee_id, self.project_id)
    }
}

impl From<&EmployeeProject> for LinkRecord {
    fn from(l: &EmployeeProject) -> Self {
        Self {
            employee_id: l.employee_id.to_string(),
            project_id: l.project_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TaskRecord {
    pub id: String,
    pub project_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_full_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub status: String,
    pub priority: String,
    /// JSON array
    #[serde(default)]
    pub tags: String,
    pub deadline: String,
    #[serde(default)]
    pub completed_at: String,
}

impl Record for TaskRecord {
    const TABLE: &'static str = "tasks";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl OwnedRecord for TaskRecord {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> &str {
        &self.employee_id
    }
}

impl TryFrom<&Task> for TaskRecord {
    type Error = StoreError;

    fn try_from(t: &Task) -> Result<Self, Self::Error> {
        Ok(Self {
            id: t.id.to_string(),
            project_id: t.project_id.clone(),
            employee_id: t.employee_id.to_string(),
            employee_full_name: t.employee_full_name.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            created_at: encode_time(&t.created_at),
            status: t.status.to_string(),
            priority: t.priority.to_string(),
            tags: serde_json::to_string(&t.tags)?,
            deadline: encode_time(&t.deadline),
            completed_at: t.completed_at.as_ref().map(encode_time).unwrap_or_default(),
        })
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = StoreError;

    fn try_from(r: TaskRecord) -> Result<Self, Self::Error> {
        let t = TaskRecord::TABLE;
        let tags: BTreeSet<String> = if r.tags.is_empty() {
            BTreeSet::new()
        } else {
            serde_json::from_str(&r.tags).map_err(|e| StoreError::malformed(t, e))?
        };
        Ok(Task {
            id: decode_uuid(t, &r.id)?,
            employee_id: decode_uuid(t, &r.employee_id)?,
            created_at: decode_time(t, &r.created_at)?,
            status: decode_enum(t, &r.status)?,
            priority: decode_enum(t, &r.priority)?,
            deadline: decode_time(t, &r.deadline)?,
            completed_at: decode_opt_time(t, &r.completed_at)?,
            tags,
            project_id: r.project_id,
            employee_full_name: r.employee_full_name,
            name: r.name,
            description: r.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BugReportRecord {
    pub id: String,
    pub project_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_full_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub status: String,
    pub priority: String,
}

impl Record for BugReportRecord {
    const TABLE: &'static str = "bug_reports";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl OwnedRecord for BugReportRecord {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> &str {
        &self.employee_id
    }
}

impl From<&BugReport> for BugReportRecord {
    fn from(b: &BugReport) -> Self {
        Self {
            id: b.id.to_string(),
            project_id: b.project_id.clone(),
            employee_id: b.employee_id.to_string(),
            employee_full_name: b.employee_full_name.clone(),
            name: b.name.clone(),
            description: b.description.clone(),
            created_at: encode_time(&b.created_at),
            status: b.status.to_string(),
            priority: b.priority.to_string(),
        }
    }
}

impl TryFrom<BugReportRecord> for BugReport {
    type Error = StoreError;

    fn try_from(r: BugReportRecord) -> Result<Self, Self::Error> {
        let t = BugReportRecord::TABLE;
        Ok(BugReport {
            id: decode_uuid(t, &r.id)?,
            employee_id: decode_uuid(t, &r.employee_id)?,
            created_at: decode_time(t, &r.created_at)?,
            status: decode_enum(t, &r.status)?,
            priority: decode_enum(t, &r.priority)?,
            project_id: r.project_id,
            employee_full_name: r.employee_full_name,
            name: r.name,
            description: r.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EventRecord {
    pub id: String,
    pub project_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_full_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub start_date: String,
    pub end_date: String,
}

impl Record for EventRecord {
    const TABLE: &'static str = "events";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl OwnedRecord for EventRecord {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> &str {
        &self.employee_id
    }
}

impl From<&Event> for EventRecord {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id.to_string(),
            project_id: e.project_id.clone(),
            employee_id: e.employee_id.to_string(),
            employee_full_name: e.employee_full_name.clone(),
            name: e.name.clone(),
            description: e.description.clone(),
            created_at: encode_time(&e.created_at),
            start_date: encode_time(&e.start_date),
            end_date: encode_time(&e.end_date),
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = StoreError;

    fn try_from(r: EventRecord) -> Result<Self, Self::Error> {
        let t = EventRecord::TABLE;
        Ok(Event {
            id: decode_uuid(t, &r.id)?,
            employee_id: decode_uuid(t, &r.employee_id)?,
            created_at: decode_time(t, &r.created_at)?,
            start_date: decode_time(t, &r.start_date)?,
            end_date: decode_time(t, &r.end_date)?,
            project_id: r.project_id,
            employee_full_name: r.employee_full_name,
            name: r.name,
            description: r.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DocumentationRecord {
    pub id: String,
    pub project_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_full_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    /// JSON object, title -> article
    #[serde(default)]
    pub body: String,
}

impl Record for DocumentationRecord {
    const TABLE: &'static str = "documentations";

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl OwnedRecord for DocumentationRecord {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> &str {
        &self.employee_id
    }
}

impl TryFrom<&Documentation> for DocumentationRecord {
    type Error = StoreError;

    fn try_from(d: &Documentation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: d.id.to_string(),
            project_id: d.project_id.clone(),
            employee_id: d.employee_id.to_string(),
            employee_full_name: d.employee_full_name.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            created_at: encode_time(&d.created_at),
            body: serde_json::to_string(&d.body)?,
        })
    }
}

impl TryFrom<DocumentationRecord> for Documentation {
    type Error = StoreError;

    fn try_from(r: DocumentationRecord) -> Result<Self, Self::Error> {
        let t = DocumentationRecord::TABLE;
        let body: BTreeMap<String, String> = if r.body.is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&r.body).map_err(|e| StoreError::malformed(t, e))?
        };
        Ok(Documentation {
            id: decode_uuid(t, &r.id)?,
            employee_id: decode_uuid(t, &r.employee_id)?,
            created_at: decode_time(t, &r.created_at)?,
            body,
            project_id: r.project_id,
            employee_full_name: r.employee_full_name,
            name: r.name,
            description: r.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_task_record_keeps_tags_and_completion() {
        let deadline = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut task = Task::new("apollo", Uuid::new_v4(), "Lee Ann", "Ship", deadline)
            .with_tags(["release", "q1"]);
        task.complete(deadline);

        let record = TaskRecord::try_from(&task).unwrap();
        assert_eq!(record.tags, r#"["q1","release"]"#);

        let back = Task::try_from(record).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_malformed_uuid_is_storage_error() {
        let record = EmployeeRecord {
            id: "not-a-uuid".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            patronymic: String::new(),
            birthday: String::new(),
            email: String::new(),
            phone_number: String::new(),
            position: "Dev".to_string(),
        };
        let err = Employee::try_from(record).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[test]
    fn test_employee_record_recomputes_full_name() {
        let mut employee = Employee::new("Ann", "Lee", "Dev");
        employee.birthday = NaiveDate::from_ymd_opt(1990, 5, 17);
        let mut record = EmployeeRecord::from(&employee);
        assert_eq!(record.birthday, "1990-05-17");

        record.last_name = "Park".to_string();
        let back = Employee::try_from(record).unwrap();
        assert_eq!(back.full_name, "Park Ann");
        assert_eq!(back.birthday, employee.birthday);
    }
}
