//! Bug report entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::{BugStatus, Entity, Priority, ProjectEntity};

/// A defect reported against a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugReport {
    pub id: Uuid,

    pub project_id: String,

    /// Reporter
    pub employee_id: Uuid,

    #[serde(default)]
    pub employee_full_name: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: BugStatus,

    #[serde(default)]
    pub priority: Priority,
}

impl Entity for BugReport {
    const KIND: &'static str = "BugReport";

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ProjectEntity for BugReport {
    fn id(&self) -> Uuid {
        self.id
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn employee_id(&self) -> Uuid {
        self.employee_id
    }

    fn employee_full_name(&self) -> &str {
        &self.employee_full_name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl BugReport {
    pub fn new(
        project_id: impl Into<String>,
        employee_id: Uuid,
        employee_full_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            employee_id,
            employee_full_name: employee_full_name.into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            status: BugStatus::default(),
            priority: Priority::default(),
        }
    }
}
