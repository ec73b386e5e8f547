//! Event entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::{Entity, ProjectEntity};

/// A scheduled project event (meeting, release, demo)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,

    pub project_id: String,

    /// Organizer
    pub employee_id: Uuid,

    #[serde(default)]
    pub employee_full_name: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,
}

impl Entity for Event {
    const KIND: &'static str = "Event";

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ProjectEntity for Event {
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

impl Event {
    pub fn new(
        project_id: impl Into<String>,
        employee_id: Uuid,
        employee_full_name: impl Into<String>,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            employee_id,
            employee_full_name: employee_full_name.into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            start_date,
            end_date,
        }
    }
}
