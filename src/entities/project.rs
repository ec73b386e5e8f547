//! Project entity type

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::{Entity, ProjectStatus};

/// A project, identified by a human-assigned slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Slug identifier (e.g. "apollo")
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ProjectStatus,

    pub deadline: DateTime<Utc>,

    /// Manager, must be a member of `team`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<Uuid>,

    /// Team members. Derived from employee-project links on every read.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub team: BTreeSet<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl Entity for Project {
    const KIND: &'static str = "Project";

    fn id_string(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Project {
    /// Create a new in-progress project with an empty team
    pub fn new(id: impl Into<String>, name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::default(),
            deadline,
            manager_id: None,
            team: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn has_member(&self, employee_id: Uuid) -> bool {
        self.team.contains(&employee_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_roundtrip() {
        let mut project = Project::new("apollo", "Apollo", Utc::now());
        project.team.insert(Uuid::new_v4());

        let yaml = serde_yml::to_string(&project).unwrap();
        let parsed: Project = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(project, parsed);
        assert!(yaml.contains("status: IN_PROGRESS"));
    }
}
