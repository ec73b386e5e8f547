//! Task entity type

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::{Entity, Priority, ProjectEntity, TaskStatus};

/// A unit of work inside a project, executed by one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    pub project_id: String,

    /// Executor
    pub employee_id: Uuid,

    #[serde(default)]
    pub employee_full_name: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    pub deadline: DateTime<Utc>,

    /// Set when the task is completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for Task {
    const KIND: &'static str = "Task";

    fn id_string(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ProjectEntity for Task {
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

impl Task {
    pub fn new(
        project_id: impl Into<String>,
        employee_id: Uuid,
        employee_full_name: impl Into<String>,
        name: impl Into<String>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            employee_id,
            employee_full_name: employee_full_name.into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            status: TaskStatus::default(),
            priority: Priority::default(),
            tags: BTreeSet::new(),
            deadline,
            completed_at: None,
        }
    }

    /// Add tags, builder style
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// True when the task carries every one of `tags`
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }

    /// Keep `completed_at` consistent with `status`
    pub fn normalize_completion(&mut self, now: DateTime<Utc>) {
        match self.status {
            TaskStatus::Completed => {
                if self.completed_at.is_none() {
                    self.completed_at = Some(now);
                }
            }
            TaskStatus::InProgress => self.completed_at = None,
        }
    }

    /// Mark completed at the given instant
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task::new("apollo", Uuid::new_v4(), "Lee Ann", "Write docs", Utc::now())
    }

    #[test]
    fn test_has_all_tags_requires_superset() {
        let t = task().with_tags(["x", "z"]);
        assert!(t.has_all_tags(&["x".to_string()]));
        assert!(!t.has_all_tags(&["x".to_string(), "y".to_string()]));
        assert!(t.has_all_tags(&[]));
    }

    #[test]
    fn test_normalize_completion() {
        let now = Utc::now();
        let mut t = task();
        t.status = TaskStatus::Completed;
        t.normalize_completion(now);
        assert_eq!(t.completed_at, Some(now));

        t.status = TaskStatus::InProgress;
        t.normalize_completion(now);
        assert!(t.completed_at.is_none());
    }
}
