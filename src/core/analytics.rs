//! Project analytics
//!
//! Pure folds over entities already loaded through the storage layer:
//! readiness percentage, status snapshots and per-employee labor
//! efficiency. The provider fetches the data and calls into these.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::entity::TaskStatus;
use crate::entities::{BugReport, Employee, Task};

/// Report key for the readiness percentage
pub const READINESS: &str = "readiness";
/// Report key for the task status snapshot
pub const TASK_STATUSES: &str = "task_statuses";
/// Report key for per-employee labor efficiency
pub const LABOR_EFFICIENCY: &str = "labor_efficiency";
/// Report key for the bug status snapshot
pub const BUG_STATUSES: &str = "bug_statuses";

/// Percentage of tasks marked COMPLETED; 0.0 when there are no tasks
pub fn readiness(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    completed as f64 / tasks.len() as f64 * 100.0
}

/// Name and status of one task or bug report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub name: String,
    pub status: String,
}

/// Entity id -> (name, status name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusSnapshot(BTreeMap<Uuid, StatusEntry>);

impl StatusSnapshot {
    pub fn get(&self, id: &Uuid) -> Option<&StatusEntry> {
        self.0.get(id)
    }

    pub fn status_of(&self, id: &Uuid) -> Option<&str> {
        self.0.get(id).map(|e| e.status.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries with the given status name
    pub fn count(&self, status: &str) -> usize {
        self.0.values().filter(|e| e.status == status).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &StatusEntry)> {
        self.0.iter()
    }
}

pub fn task_status_snapshot(tasks: &[Task]) -> StatusSnapshot {
    StatusSnapshot(
        tasks
            .iter()
            .map(|t| {
                (
                    t.id,
                    StatusEntry {
                        name: t.name.clone(),
                        status: t.status.to_string(),
                    },
                )
            })
            .collect(),
    )
}

pub fn bug_status_snapshot(bugs: &[BugReport]) -> StatusSnapshot {
    StatusSnapshot(
        bugs.iter()
            .map(|b| {
                (
                    b.id,
                    StatusEntry {
                        name: b.name.clone(),
                        status: b.status.to_string(),
                    },
                )
            })
            .collect(),
    )
}

/// Efficiency score of one team member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeEfficiency {
    pub employee_id: Uuid,
    pub full_name: String,
    pub task_count: usize,
    pub score: f64,
}

/// Contribution of a single task to its executor's score.
///
/// Completed tasks score `100 + days early` or `100 - days late`. An open
/// task past its deadline scores `100 - days overdue`; an open task still
/// within its deadline scores 0 but still counts toward the average.
/// Early completion is not capped, so scores above 100 are possible.
pub fn task_contribution(task: &Task, now: DateTime<Utc>) -> f64 {
    match (task.status, task.completed_at) {
        (TaskStatus::Completed, Some(completed_at)) => {
            let delta = (task.deadline - completed_at).num_days().abs() as f64;
            if task.deadline < completed_at {
                100.0 - delta
            } else {
                100.0 + delta
            }
        }
        // Completed without a completion stamp: treated as on time
        (TaskStatus::Completed, None) => 100.0,
        (TaskStatus::InProgress, _) if task.deadline < now => {
            let overdue = (now - task.deadline).num_days() as f64;
            100.0 - overdue
        }
        (TaskStatus::InProgress, _) => 0.0,
    }
}

/// Average task contribution per team member, evaluated at `now`.
///
/// `tasks` may contain tasks of other employees; each member only gets
/// their own. Members without tasks score 0.0.
pub fn labor_efficiency_at(
    team: &[Employee],
    tasks: &[Task],
    now: DateTime<Utc>,
) -> Vec<EmployeeEfficiency> {
    team.iter()
        .map(|employee| {
            let own: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.employee_id == employee.id)
                .collect();
            let score = if own.is_empty() {
                0.0
            } else {
                let sum: f64 = own.iter().map(|t| task_contribution(t, now)).sum();
                sum / own.len() as f64
            };
            EmployeeEfficiency {
                employee_id: employee.id,
                full_name: employee.full_name.clone(),
                task_count: own.len(),
                score,
            }
        })
        .collect()
}

/// One sub-report of [`ProjectCharacteristics`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Readiness(f64),
    Statuses(StatusSnapshot),
    Efficiency(Vec<EmployeeEfficiency>),
}

/// Keyed bag of sub-reports for a project. Always carries
/// [`READINESS`] and [`TASK_STATUSES`]; [`LABOR_EFFICIENCY`] and
/// [`BUG_STATUSES`] only when requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCharacteristics {
    pub project_id: String,
    pub reports: BTreeMap<String, Report>,
}

impl ProjectCharacteristics {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            reports: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, report: Report) {
        self.reports.insert(key.to_string(), report);
    }

    pub fn get(&self, key: &str) -> Option<&Report> {
        self.reports.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.reports.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.reports.keys().map(String::as_str)
    }

    pub fn readiness(&self) -> Option<f64> {
        match self.reports.get(READINESS) {
            Some(Report::Readiness(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn statuses(&self, key: &str) -> Option<&StatusSnapshot> {
        match self.reports.get(key) {
            Some(Report::Statuses(snapshot)) => Some(snapshot),
            _ => None,
        }
    }

    pub fn efficiency(&self) -> Option<&[EmployeeEfficiency]> {
        match self.reports.get(LABOR_EFFICIENCY) {
            Some(Report::Efficiency(scores)) => Some(scores),
            _ => None,
        }
    }
}
