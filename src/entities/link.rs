//! Employee-project membership link

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::entity::Entity;

/// Unique (employee, project) pair. Membership is what makes an employee
/// eligible as manager, executor or author inside the project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeProject {
    pub employee_id: Uuid,
    pub project_id: String,
}

impl Entity for EmployeeProject {
    const KIND: &'static str = "EmployeeProject";

    fn id_string(&self) -> String {
        format!("{}:{}", self.employee_id, self.project_id)
    }

    fn name(&self) -> &str {
        &self.project_id
    }
}

impl EmployeeProject {
    pub fn new(employee_id: Uuid, project_id: impl Into<String>) -> Self {
        Self {
            employee_id,
            project_id: project_id.into(),
        }
    }
}
