//! Referential integrity checks run before every mutation
//!
//! The file backends have no foreign-key engine, so every reference is
//! confirmed here through an [`ExistenceIndex`]. Checks never stop at the
//! first problem: all violations are collected so the caller gets the full
//! picture in one round trip.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use crate::core::entity::ProjectEntity;
use crate::core::error::StoreError;
use crate::entities::{Employee, Project};

/// Existence lookups the checker needs from a storage backend
pub trait ExistenceIndex {
    fn project_exists(&self, project_id: &str) -> Result<bool, StoreError>;

    fn employee_exists(&self, employee_id: Uuid) -> Result<bool, StoreError>;

    /// True when an employee-project link exists for the pair
    fn is_member(&self, employee_id: Uuid, project_id: &str) -> Result<bool, StoreError>;

    /// Project the task belongs to, if the task exists
    fn task_project(&self, task_id: Uuid) -> Result<Option<String>, StoreError>;
}

/// Category of a single violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A referenced project/employee/task does not exist
    MissingReference,
    /// A field value is empty or malformed
    InvalidField,
    /// The employee is not on the project's team
    Membership,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub kind: ViolationKind,
}

/// Accumulated violations for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>, kind: ViolationKind) {
        self.0.push(Violation {
            field: field.to_string(),
            message: message.into(),
            kind,
        });
    }

    pub fn missing(&mut self, field: &str, message: impl Into<String>) {
        self.push(field, message, ViolationKind::MissingReference);
    }

    pub fn invalid(&mut self, field: &str, message: impl Into<String>) {
        self.push(field, message, ViolationKind::InvalidField);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn has_missing_reference(&self) -> bool {
        self.0
            .iter()
            .any(|v| v.kind == ViolationKind::MissingReference)
    }

    /// Messages recorded against `field`
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|v| v.field == field)
            .map(|v| v.message.as_str())
            .collect()
    }

    /// field -> message; several messages on one field are joined with "; "
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for v in &self.0 {
            map.entry(v.field.clone())
                .and_modify(|m| {
                    m.push_str("; ");
                    m.push_str(&v.message);
                })
                .or_insert_with(|| v.message.clone());
        }
        map
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), StoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Invalid(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Pre-write validation over any [`ExistenceIndex`]
pub struct IntegrityChecker<'a, I: ExistenceIndex + ?Sized> {
    index: &'a I,
}

impl<'a, I: ExistenceIndex + ?Sized> IntegrityChecker<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// Checks for creating or updating a task, bug report, event or document
    pub fn check_project_entity<E: ProjectEntity>(
        &self,
        entity: &E,
    ) -> Result<Violations, StoreError> {
        let mut errors = Violations::new();
        let project_id = entity.project_id();
        let employee_id = entity.employee_id();

        let project_exists = self.index.project_exists(project_id)?;
        if !project_exists {
            errors.missing("project", format!("Project {} does not exist", project_id));
        }

        let employee_exists = self.index.employee_exists(employee_id)?;
        if !employee_exists {
            errors.missing("employee", format!("Employee {} does not exist", employee_id));
        }

        if !self.index.is_member(employee_id, project_id)? {
            errors.push(
                "employee",
                format!(
                    "Employee {} is not a member of project {}",
                    employee_id, project_id
                ),
                ViolationKind::Membership,
            );
        }

        if entity.name().trim().is_empty() {
            errors.invalid("name", "Name must not be empty");
        }
        if entity.employee_full_name().trim().is_empty() {
            errors.invalid("employeeFullName", "Employee full name must not be empty");
        }

        Ok(errors)
    }

    /// Field checks for an employee; no references involved
    pub fn check_employee(&self, employee: &Employee) -> Violations {
        let mut errors = Violations::new();
        if employee.first_name.trim().is_empty() {
            errors.invalid("firstName", "First name must not be empty");
        }
        if employee.last_name.trim().is_empty() {
            errors.invalid("lastName", "Last name must not be empty");
        }
        if employee.position.trim().is_empty() {
            errors.invalid("position", "Position must not be empty");
        }
        if !employee.email.is_empty() && !employee.email.contains('@') {
            errors.invalid("email", format!("Invalid email address: {}", employee.email));
        }
        errors
    }

    /// Checks for creating or updating a project
    pub fn check_project(&self, project: &Project) -> Result<Violations, StoreError> {
        let mut errors = Violations::new();

        if project.id.trim().is_empty() {
            errors.invalid("id", "Project id must not be empty");
        } else if project.id.chars().any(char::is_whitespace) {
            errors.invalid("id", "Project id must not contain whitespace");
        }
        if project.name.trim().is_empty() {
            errors.invalid("name", "Name must not be empty");
        }

        for member in &project.team {
            if !self.index.employee_exists(*member)? {
                errors.missing("team", format!("Employee {} does not exist", member));
            }
        }

        if let Some(manager) = project.manager_id {
            if !project.has_member(manager) {
                errors.push(
                    "manager",
                    format!("Manager {} is not a member of the project team", manager),
                    ViolationKind::Membership,
                );
            }
        }

        Ok(errors)
    }

    /// Checks for assigning a task to an executor. All four lookups run even
    /// when an earlier one fails.
    pub fn check_task_executor(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        project_id: &str,
    ) -> Result<Violations, StoreError> {
        let mut errors = Violations::new();

        match self.index.task_project(task_id)? {
            None => errors.missing("task", format!("Task {} does not exist", task_id)),
            Some(owner) if owner != project_id => errors.invalid(
                "task",
                format!("Task {} does not belong to project {}", task_id, project_id),
            ),
            Some(_) => {}
        }

        if !self.index.employee_exists(employee_id)? {
            errors.missing("employee", format!("Employee {} does not exist", employee_id));
        }

        if !self.index.project_exists(project_id)? {
            errors.missing("project", format!("Project {} does not exist", project_id));
        }

        if !self.index.is_member(employee_id, project_id)? {
            errors.push(
                "employee",
                format!(
                    "Employee {} is not a member of project {}",
                    employee_id, project_id
                ),
                ViolationKind::Membership,
            );
        }

        Ok(errors)
    }

    /// Checks for making an employee the project manager
    pub fn check_project_manager(
        &self,
        project_id: &str,
        employee_id: Uuid,
    ) -> Result<Violations, StoreError> {
        let mut errors = Violations::new();

        if !self.index.project_exists(project_id)? {
            errors.missing("project", format!("Project {} does not exist", project_id));
        }
        if !self.index.employee_exists(employee_id)? {
            errors.missing("employee", format!("Employee {} does not exist", employee_id));
        }
        if !self.index.is_member(employee_id, project_id)? {
            errors.push(
                "employee",
                format!(
                    "Employee {} is not a member of project {}",
                    employee_id, project_id
                ),
                ViolationKind::Membership,
            );
        }

        Ok(errors)
    }

    /// Checks for linking an employee to a project. A duplicate link is not
    /// a violation here; the backend reports it as a conflict.
    pub fn check_membership_binding(
        &self,
        employee_id: Uuid,
        project_id: &str,
    ) -> Result<Violations, StoreError> {
        let mut errors = Violations::new();

        if !self.index.employee_exists(employee_id)? {
            errors.missing("employee", format!("Employee {} does not exist", employee_id));
        }
        if !self.index.project_exists(project_id)? {
            errors.missing("project", format!("Project {} does not exist", project_id));
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Task;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeIndex {
        projects: HashSet<String>,
        employees: HashSet<Uuid>,
        tasks: HashMap<Uuid, String>,
        links: HashSet<(Uuid, String)>,
    }

    impl ExistenceIndex for FakeIndex {
        fn project_exists(&self, project_id: &str) -> Result<bool, StoreError> {
            Ok(self.projects.contains(project_id))
        }

        fn employee_exists(&self, employee_id: Uuid) -> Result<bool, StoreError> {
            Ok(self.employees.contains(&employee_id))
        }

        fn is_member(&self, employee_id: Uuid, project_id: &str) -> Result<bool, StoreError> {
            Ok(self.links.contains(&(employee_id, project_id.to_string())))
        }

        fn task_project(&self, task_id: Uuid) -> Result<Option<String>, StoreError> {
            Ok(self.tasks.get(&task_id).cloned())
        }
    }

    #[test]
    fn test_project_entity_collects_every_violation() {
        let index = FakeIndex::default();
        let checker = IntegrityChecker::new(&index);
        let task = Task::new("ghost", Uuid::new_v4(), "", "", Utc::now());

        let errors = checker.check_project_entity(&task).unwrap();

        assert_eq!(errors.len(), 5);
        assert_eq!(errors.messages_for("employee").len(), 2);
        assert!(errors.has_missing_reference());
        let map = errors.to_map();
        assert!(map.contains_key("project"));
        assert!(map.contains_key("name"));
        assert!(map.contains_key("employeeFullName"));
        assert!(map["employee"].contains("; "));
    }

    #[test]
    fn test_member_passes() {
        let employee = Uuid::new_v4();
        let mut index = FakeIndex::default();
        index.projects.insert("apollo".to_string());
        index.employees.insert(employee);
        index.links.insert((employee, "apollo".to_string()));

        let checker = IntegrityChecker::new(&index);
        let task = Task::new("apollo", employee, "Lee Ann", "Ship it", Utc::now());

        assert!(checker.check_project_entity(&task).unwrap().is_empty());
    }

    #[test]
    fn test_non_member_is_membership_violation() {
        let employee = Uuid::new_v4();
        let mut index = FakeIndex::default();
        index.projects.insert("apollo".to_string());
        index.employees.insert(employee);

        let checker = IntegrityChecker::new(&index);
        let task = Task::new("apollo", employee, "Lee Ann", "Ship it", Utc::now());
        let errors = checker.check_project_entity(&task).unwrap();

        assert_eq!(errors.len(), 1);
        assert!(!errors.has_missing_reference());
        assert!(errors.messages_for("employee")[0].contains("not a member"));
    }

    #[test]
    fn test_employee_required_fields() {
        let index = FakeIndex::default();
        let checker = IntegrityChecker::new(&index);
        let mut employee = Employee::new(" ", "", "");
        employee.email = "nope".to_string();

        let errors = checker.check_employee(&employee);
        let map = errors.to_map();
        assert_eq!(errors.len(), 4);
        assert!(map.contains_key("firstName"));
        assert!(map.contains_key("lastName"));
        assert!(map.contains_key("position"));
        assert!(map.contains_key("email"));
    }

    #[test]
    fn test_task_executor_runs_all_checks() {
        let index = FakeIndex::default();
        let checker = IntegrityChecker::new(&index);

        let errors = checker
            .check_task_executor(Uuid::new_v4(), Uuid::new_v4(), "apollo")
            .unwrap();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.messages_for("task").len(), 1);
        assert_eq!(errors.messages_for("project").len(), 1);
        assert_eq!(errors.messages_for("employee").len(), 2);
    }

    #[test]
    fn test_task_from_other_project_is_rejected() {
        let task = Uuid::new_v4();
        let employee = Uuid::new_v4();
        let mut index = FakeIndex::default();
        index.projects.insert("apollo".to_string());
        index.employees.insert(employee);
        index.links.insert((employee, "apollo".to_string()));
        index.tasks.insert(task, "gemini".to_string());

        let checker = IntegrityChecker::new(&index);
        let errors = checker.check_task_executor(task, employee, "apollo").unwrap();

        assert_eq!(errors.len(), 1);
        assert!(errors.messages_for("task")[0].contains("does not belong"));
    }

    #[test]
    fn test_project_manager_must_be_in_team() {
        let index = FakeIndex::default();
        let checker = IntegrityChecker::new(&index);
        let mut project = Project::new("apollo", "Apollo", Utc::now());
        project.manager_id = Some(Uuid::new_v4());

        let errors = checker.check_project(&project).unwrap();
        assert_eq!(errors.messages_for("manager").len(), 1);
    }

    #[test]
    fn test_project_slug_rejects_whitespace() {
        let index = FakeIndex::default();
        let checker = IntegrityChecker::new(&index);
        let project = Project::new("apollo moon", "Apollo", Utc::now());

        let errors = checker.check_project(&project).unwrap();
        assert_eq!(errors.messages_for("id").len(), 1);
    }
}
