//! Data provider: the public operation surface over any backend
//!
//! Every mutation runs the [`IntegrityChecker`] first and touches storage
//! only when no violation was found. Every create/update/delete/bind
//! attempt, successful or not, produces one audit record. Errors never
//! escape as `Err`: callers get an [`Outcome`] and branch on its code.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::analytics::{
    self, EmployeeEfficiency, ProjectCharacteristics, Report, StatusSnapshot,
};
use crate::core::audit::{AuditRecord, AuditSink, AuditStatus, ChangeType, JsonlAuditSink, NullAuditSink};
use crate::core::config::{BackendKind, Config};
use crate::core::entity::{Entity, ProjectEntity};
use crate::core::error::StoreError;
use crate::core::integrity::{IntegrityChecker, Violations};
use crate::core::outcome::Outcome;
use crate::entities::{BugReport, Documentation, Employee, EmployeeProject, Event, Project, Task};
use crate::storage::{open_backend, StorageBackend};

/// Backend access for one kind of project entity
trait OwnedEntity: ProjectEntity + Clone {
    /// Plural used in "No ... found" messages
    const PLURAL: &'static str;

    fn fetch(backend: &dyn StorageBackend, id: Uuid) -> Result<Option<Self>, StoreError>;
    fn fetch_by_project(backend: &dyn StorageBackend, project_id: &str)
        -> Result<Vec<Self>, StoreError>;
    fn insert(backend: &dyn StorageBackend, entity: &Self) -> Result<(), StoreError>;
    fn replace(backend: &dyn StorageBackend, entity: &Self) -> Result<bool, StoreError>;
    fn remove(backend: &dyn StorageBackend, id: Uuid) -> Result<bool, StoreError>;

    /// Carry over the creation time of the stored row
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// Field rules of this kind on top of the reference checks
    fn field_violations(&self, _errors: &mut Violations) {}
}

impl OwnedEntity for Task {
    const PLURAL: &'static str = "tasks";

    fn fetch(backend: &dyn StorageBackend, id: Uuid) -> Result<Option<Self>, StoreError> {
        backend.fetch_task(id)
    }
    fn fetch_by_project(backend: &dyn StorageBackend, project_id: &str) -> Result<Vec<Self>, StoreError> {
        backend.fetch_tasks_by_project(project_id)
    }
    fn insert(backend: &dyn StorageBackend, entity: &Self) -> Result<(), StoreError> {
        backend.insert_task(entity)
    }
    fn replace(backend: &dyn StorageBackend, entity: &Self) -> Result<bool, StoreError> {
        backend.replace_task(entity)
    }
    fn remove(backend: &dyn StorageBackend, id: Uuid) -> Result<bool, StoreError> {
        backend.remove_task(id)
    }
    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }
}

impl OwnedEntity for BugReport {
    const PLURAL: &'static str = "bug reports";

    fn fetch(backend: &dyn StorageBackend, id: Uuid) -> Result<Option<Self>, StoreError> {
        backend.fetch_bug_report(id)
    }
    fn fetch_by_project(backend: &dyn StorageBackend, project_id: &str) -> Result<Vec<Self>, StoreError> {
        backend.fetch_bug_reports_by_project(project_id)
    }
    fn insert(backend: &dyn StorageBackend, entity: &Self) -> Result<(), StoreError> {
        backend.insert_bug_report(entity)
    }
    fn replace(backend: &dyn StorageBackend, entity: &Self) -> Result<bool, StoreError> {
        backend.replace_bug_report(entity)
    }
    fn remove(backend: &dyn StorageBackend, id: Uuid) -> Result<bool, StoreError> {
        backend.remove_bug_report(id)
    }
    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }
}

impl OwnedEntity for Event {
    const PLURAL: &'static str = "events";

    fn fetch(backend: &dyn StorageBackend, id: Uuid) -> Result<Option<Self>, StoreError> {
        backend.fetch_event(id)
    }
    fn fetch_by_project(backend: &dyn StorageBackend, project_id: &str) -> Result<Vec<Self>, StoreError> {
        backend.fetch_events_by_project(project_id)
    }
    fn insert(backend: &dyn StorageBackend, entity: &Self) -> Result<(), StoreError> {
        backend.insert_event(entity)
    }
    fn replace(backend: &dyn StorageBackend, entity: &Self) -> Result<bool, StoreError> {
        backend.replace_event(entity)
    }
    fn remove(backend: &dyn StorageBackend, id: Uuid) -> Result<bool, StoreError> {
        backend.remove_event(id)
    }
    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }
    fn field_violations(&self, errors: &mut Violations) {
        if self.end_date < self.start_date {
            errors.invalid("endDate", "End date must not precede start date");
        }
    }
}

impl OwnedEntity for Documentation {
    const PLURAL: &'static str = "documentation";

    fn fetch(backend: &dyn StorageBackend, id: Uuid) -> Result<Option<Self>, StoreError> {
        backend.fetch_documentation(id)
    }
    fn fetch_by_project(backend: &dyn StorageBackend, project_id: &str) -> Result<Vec<Self>, StoreError> {
        backend.fetch_documentation_by_project(project_id)
    }
    fn insert(backend: &dyn StorageBackend, entity: &Self) -> Result<(), StoreError> {
        backend.insert_documentation(entity)
    }
    fn replace(backend: &dyn StorageBackend, entity: &Self) -> Result<bool, StoreError> {
        backend.replace_documentation(entity)
    }
    fn remove(backend: &dyn StorageBackend, id: Uuid) -> Result<bool, StoreError> {
        backend.remove_documentation(id)
    }
    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }
}

/// Binds fail with NOT_FOUND when a referenced entity is missing, and
/// with INVALID_DATA for every other violation.
fn bind_outcome<T>(result: Result<T, StoreError>) -> Outcome<T> {
    match result {
        Err(StoreError::Invalid(violations)) if violations.has_missing_reference() => Outcome {
            errors: violations.to_map(),
            ..Outcome::not_found("Referenced entity does not exist")
        },
        other => Outcome::from_result(other),
    }
}

/// Storage operations with validation, audit and uniform results
pub struct DataProvider {
    backend: Box<dyn StorageBackend>,
    audit: Box<dyn AuditSink>,
    actor: String,
}

impl DataProvider {
    pub fn new(
        backend: Box<dyn StorageBackend>,
        audit: Box<dyn AuditSink>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            audit,
            actor: actor.into(),
        }
    }

    /// Open the backend and audit trail named by `config`
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let backend = open_backend(config)?;
        let audit: Box<dyn AuditSink> = if config.audit_enabled() {
            let sink = JsonlAuditSink::new(config.audit_dir())
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            Box::new(sink)
        } else {
            Box::new(NullAuditSink)
        };
        Ok(Self::new(backend, audit, config.actor()))
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    fn checker(&self) -> IntegrityChecker<'_, dyn StorageBackend> {
        IntegrityChecker::new(self.backend.as_ref())
    }

    /// Emit the audit record for a finished mutation and hand the outcome
    /// back unchanged
    fn audited<T, S: Serialize + ?Sized>(
        &self,
        class_name: &str,
        method_name: &str,
        change: ChangeType,
        snapshot: &S,
        outcome: Outcome<T>,
    ) -> Outcome<T> {
        let status = if outcome.is_success() {
            AuditStatus::Success
        } else {
            AuditStatus::Fault
        };
        let entity = serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null);
        let record = AuditRecord::new(class_name, method_name, &self.actor, status, change, entity);
        if let Err(e) = self.audit.record(&record) {
            tracing::warn!(class = class_name, method = method_name, error = %e, "audit record dropped");
        }
        tracing::debug!(method = method_name, code = %outcome.code, "operation finished");
        outcome
    }

    fn require_project(&self, project_id: &str) -> Result<(), StoreError> {
        if self.backend.project_exists(project_id)? {
            Ok(())
        } else {
            Err(StoreError::not_found(Project::KIND, project_id))
        }
    }

    fn lookup<T>(found: Result<Option<T>, StoreError>, kind: &'static str, id: impl ToString) -> Outcome<T> {
        Outcome::from_result(found.and_then(|f| f.ok_or_else(|| StoreError::not_found(kind, id))))
    }

    // ----- Projects -------------------------------------------------------

    /// Store a new project. Members listed in `team` are linked right away;
    /// a manager must be one of them.
    pub fn create_project(&self, project: Project) -> Outcome<Project> {
        let result = self.try_create_project(&project);
        self.audited(
            Project::KIND,
            "create_project",
            ChangeType::Create,
            &project,
            Outcome::from_result(result),
        )
    }

    fn try_create_project(&self, project: &Project) -> Result<Project, StoreError> {
        if self.backend.project_exists(&project.id)? {
            return Err(StoreError::Conflict(format!(
                "Project {} already exists",
                project.id
            )));
        }
        self.checker().check_project(project)?.into_result()?;
        self.backend.insert_project(project)?;
        for member in &project.team {
            self.backend
                .insert_link(&EmployeeProject::new(*member, project.id.clone()))?;
        }
        Ok(project.clone())
    }

    pub fn get_project_by_id(&self, id: &str) -> Outcome<Project> {
        Self::lookup(self.backend.fetch_project(id), Project::KIND, id)
    }

    /// Update name, description, status, deadline and manager. The team is
    /// managed through [`bind_employee_to_project`](Self::bind_employee_to_project)
    /// and is not changed here.
    pub fn update_project(&self, project: Project) -> Outcome<Project> {
        let result = self.try_update_project(&project);
        self.audited(
            Project::KIND,
            "update_project",
            ChangeType::Update,
            &project,
            Outcome::from_result(result),
        )
    }

    fn try_update_project(&self, project: &Project) -> Result<Project, StoreError> {
        let stored = self
            .backend
            .fetch_project(&project.id)?
            .ok_or_else(|| StoreError::not_found(Project::KIND, &project.id))?;
        let updated = Project {
            team: stored.team,
            created_at: stored.created_at,
            ..project.clone()
        };
        self.checker().check_project(&updated)?.into_result()?;
        self.backend.replace_project(&updated)?;
        Ok(updated)
    }

    /// Delete a project together with its tasks, bug reports, events,
    /// documentation and team links
    pub fn delete_project(&self, id: &str) -> Outcome<Project> {
        let found = self.backend.fetch_project(id);
        let snapshot = match &found {
            Ok(Some(p)) => serde_json::to_value(p).unwrap_or_default(),
            _ => json!({ "id": id }),
        };
        let result = found.and_then(|f| {
            let project = f.ok_or_else(|| StoreError::not_found(Project::KIND, id))?;
            self.backend.remove_project(id)?;
            Ok(project)
        });
        self.audited(
            Project::KIND,
            "delete_project",
            ChangeType::Delete,
            &snapshot,
            Outcome::from_result(result),
        )
    }

    // ----- Employees ------------------------------------------------------

    pub fn create_employee(&self, mut employee: Employee) -> Outcome<Employee> {
        employee.refresh_full_name();
        let result = self.try_create_employee(&employee);
        self.audited(
            Employee::KIND,
            "create_employee",
            ChangeType::Create,
            &employee,
            Outcome::from_result(result),
        )
    }

    fn try_create_employee(&self, employee: &Employee) -> Result<Employee, StoreError> {
        self.checker().check_employee(employee).into_result()?;
        self.backend.insert_employee(employee)?;
        Ok(employee.clone())
    }

    pub fn get_employee_by_id(&self, id: Uuid) -> Outcome<Employee> {
        Self::lookup(self.backend.fetch_employee(id), Employee::KIND, id)
    }

    /// Team members of a project
    pub fn get_employees_by_project_id(&self, project_id: &str) -> Outcome<Vec<Employee>> {
        match self.backend.fetch_team(project_id) {
            Ok(team) => Outcome::from_collection(team, "employees"),
            Err(e) => e.into(),
        }
    }

    pub fn update_employee(&self, mut employee: Employee) -> Outcome<Employee> {
        employee.refresh_full_name();
        let result = self.try_update_employee(&employee);
        self.audited(
            Employee::KIND,
            "update_employee",
            ChangeType::Update,
            &employee,
            Outcome::from_result(result),
        )
    }

    fn try_update_employee(&self, employee: &Employee) -> Result<Employee, StoreError> {
        if !self.backend.employee_exists(employee.id)? {
            return Err(StoreError::not_found(Employee::KIND, employee.id));
        }
        self.checker().check_employee(employee).into_result()?;
        self.backend.replace_employee(employee)?;
        Ok(employee.clone())
    }

    /// Delete an employee with their links and authored entities; projects
    /// they managed lose their manager
    pub fn delete_employee(&self, id: Uuid) -> Outcome<Employee> {
        let found = self.backend.fetch_employee(id);
        let snapshot = match &found {
            Ok(Some(e)) => serde_json::to_value(e).unwrap_or_default(),
            _ => json!({ "id": id }),
        };
        let result = found.and_then(|f| {
            let employee = f.ok_or_else(|| StoreError::not_found(Employee::KIND, id))?;
            self.backend.remove_employee(id)?;
            Ok(employee)
        });
        self.audited(
            Employee::KIND,
            "delete_employee",
            ChangeType::Delete,
            &snapshot,
            Outcome::from_result(result),
        )
    }

    // ----- Project entities (shared) -------------------------------------

    fn create_owned<E: OwnedEntity>(&self, entity: E, method: &str) -> Outcome<E> {
        let result = self.try_create_owned(&entity);
        self.audited(E::KIND, method, ChangeType::Create, &entity, Outcome::from_result(result))
    }

    fn try_create_owned<E: OwnedEntity>(&self, entity: &E) -> Result<E, StoreError> {
        if E::fetch(self.backend.as_ref(), entity.id())?.is_some() {
            return Err(StoreError::Conflict(format!(
                "{} {} already exists",
                E::KIND,
                entity.id()
            )));
        }
        let mut errors = self.checker().check_project_entity(entity)?;
        entity.field_violations(&mut errors);
        errors.into_result()?;
        E::insert(self.backend.as_ref(), entity)?;
        Ok(entity.clone())
    }

    fn get_owned<E: OwnedEntity>(&self, id: Uuid) -> Outcome<E> {
        Self::lookup(E::fetch(self.backend.as_ref(), id), E::KIND, id)
    }

    fn list_owned<E: OwnedEntity>(&self, project_id: &str) -> Outcome<Vec<E>> {
        match E::fetch_by_project(self.backend.as_ref(), project_id) {
            Ok(rows) => Outcome::from_collection(rows, E::PLURAL),
            Err(e) => e.into(),
        }
    }

    fn update_owned<E: OwnedEntity>(&self, mut entity: E, method: &str) -> Outcome<E> {
        let result = self.try_update_owned(&mut entity);
        self.audited(E::KIND, method, ChangeType::Update, &entity, Outcome::from_result(result))
    }

    /// `created_at` is fixed at creation; the stored value always wins
    fn try_update_owned<E: OwnedEntity>(&self, entity: &mut E) -> Result<E, StoreError> {
        let stored = E::fetch(self.backend.as_ref(), entity.id())?
            .ok_or_else(|| StoreError::not_found(E::KIND, entity.id()))?;
        entity.set_created_at(stored.created_at());
        let mut errors = self.checker().check_project_entity(&*entity)?;
        entity.field_violations(&mut errors);
        errors.into_result()?;
        E::replace(self.backend.as_ref(), entity)?;
        Ok(entity.clone())
    }

    fn delete_owned<E: OwnedEntity>(&self, id: Uuid, method: &str) -> Outcome<E> {
        let found = E::fetch(self.backend.as_ref(), id);
        let snapshot = match &found {
            Ok(Some(e)) => serde_json::to_value(e).unwrap_or_default(),
            _ => json!({ "id": id }),
        };
        let result = found.and_then(|f| {
            let entity = f.ok_or_else(|| StoreError::not_found(E::KIND, id))?;
            E::remove(self.backend.as_ref(), id)?;
            Ok(entity)
        });
        self.audited(E::KIND, method, ChangeType::Delete, &snapshot, Outcome::from_result(result))
    }

    // ----- Tasks ----------------------------------------------------------

    /// Store a new task. A COMPLETED task without a completion time is
    /// stamped with the current time.
    pub fn create_task(&self, mut task: Task) -> Outcome<Task> {
        task.normalize_completion(Utc::now());
        self.create_owned(task, "create_task")
    }

    pub fn get_task_by_id(&self, id: Uuid) -> Outcome<Task> {
        self.get_owned(id)
    }

    pub fn get_tasks_by_project_id(&self, project_id: &str) -> Outcome<Vec<Task>> {
        self.list_owned(project_id)
    }

    /// Every task assigned to the employee, across all projects
    pub fn get_tasks_by_employee_id(&self, employee_id: Uuid) -> Outcome<Vec<Task>> {
        match self.backend.fetch_tasks_by_employee(employee_id) {
            Ok(tasks) => Outcome::from_collection(tasks, "tasks"),
            Err(e) => e.into(),
        }
    }

    /// Tasks of a project carrying every one of `tags`
    pub fn get_tasks_by_tags(&self, tags: &[String], project_id: &str) -> Outcome<Vec<Task>> {
        match self.backend.fetch_tasks_by_project(project_id) {
            Ok(tasks) => {
                let matching = tasks.into_iter().filter(|t| t.has_all_tags(tags)).collect();
                Outcome::from_collection(matching, "tasks")
            }
            Err(e) => e.into(),
        }
    }

    /// Replace a task. Moving to COMPLETED stamps `completed_at` when unset;
    /// moving back to IN_PROGRESS clears it.
    pub fn update_task(&self, mut task: Task) -> Outcome<Task> {
        task.normalize_completion(Utc::now());
        self.update_owned(task, "update_task")
    }

    pub fn delete_task(&self, id: Uuid) -> Outcome<Task> {
        self.delete_owned(id, "delete_task")
    }

    // ----- Bug reports ----------------------------------------------------

    pub fn create_bug_report(&self, bug: BugReport) -> Outcome<BugReport> {
        self.create_owned(bug, "create_bug_report")
    }

    pub fn get_bug_report_by_id(&self, id: Uuid) -> Outcome<BugReport> {
        self.get_owned(id)
    }

    pub fn get_bug_reports_by_project_id(&self, project_id: &str) -> Outcome<Vec<BugReport>> {
        self.list_owned(project_id)
    }

    pub fn update_bug_report(&self, bug: BugReport) -> Outcome<BugReport> {
        self.update_owned(bug, "update_bug_report")
    }

    pub fn delete_bug_report(&self, id: Uuid) -> Outcome<BugReport> {
        self.delete_owned(id, "delete_bug_report")
    }

    // ----- Events ---------------------------------------------------------

    /// Store a new event; the end may not precede the start
    pub fn create_event(&self, event: Event) -> Outcome<Event> {
        self.create_owned(event, "create_event")
    }

    pub fn get_event_by_id(&self, id: Uuid) -> Outcome<Event> {
        self.get_owned(id)
    }

    pub fn get_events_by_project_id(&self, project_id: &str) -> Outcome<Vec<Event>> {
        self.list_owned(project_id)
    }

    /// Replace an event; the same date rule as on creation applies
    pub fn update_event(&self, event: Event) -> Outcome<Event> {
        self.update_owned(event, "update_event")
    }

    pub fn delete_event(&self, id: Uuid) -> Outcome<Event> {
        self.delete_owned(id, "delete_event")
    }

    // ----- Documentation --------------------------------------------------

    pub fn create_documentation(&self, doc: Documentation) -> Outcome<Documentation> {
        self.create_owned(doc, "create_documentation")
    }

    pub fn get_documentation_by_id(&self, id: Uuid) -> Outcome<Documentation> {
        self.get_owned(id)
    }

    pub fn get_documentation_by_project_id(&self, project_id: &str) -> Outcome<Vec<Documentation>> {
        self.list_owned(project_id)
    }

    pub fn update_documentation(&self, doc: Documentation) -> Outcome<Documentation> {
        self.update_owned(doc, "update_documentation")
    }

    pub fn delete_documentation(&self, id: Uuid) -> Outcome<Documentation> {
        self.delete_owned(id, "delete_documentation")
    }

    // ----- Binds ----------------------------------------------------------

    /// Link an employee to a project. Linking the same pair twice is a
    /// CONFLICT, not a no-op.
    pub fn bind_employee_to_project(
        &self,
        employee_id: Uuid,
        project_id: &str,
    ) -> Outcome<EmployeeProject> {
        let link = EmployeeProject::new(employee_id, project_id);
        let result = self.try_bind_employee(&link);
        self.audited(
            EmployeeProject::KIND,
            "bind_employee_to_project",
            ChangeType::Create,
            &link,
            bind_outcome(result),
        )
    }

    fn try_bind_employee(&self, link: &EmployeeProject) -> Result<EmployeeProject, StoreError> {
        self.checker()
            .check_membership_binding(link.employee_id, &link.project_id)?
            .into_result()?;
        self.backend.insert_link(link)?;
        Ok(link.clone())
    }

    /// Make a team member the project manager
    pub fn bind_project_manager(&self, project_id: &str, employee_id: Uuid) -> Outcome<Project> {
        let result = self.try_bind_manager(project_id, employee_id);
        self.audited(
            Project::KIND,
            "bind_project_manager",
            ChangeType::Update,
            &json!({ "projectId": project_id, "employeeId": employee_id }),
            bind_outcome(result),
        )
    }

    fn try_bind_manager(&self, project_id: &str, employee_id: Uuid) -> Result<Project, StoreError> {
        self.checker()
            .check_project_manager(project_id, employee_id)?
            .into_result()?;
        let mut project = self
            .backend
            .fetch_project(project_id)?
            .ok_or_else(|| StoreError::not_found(Project::KIND, project_id))?;
        project.manager_id = Some(employee_id);
        self.backend.replace_project(&project)?;
        Ok(project)
    }

    /// Reassign a task of `project_id` to a team member
    pub fn bind_task_executor(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        project_id: &str,
    ) -> Outcome<Task> {
        let result = self.try_bind_executor(task_id, employee_id, project_id);
        self.audited(
            Task::KIND,
            "bind_task_executor",
            ChangeType::Update,
            &json!({ "taskId": task_id, "employeeId": employee_id, "projectId": project_id }),
            bind_outcome(result),
        )
    }

    fn try_bind_executor(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        project_id: &str,
    ) -> Result<Task, StoreError> {
        self.checker()
            .check_task_executor(task_id, employee_id, project_id)?
            .into_result()?;
        let executor = self
            .backend
            .fetch_employee(employee_id)?
            .ok_or_else(|| StoreError::not_found(Employee::KIND, employee_id))?;
        let mut task = self
            .backend
            .fetch_task(task_id)?
            .ok_or_else(|| StoreError::not_found(Task::KIND, task_id))?;
        task.employee_id = executor.id;
        task.employee_full_name = executor.full_name;
        self.backend.replace_task(&task)?;
        Ok(task)
    }

    // ----- Analytics ------------------------------------------------------

    /// Percentage of completed tasks; 0.0 for a project without tasks
    pub fn calculate_project_readiness(&self, project_id: &str) -> Outcome<f64> {
        Outcome::from_result(
            self.project_tasks(project_id)
                .map(|tasks| analytics::readiness(&tasks)),
        )
    }

    pub fn get_task_statuses(&self, project_id: &str) -> Outcome<StatusSnapshot> {
        Outcome::from_result(
            self.project_tasks(project_id)
                .map(|tasks| analytics::task_status_snapshot(&tasks)),
        )
    }

    pub fn get_bug_statuses(&self, project_id: &str) -> Outcome<StatusSnapshot> {
        Outcome::from_result(
            self.project_bugs(project_id)
                .map(|bugs| analytics::bug_status_snapshot(&bugs)),
        )
    }

    pub fn calculate_labor_efficiency(&self, project_id: &str) -> Outcome<Vec<EmployeeEfficiency>> {
        self.calculate_labor_efficiency_at(project_id, Utc::now())
    }

    /// Labor efficiency of every team member, with overdue tasks measured
    /// against `now`
    pub fn calculate_labor_efficiency_at(
        &self,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Outcome<Vec<EmployeeEfficiency>> {
        Outcome::from_result(self.labor_efficiency(project_id, now))
    }

    /// Readiness and task statuses, plus labor efficiency and bug statuses
    /// when asked for
    pub fn get_project_characteristics(
        &self,
        project_id: &str,
        include_efficiency: bool,
        include_bugs: bool,
    ) -> Outcome<ProjectCharacteristics> {
        Outcome::from_result(self.characteristics(project_id, include_efficiency, include_bugs))
    }

    fn project_tasks(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        self.require_project(project_id)?;
        self.backend.fetch_tasks_by_project(project_id)
    }

    fn project_bugs(&self, project_id: &str) -> Result<Vec<BugReport>, StoreError> {
        self.require_project(project_id)?;
        self.backend.fetch_bug_reports_by_project(project_id)
    }

    fn labor_efficiency(
        &self,
        project_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EmployeeEfficiency>, StoreError> {
        self.require_project(project_id)?;
        let team = self.backend.fetch_team(project_id)?;
        let mut tasks = Vec::new();
        for member in &team {
            tasks.extend(
                self.backend
                    .fetch_tasks_by_employee(member.id)?
                    .into_iter()
                    .filter(|t| t.project_id == project_id),
            );
        }
        Ok(analytics::labor_efficiency_at(&team, &tasks, now))
    }

    fn characteristics(
        &self,
        project_id: &str,
        include_efficiency: bool,
        include_bugs: bool,
    ) -> Result<ProjectCharacteristics, StoreError> {
        let tasks = self.project_tasks(project_id)?;

        let mut report = ProjectCharacteristics::new(project_id);
        report.insert(
            analytics::READINESS,
            Report::Readiness(analytics::readiness(&tasks)),
        );
        report.insert(
            analytics::TASK_STATUSES,
            Report::Statuses(analytics::task_status_snapshot(&tasks)),
        );
        if include_efficiency {
            let scores = self.labor_efficiency(project_id, Utc::now())?;
            report.insert(analytics::LABOR_EFFICIENCY, Report::Efficiency(scores));
        }
        if include_bugs {
            let bugs = self.backend.fetch_bug_reports_by_project(project_id)?;
            report.insert(
                analytics::BUG_STATUSES,
                Report::Statuses(analytics::bug_status_snapshot(&bugs)),
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::MemoryAuditSink;
    use crate::core::entity::TaskStatus;
    use crate::core::outcome::ResultCode;
    use crate::storage::SqliteBackend;
    use chrono::{Duration, TimeZone};
    use std::rc::Rc;

    fn provider() -> (DataProvider, Rc<MemoryAuditSink>) {
        let sink = Rc::new(MemoryAuditSink::new());
        let backend = SqliteBackend::open_in_memory().unwrap();
        let provider = DataProvider::new(Box::new(backend), Box::new(Rc::clone(&sink)), "tester");
        (provider, sink)
    }

    /// A project with one linked employee
    fn staffed(p: &DataProvider) -> Employee {
        let employee = p
            .create_employee(Employee::new("Ann", "Lee", "Dev"))
            .into_data()
            .unwrap();
        p.create_project(Project::new("apollo", "Apollo", Utc::now() + Duration::days(30)));
        p.bind_employee_to_project(employee.id, "apollo");
        employee
    }

    #[test]
    fn test_create_task_for_unknown_parents_writes_nothing() {
        let (p, _) = provider();
        let task = Task::new("ghost", Uuid::new_v4(), "Nobody", "Orphan", Utc::now());

        let outcome = p.create_task(task.clone());
        assert_eq!(outcome.code, ResultCode::InvalidData);
        assert!(outcome.errors.contains_key("project"));
        assert!(outcome.errors.contains_key("employee"));

        assert_eq!(p.get_task_by_id(task.id).code, ResultCode::NotFound);
    }

    #[test]
    fn test_non_member_cannot_author() {
        let (p, _) = provider();
        staffed(&p);
        let outsider = p
            .create_employee(Employee::new("Bob", "Ray", "QA"))
            .into_data()
            .unwrap();

        let bug = BugReport::new("apollo", outsider.id, &outsider.full_name, "Crash");
        let outcome = p.create_bug_report(bug);
        assert_eq!(outcome.code, ResultCode::InvalidData);
        assert!(outcome.errors["employee"].contains("not a member"));
    }

    #[test]
    fn test_task_round_trip_and_completion_stamp() {
        let (p, _) = provider();
        let e = staffed(&p);
        let mut task = Task::new("apollo", e.id, &e.full_name, "Ship", Utc::now());
        task.status = TaskStatus::Completed;

        let created = p.create_task(task).into_data().unwrap();
        assert!(created.completed_at.is_some());
        assert_eq!(p.get_task_by_id(created.id).into_data(), Some(created.clone()));

        let mut reopened = created.clone();
        reopened.status = TaskStatus::InProgress;
        let updated = p.update_task(reopened).into_data().unwrap();
        assert!(updated.completed_at.is_none());
    }

    #[test]
    fn test_empty_collections_are_not_found() {
        let (p, _) = provider();
        staffed(&p);

        let outcome = p.get_tasks_by_project_id("apollo");
        assert_eq!(outcome.code, ResultCode::NotFound);
        assert_eq!(outcome.data, Some(vec![]));
    }

    #[test]
    fn test_tags_must_all_match() {
        let (p, _) = provider();
        let e = staffed(&p);
        let both = Task::new("apollo", e.id, &e.full_name, "Both", Utc::now()).with_tags(["x", "y"]);
        let one = Task::new("apollo", e.id, &e.full_name, "One", Utc::now()).with_tags(["x"]);
        p.create_task(both.clone());
        p.create_task(one);

        let tags = vec!["x".to_string(), "y".to_string()];
        let found = p.get_tasks_by_tags(&tags, "apollo").into_data().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, both.id);
    }

    #[test]
    fn test_duplicate_membership_conflicts() {
        let (p, _) = provider();
        let e = staffed(&p);

        let again = p.bind_employee_to_project(e.id, "apollo");
        assert_eq!(again.code, ResultCode::Conflict);
    }

    #[test]
    fn test_binds_report_missing_references_as_not_found() {
        let (p, _) = provider();
        let e = staffed(&p);

        assert_eq!(
            p.bind_employee_to_project(e.id, "ghost").code,
            ResultCode::NotFound
        );
        let outcome = p.bind_task_executor(Uuid::new_v4(), e.id, "apollo");
        assert_eq!(outcome.code, ResultCode::NotFound);
        assert!(outcome.errors.contains_key("task"));
    }

    #[test]
    fn test_manager_must_be_member() {
        let (p, _) = provider();
        let member = staffed(&p);
        let outsider = p
            .create_employee(Employee::new("Bob", "Ray", "QA"))
            .into_data()
            .unwrap();

        assert_eq!(
            p.bind_project_manager("apollo", outsider.id).code,
            ResultCode::InvalidData
        );
        let project = p.bind_project_manager("apollo", member.id).into_data().unwrap();
        assert_eq!(project.manager_id, Some(member.id));
    }

    #[test]
    fn test_executor_rebinding_updates_name() {
        let (p, _) = provider();
        let ann = staffed(&p);
        let bob = p
            .create_employee(Employee::new("Bob", "Ray", "QA"))
            .into_data()
            .unwrap();
        p.bind_employee_to_project(bob.id, "apollo");
        let task = p
            .create_task(Task::new("apollo", ann.id, &ann.full_name, "Ship", Utc::now()))
            .into_data()
            .unwrap();

        let moved = p.bind_task_executor(task.id, bob.id, "apollo").into_data().unwrap();
        assert_eq!(moved.employee_id, bob.id);
        assert_eq!(moved.employee_full_name, "Ray Bob");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (p, _) = provider();
        assert_eq!(p.delete_task(Uuid::new_v4()).code, ResultCode::NotFound);
        assert_eq!(p.delete_project("ghost").code, ResultCode::NotFound);
        assert_eq!(p.delete_employee(Uuid::new_v4()).code, ResultCode::NotFound);
    }

    #[test]
    fn test_every_mutation_is_audited() {
        let (p, sink) = provider();
        staffed(&p);
        p.delete_project("ghost");

        let records = sink.records();
        let methods: Vec<&str> = records.iter().map(|r| r.method_name.as_str()).collect();
        assert_eq!(
            methods,
            vec!["create_employee", "create_project", "bind_employee_to_project", "delete_project"]
        );
        assert_eq!(records[3].status, AuditStatus::Fault);
        assert!(records.iter().all(|r| r.actor == "tester"));
    }

    #[test]
    fn test_efficiency_example() {
        let (p, _) = provider();
        let e = staffed(&p);
        let deadline = Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap();

        let mut early = Task::new("apollo", e.id, &e.full_name, "Early", deadline);
        early.complete(Utc.with_ymd_and_hms(2023, 12, 20, 0, 0, 0).unwrap());
        let mut on_time = Task::new("apollo", e.id, &e.full_name, "On time", deadline);
        on_time.complete(deadline);
        p.create_task(early);
        p.create_task(on_time);

        let scores = p.calculate_labor_efficiency("apollo").into_data().unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 102.0);
    }

    #[test]
    fn test_characteristics_keys_follow_flags() {
        let (p, _) = provider();
        staffed(&p);

        let basic = p
            .get_project_characteristics("apollo", false, false)
            .into_data()
            .unwrap();
        assert_eq!(basic.readiness(), Some(0.0));
        assert!(basic.contains(analytics::TASK_STATUSES));
        assert!(!basic.contains(analytics::LABOR_EFFICIENCY));

        let full = p
            .get_project_characteristics("apollo", true, true)
            .into_data()
            .unwrap();
        assert!(full.contains(analytics::LABOR_EFFICIENCY));
        assert!(full.contains(analytics::BUG_STATUSES));

        assert_eq!(
            p.get_project_characteristics("ghost", true, true).code,
            ResultCode::NotFound
        );
    }
}
