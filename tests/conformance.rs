//! Cross-backend conformance
//!
//! Runs one scenario against the SQLite, XML and CSV backends and checks
//! that every step answers with the same result code.

use std::rc::Rc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use ptrack::core::audit::{AuditStatus, MemoryAuditSink};
use ptrack::core::entity::{BugStatus, Priority, TaskStatus};
use ptrack::core::{ChangeType, ResultCode};
use ptrack::entities::{BugReport, Documentation, Employee, Event, Project, Task};
use ptrack::storage::{CsvBackend, DataProvider, SqliteBackend, StorageBackend, XmlBackend};

fn provider(backend: Box<dyn StorageBackend>) -> (DataProvider, Rc<MemoryAuditSink>) {
    let audit = Rc::new(MemoryAuditSink::new());
    let provider = DataProvider::new(backend, Box::new(audit.clone()), "conformance");
    (provider, audit)
}

/// Every backend under test, each over its own temporary directory
fn backends() -> Vec<(&'static str, Box<dyn StorageBackend>, TempDir)> {
    let sqlite_dir = TempDir::new().unwrap();
    let xml_dir = TempDir::new().unwrap();
    let csv_dir = TempDir::new().unwrap();

    let sqlite: Box<dyn StorageBackend> =
        Box::new(SqliteBackend::open(&sqlite_dir.path().join("tracker.db")).unwrap());
    let xml: Box<dyn StorageBackend> = Box::new(XmlBackend::open(xml_dir.path()).unwrap());
    let csv: Box<dyn StorageBackend> = Box::new(CsvBackend::open(csv_dir.path()).unwrap());

    vec![
        ("sqlite", sqlite, sqlite_dir),
        ("xml", xml, xml_dir),
        ("csv", csv, csv_dir),
    ]
}

/// The scenario; returns (step, code) pairs in order
fn scenario(p: &DataProvider) -> Vec<(&'static str, ResultCode)> {
    let mut steps = Vec::new();
    let deadline = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

    let ann = Employee::new("Ann", "Lee", "Developer");
    let bob = Employee::new("Bob", "Ray", "Tester");
    let eve = Employee::new("Eve", "Moss", "Analyst");
    steps.push(("create ann", p.create_employee(ann.clone()).code));
    steps.push(("create bob", p.create_employee(bob.clone()).code));
    steps.push(("create eve", p.create_employee(eve.clone()).code));
    steps.push((
        "create blank employee",
        p.create_employee(Employee::new("", "Lee", "Dev")).code,
    ));

    let mut apollo = Project::new("apollo", "Apollo", deadline);
    apollo.team = [ann.id, bob.id].into_iter().collect();
    apollo.manager_id = Some(ann.id);
    steps.push(("create project", p.create_project(apollo.clone()).code));
    steps.push(("create duplicate project", p.create_project(apollo.clone()).code));

    let mut outsider_manager = Project::new("gemini", "Gemini", deadline);
    outsider_manager.manager_id = Some(eve.id);
    steps.push((
        "manager outside team",
        p.create_project(outsider_manager).code,
    ));

    steps.push(("bind eve", p.bind_employee_to_project(eve.id, "apollo").code));
    steps.push(("bind eve again", p.bind_employee_to_project(eve.id, "apollo").code));
    steps.push((
        "bind unknown employee",
        p.bind_employee_to_project(Uuid::new_v4(), "apollo").code,
    ));
    steps.push(("manager eve", p.bind_project_manager("apollo", eve.id).code));

    let mut early = Task::new("apollo", ann.id, &ann.full_name, "Schema", deadline)
        .with_tags(["db", "backend"]);
    early.complete(Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap());
    let late = Task::new("apollo", bob.id, &bob.full_name, "Tests", deadline).with_tags(["qa"]);
    steps.push(("create early task", p.create_task(early.clone()).code));
    steps.push(("create late task", p.create_task(late.clone()).code));
    steps.push((
        "task for stranger",
        p.create_task(Task::new("nowhere", Uuid::new_v4(), "Ghost", "Lost", deadline))
            .code,
    ));

    steps.push(("tasks by tag", p.get_tasks_by_tags(&["db".to_string()], "apollo").code));
    steps.push(("tasks by missing tag", p.get_tasks_by_tags(&["ui".to_string()], "apollo").code));
    steps.push(("tasks of eve", p.get_tasks_by_employee_id(eve.id).code));
    steps.push(("reassign task", p.bind_task_executor(late.id, eve.id, "apollo").code));
    steps.push((
        "reassign to wrong project",
        p.bind_task_executor(late.id, eve.id, "gemini").code,
    ));

    let bug = BugReport::new("apollo", bob.id, &bob.full_name, "Crash on save");
    steps.push(("create bug", p.create_bug_report(bug.clone()).code));
    let mut closed = bug.clone();
    closed.status = BugStatus::Closed;
    steps.push(("close bug", p.update_bug_report(closed).code));

    let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    let backwards = Event::new("apollo", ann.id, &ann.full_name, "Retro", start, deadline);
    steps.push(("event ending before start", p.create_event(backwards).code));
    let retro = Event::new("apollo", ann.id, &ann.full_name, "Retro", start, start);
    steps.push(("create event", p.create_event(retro).code));

    let doc = Documentation::new("apollo", ann.id, &ann.full_name, "Guide")
        .with_article("Intro", "Hello, <world> & \"friends\"")
        .with_article("Setup", "");
    steps.push(("create doc", p.create_documentation(doc.clone()).code));

    steps.push(("readiness", p.calculate_project_readiness("apollo").code));
    steps.push(("efficiency", p.calculate_labor_efficiency_at("apollo", now).code));
    steps.push(("readiness of unknown", p.calculate_project_readiness("nowhere").code));

    steps.push(("delete bob", p.delete_employee(bob.id).code));
    steps.push(("delete bob again", p.delete_employee(bob.id).code));
    steps.push(("bugs after bob left", p.get_bug_reports_by_project_id("apollo").code));
    steps.push(("delete project", p.delete_project("apollo").code));
    steps.push(("tasks after delete", p.get_tasks_by_project_id("apollo").code));

    steps
}

#[test]
fn test_all_backends_answer_alike() {
    use ResultCode::*;
    let expected = vec![
        ("create ann", Success),
        ("create bob", Success),
        ("create eve", Success),
        ("create blank employee", InvalidData),
        ("create project", Success),
        ("create duplicate project", Conflict),
        ("manager outside team", InvalidData),
        ("bind eve", Success),
        ("bind eve again", Conflict),
        ("bind unknown employee", NotFound),
        ("manager eve", Success),
        ("create early task", Success),
        ("create late task", Success),
        ("task for stranger", InvalidData),
        ("tasks by tag", Success),
        ("tasks by missing tag", NotFound),
        ("tasks of eve", NotFound),
        ("reassign task", Success),
        ("reassign to wrong project", NotFound),
        ("create bug", Success),
        ("close bug", Success),
        ("event ending before start", InvalidData),
        ("create event", Success),
        ("create doc", Success),
        ("readiness", Success),
        ("efficiency", Success),
        ("readiness of unknown", NotFound),
        ("delete bob", Success),
        ("delete bob again", NotFound),
        ("bugs after bob left", NotFound),
        ("delete project", Success),
        ("tasks after delete", NotFound),
    ];

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        assert_eq!(scenario(&p), expected, "backend {}", name);
    }
}

#[test]
fn test_all_backends_compute_same_analytics() {
    let deadline = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let ann = Employee::new("Ann", "Lee", "Developer");
        p.create_employee(ann.clone());
        let mut project = Project::new("apollo", "Apollo", deadline);
        project.team.insert(ann.id);
        p.create_project(project);

        let mut early = Task::new("apollo", ann.id, &ann.full_name, "Schema", deadline);
        early.complete(Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap());
        let overdue = Task::new("apollo", ann.id, &ann.full_name, "Tests", deadline);
        p.create_task(early);
        p.create_task(overdue);

        let readiness = p.calculate_project_readiness("apollo").data.unwrap();
        assert_eq!(readiness, 50.0, "backend {}", name);

        // early: 100 + 4, overdue by 10 days: 100 - 10
        let scores = p.calculate_labor_efficiency_at("apollo", now).data.unwrap();
        assert_eq!(scores.len(), 1, "backend {}", name);
        assert_eq!(scores[0].score, 97.0, "backend {}", name);

        let report = p.get_project_characteristics("apollo", true, false).data.unwrap();
        assert_eq!(report.readiness(), Some(50.0));
        assert!(report.efficiency().is_some());
        assert!(report.statuses("bug_statuses").is_none());
    }
}

#[test]
fn test_all_backends_round_trip_entities() {
    let deadline = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let mut ann = Employee::new("Ann", "Lee", "Developer");
        ann.patronymic = Some("Maria".to_string());
        ann.refresh_full_name();
        ann.email = "ann@example.com".to_string();
        ann.birthday = chrono::NaiveDate::from_ymd_opt(1990, 5, 17);
        p.create_employee(ann.clone());

        let mut project = Project::new("apollo", "Apollo, \"the\" <first>", deadline);
        project.team.insert(ann.id);
        p.create_project(project);

        let mut task = Task::new("apollo", ann.id, &ann.full_name, "Schema", deadline)
            .with_tags(["db", "backend, core"]);
        task.status = TaskStatus::Completed;
        let stored = p.create_task(task).data.unwrap();
        assert!(stored.completed_at.is_some(), "backend {}", name);

        let loaded = p.get_task_by_id(stored.id).data.unwrap();
        assert_eq!(loaded.tags, stored.tags, "backend {}", name);
        assert_eq!(loaded.completed_at, stored.completed_at, "backend {}", name);
        assert_eq!(loaded.deadline, deadline, "backend {}", name);

        let employee = p.get_employee_by_id(ann.id).data.unwrap();
        assert_eq!(employee, ann, "backend {}", name);

        let project = p.get_project_by_id("apollo").data.unwrap();
        assert_eq!(project.name, "Apollo, \"the\" <first>", "backend {}", name);
        assert!(project.has_member(ann.id), "backend {}", name);
    }
}

/// An employee on a fresh "apollo" project, ready to own entities
fn staffed_project(p: &DataProvider) -> Employee {
    let ann = Employee::new("Ann", "Lee", "Developer");
    p.create_employee(ann.clone());
    let mut project = Project::new("apollo", "Apollo", Utc::now());
    project.team.insert(ann.id);
    p.create_project(project);
    ann
}

#[test]
fn test_all_backends_round_trip_project_entities() {
    let start = Utc.with_ymd_and_hms(2024, 4, 2, 9, 15, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 4, 3, 18, 0, 0).unwrap();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let ann = staffed_project(&p);

        let mut bug = BugReport::new("apollo", ann.id, &ann.full_name, "Crash, \"on\" <save>");
        bug.description = "steps:\n1. open\n2. save".to_string();
        bug.status = BugStatus::InProgress;
        bug.priority = Priority::High;
        let bug = p.create_bug_report(bug).data.unwrap();
        assert_eq!(p.get_bug_report_by_id(bug.id).data, Some(bug), "backend {}", name);

        let mut event = Event::new("apollo", ann.id, &ann.full_name, "Demo & review", start, end);
        event.description = "room 4\nbring laptops".to_string();
        let event = p.create_event(event).data.unwrap();
        assert_eq!(p.get_event_by_id(event.id).data, Some(event), "backend {}", name);

        let doc = Documentation::new("apollo", ann.id, &ann.full_name, "Guide")
            .with_article("a,\"b\"<x>", "first line\nsecond, \"quoted\" line")
            .with_article("Setup", "cargo install");
        let doc = p.create_documentation(doc).data.unwrap();
        assert_eq!(p.get_documentation_by_id(doc.id).data, Some(doc), "backend {}", name);
    }
}

#[test]
fn test_all_backends_reject_orphans() {
    let now = Utc::now();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let ann = staffed_project(&p);
        let stranger = Uuid::new_v4();

        for project_id in ["apollo", "nowhere"] {
            let employee_id = if project_id == "apollo" { stranger } else { ann.id };

            let task = Task::new(project_id, employee_id, "Lee Ann", "Schema", now);
            let outcome = p.create_task(task.clone());
            assert_eq!(outcome.code, ResultCode::InvalidData, "backend {} task", name);
            assert_eq!(p.get_task_by_id(task.id).code, ResultCode::NotFound);

            let bug = BugReport::new(project_id, employee_id, "Lee Ann", "Crash");
            let outcome = p.create_bug_report(bug.clone());
            assert_eq!(outcome.code, ResultCode::InvalidData, "backend {} bug", name);
            assert_eq!(p.get_bug_report_by_id(bug.id).code, ResultCode::NotFound);

            let event = Event::new(project_id, employee_id, "Lee Ann", "Demo", now, now);
            let outcome = p.create_event(event.clone());
            assert_eq!(outcome.code, ResultCode::InvalidData, "backend {} event", name);
            assert_eq!(p.get_event_by_id(event.id).code, ResultCode::NotFound);

            let doc = Documentation::new(project_id, employee_id, "Lee Ann", "Guide");
            let outcome = p.create_documentation(doc.clone());
            assert_eq!(outcome.code, ResultCode::InvalidData, "backend {} doc", name);
            assert_eq!(p.get_documentation_by_id(doc.id).code, ResultCode::NotFound);
        }
    }
}

#[test]
fn test_all_backends_keep_created_at_on_update() {
    let long_ago = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();
    let now = Utc::now();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let ann = staffed_project(&p);

        let task = p
            .create_task(Task::new("apollo", ann.id, &ann.full_name, "Schema", now))
            .data
            .unwrap();
        let mut edited = task.clone();
        edited.name = "Schema v2".to_string();
        edited.created_at = long_ago;
        let updated = p.update_task(edited).data.unwrap();
        assert_eq!(updated.created_at, task.created_at, "backend {}", name);
        let stored = p.get_task_by_id(task.id).data.unwrap();
        assert_eq!(stored.name, "Schema v2", "backend {}", name);
        assert_eq!(stored.created_at, task.created_at, "backend {}", name);

        let bug = p
            .create_bug_report(BugReport::new("apollo", ann.id, &ann.full_name, "Crash"))
            .data
            .unwrap();
        let mut edited = bug.clone();
        edited.created_at = long_ago;
        p.update_bug_report(edited);
        let stored = p.get_bug_report_by_id(bug.id).data.unwrap();
        assert_eq!(stored.created_at, bug.created_at, "backend {}", name);

        let event = p
            .create_event(Event::new("apollo", ann.id, &ann.full_name, "Demo", now, now))
            .data
            .unwrap();
        let mut edited = event.clone();
        edited.created_at = long_ago;
        p.update_event(edited);
        let stored = p.get_event_by_id(event.id).data.unwrap();
        assert_eq!(stored.created_at, event.created_at, "backend {}", name);

        let doc = p
            .create_documentation(Documentation::new("apollo", ann.id, &ann.full_name, "Guide"))
            .data
            .unwrap();
        let mut edited = doc.clone();
        edited.created_at = long_ago;
        p.update_documentation(edited);
        let stored = p.get_documentation_by_id(doc.id).data.unwrap();
        assert_eq!(stored.created_at, doc.created_at, "backend {}", name);
    }
}

#[test]
fn test_all_backends_reject_event_ending_before_start_on_update() {
    let start = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 5, 11, 9, 0, 0).unwrap();

    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let ann = staffed_project(&p);

        let event = p
            .create_event(Event::new("apollo", ann.id, &ann.full_name, "Demo", start, end))
            .data
            .unwrap();
        let mut edited = event.clone();
        edited.end_date = start - chrono::Duration::days(5);

        let outcome = p.update_event(edited);
        assert_eq!(outcome.code, ResultCode::InvalidData, "backend {}", name);
        assert!(outcome.errors.contains_key("endDate"), "backend {}", name);
        assert_eq!(p.get_event_by_id(event.id).data, Some(event), "backend {}", name);
    }
}

#[test]
fn test_all_backends_store_blank_patronymic_as_none() {
    for (name, backend, _dir) in backends() {
        let (p, _) = provider(backend);
        let mut ann = Employee::new("Ann", "Lee", "Developer");
        ann.patronymic = Some(String::new());

        let created = p.create_employee(ann.clone()).data.unwrap();
        assert_eq!(created.patronymic, None, "backend {}", name);
        assert_eq!(p.get_employee_by_id(ann.id).data, Some(created), "backend {}", name);
    }
}

#[test]
fn test_every_mutation_is_audited_once() {
    for (name, backend, _dir) in backends() {
        let (p, audit) = provider(backend);
        let ann = Employee::new("Ann", "Lee", "Developer");
        p.create_employee(ann.clone());
        p.create_project(Project::new("apollo", "Apollo", Utc::now()));
        p.bind_employee_to_project(ann.id, "apollo");
        p.bind_employee_to_project(ann.id, "apollo");
        p.get_project_by_id("apollo");
        p.delete_project("apollo");

        let records = audit.records();
        assert_eq!(records.len(), 5, "backend {}", name);
        assert_eq!(records[3].status, AuditStatus::Fault, "backend {}", name);
        assert_eq!(records[4].change_type, ChangeType::Delete, "backend {}", name);
        assert!(records.iter().all(|r| r.actor == "conformance"));
    }
}
