//! `ptrack task` command - Task management

use chrono::{DateTime, Utc};
use clap::{ArgGroup, Subcommand};
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    author_name, finish, format_date, open_provider, parse_datetime, print_done, print_field,
    print_rule, print_table, require, truncate_str,
};
use crate::cli::GlobalOpts;
use crate::core::entity::{Priority, TaskStatus};
use crate::entities::Task;

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    New(NewArgs),

    /// Show a task's details
    Show(IdArgs),

    /// List tasks of a project or of an employee
    List(ListArgs),

    /// Change a task's fields
    Update(UpdateArgs),

    /// Mark a task completed
    Complete(IdArgs),

    /// Move a completed task back to in-progress
    Reopen(IdArgs),

    /// Reassign a task to another team member
    Assign(AssignArgs),

    /// Delete a task
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Task name
    pub name: String,

    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,

    /// Executor (employee ID)
    #[arg(long, short = 'e')]
    pub employee: Uuid,

    /// Deadline (YYYY-MM-DD or RFC 3339)
    #[arg(long, short = 'd', value_parser = parse_datetime)]
    pub deadline: DateTime<Utc>,

    /// low, medium or high
    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    /// Tags (repeatable)
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Task ID
    pub id: Uuid,
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("scope").required(true).args(["project", "employee"])))]
pub struct ListArgs {
    /// Tasks of this project
    #[arg(long, short = 'P')]
    pub project: Option<String>,

    /// Tasks assigned to this employee, across projects
    #[arg(long, short = 'e')]
    pub employee: Option<Uuid>,

    /// Keep only tasks carrying every given tag (requires --project)
    #[arg(long = "tag", short = 't', requires = "project")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Task ID
    pub id: Uuid,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// in-progress or completed
    #[arg(long, short = 's')]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long, short = 'd', value_parser = parse_datetime)]
    pub deadline: Option<DateTime<Utc>>,

    /// Replace the tag set (repeatable)
    #[arg(long = "tag", short = 't')]
    pub tags: Option<Vec<String>>,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Task ID
    pub id: Uuid,

    /// New executor (employee ID)
    pub employee: Uuid,
}

pub fn run(cmd: TaskCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TaskCommands::New(args) => run_new(args, global),
        TaskCommands::Show(args) => run_show(args, global),
        TaskCommands::List(args) => run_list(args, global),
        TaskCommands::Update(args) => run_update(args, global),
        TaskCommands::Complete(args) => run_set_status(args, TaskStatus::Completed, global),
        TaskCommands::Reopen(args) => run_set_status(args, TaskStatus::InProgress, global),
        TaskCommands::Assign(args) => run_assign(args, global),
        TaskCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let executor = author_name(&provider, args.employee);
    let mut task = Task::new(args.project, args.employee, executor, args.name, args.deadline)
        .with_tags(args.tags);
    task.priority = args.priority;
    task.description = args.description;

    finish(provider.create_task(task), global.format, |t| {
        print_done("Created", "task", t.id);
        println!(
            "   {} | due {} | {}",
            style(&t.name).yellow(),
            format_date(&t.deadline),
            t.employee_full_name
        );
    })
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_task_by_id(args.id), global.format, |t| {
        print_rule();
        print_field("ID", style(t.id).cyan());
        print_field("Name", &t.name);
        print_field("Project", &t.project_id);
        print_field("Executor", &t.employee_full_name);
        print_field("Status", t.status);
        print_field("Priority", t.priority);
        print_field("Deadline", format_date(&t.deadline));
        if let Some(done) = t.completed_at {
            print_field("Completed", format_date(&done));
        }
        if !t.tags.is_empty() {
            let tags: Vec<&str> = t.tags.iter().map(String::as_str).collect();
            print_field("Tags", tags.join(", "));
        }
        if !t.description.is_empty() {
            print_field("Description", &t.description);
        }
        print_rule();
    })
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let outcome = match (&args.project, args.employee) {
        (Some(project), _) if !args.tags.is_empty() => provider.get_tasks_by_tags(&args.tags, project),
        (Some(project), _) => provider.get_tasks_by_project_id(project),
        (None, Some(employee)) => provider.get_tasks_by_employee_id(employee),
        (None, None) => return Err(miette::miette!("either --project or --employee is required")),
    };

    finish(outcome, global.format, |tasks| print_tasks(tasks))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let rows = tasks
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                truncate_str(&t.name, 32),
                t.project_id.clone(),
                truncate_str(&t.employee_full_name, 24),
                t.status.to_string(),
                t.priority.to_string(),
                format_date(&t.deadline),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "PROJECT", "EXECUTOR", "STATUS", "PRIORITY", "DEADLINE"],
        rows,
        "task",
    );
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut task = require(provider.get_task_by_id(args.id))?;

    if let Some(name) = args.name {
        task.name = name;
    }
    if let Some(description) = args.description {
        task.description = description;
    }
    if let Some(status) = args.status {
        task.status = status;
    }
    if let Some(priority) = args.priority {
        task.priority = priority;
    }
    if let Some(deadline) = args.deadline {
        task.deadline = deadline;
    }
    if let Some(tags) = args.tags {
        task.tags = tags.into_iter().collect();
    }

    finish(provider.update_task(task), global.format, |t| {
        print_done("Updated", "task", t.id);
    })
}

fn run_set_status(args: IdArgs, status: TaskStatus, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut task = require(provider.get_task_by_id(args.id))?;
    task.status = status;

    finish(provider.update_task(task), global.format, |t| {
        print_done("Marked", "task", t.id);
        println!("   status: {}", style(t.status).yellow());
    })
}

fn run_assign(args: AssignArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let task = require(provider.get_task_by_id(args.id))?;

    let outcome = provider.bind_task_executor(task.id, args.employee, &task.project_id);
    finish(outcome, global.format, |t| {
        println!(
            "{} Task {} assigned to {}",
            style("✓").green(),
            style(t.id).cyan(),
            style(&t.employee_full_name).yellow()
        );
    })
}

fn run_delete(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_task(args.id), global.format, |t| {
        print_done("Deleted", "task", t.id);
    })
}
