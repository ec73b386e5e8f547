//! `ptrack bug` command - Bug report management

use clap::Subcommand;
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    author_name, finish, format_date, open_provider, print_done, print_field, print_rule,
    print_table, require, truncate_str,
};
use crate::cli::GlobalOpts;
use crate::core::entity::{BugStatus, Priority};
use crate::entities::BugReport;

#[derive(Subcommand, Debug)]
pub enum BugCommands {
    /// File a new bug report
    New(NewArgs),

    /// Show a bug report
    Show(IdArgs),

    /// List bug reports of a project
    List(ListArgs),

    /// Change a bug report's status or priority
    Update(UpdateArgs),

    /// Close a bug report
    Close(IdArgs),

    /// Delete a bug report
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short summary
    pub name: String,

    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,

    /// Reporter (employee ID)
    #[arg(long, short = 'e')]
    pub employee: Uuid,

    /// low, medium or high
    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Bug report ID
    pub id: Uuid,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,

    /// Only show bugs with this status
    #[arg(long, short = 's')]
    pub status: Option<BugStatus>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Bug report ID
    pub id: Uuid,

    /// opened, in-progress or closed
    #[arg(long, short = 's')]
    pub status: Option<BugStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(cmd: BugCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BugCommands::New(args) => run_new(args, global),
        BugCommands::Show(args) => run_show(args, global),
        BugCommands::List(args) => run_list(args, global),
        BugCommands::Update(args) => run_update(args, global),
        BugCommands::Close(args) => run_update(
            UpdateArgs {
                id: args.id,
                status: Some(BugStatus::Closed),
                priority: None,
                description: None,
            },
            global,
        ),
        BugCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let reporter = author_name(&provider, args.employee);
    let mut bug = BugReport::new(args.project, args.employee, reporter, args.name);
    bug.priority = args.priority;
    bug.description = args.description;

    finish(provider.create_bug_report(bug), global.format, |b| {
        print_done("Filed", "bug report", b.id);
        println!("   {} | {}", style(&b.name).yellow(), b.priority);
    })
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_bug_report_by_id(args.id), global.format, |b| {
        print_rule();
        print_field("ID", style(b.id).cyan());
        print_field("Name", &b.name);
        print_field("Project", &b.project_id);
        print_field("Reporter", &b.employee_full_name);
        print_field("Status", b.status);
        print_field("Priority", b.priority);
        print_field("Created", format_date(&b.created_at));
        if !b.description.is_empty() {
            print_field("Description", &b.description);
        }
        print_rule();
    })
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut outcome = provider.get_bug_reports_by_project_id(&args.project);
    if let (Some(status), Some(bugs)) = (args.status, outcome.data.as_mut()) {
        bugs.retain(|b| b.status == status);
    }

    finish(outcome, global.format, |bugs| {
        if bugs.is_empty() {
            println!("No bug reports found.");
            return;
        }
        let rows = bugs
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    truncate_str(&b.name, 40),
                    truncate_str(&b.employee_full_name, 24),
                    b.status.to_string(),
                    b.priority.to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "REPORTER", "STATUS", "PRIORITY"], rows, "bug report");
    })
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut bug = require(provider.get_bug_report_by_id(args.id))?;

    if let Some(status) = args.status {
        bug.status = status;
    }
    if let Some(priority) = args.priority {
        bug.priority = priority;
    }
    if let Some(description) = args.description {
        bug.description = description;
    }

    finish(provider.update_bug_report(bug), global.format, |b| {
        print_done("Updated", "bug report", b.id);
        println!("   status: {}", style(b.status).yellow());
    })
}

fn run_delete(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_bug_report(args.id), global.format, |b| {
        print_done("Deleted", "bug report", b.id);
    })
}
