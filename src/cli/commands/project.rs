//! `ptrack project` command - Project management and team binding

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    finish, format_date, open_provider, parse_datetime, print_done, print_field, print_rule,
    print_table, require,
};
use crate::cli::GlobalOpts;
use crate::core::entity::ProjectStatus;
use crate::entities::Project;

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    New(NewArgs),

    /// Show a project with its team
    Show(ShowArgs),

    /// Change a project's name, description, status or deadline
    Update(UpdateArgs),

    /// Delete a project together with its tasks, bugs, events and docs
    Delete(ShowArgs),

    /// Add an employee to the project team
    Assign(BindArgs),

    /// Make a team member the project manager
    Manager(BindArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project slug (e.g. "apollo")
    pub id: String,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Deadline (YYYY-MM-DD or RFC 3339)
    #[arg(long, short = 'd', value_parser = parse_datetime)]
    pub deadline: DateTime<Utc>,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Initial team members (repeatable)
    #[arg(long = "member", short = 'm')]
    pub members: Vec<Uuid>,

    /// Initial manager, must be one of the members
    #[arg(long)]
    pub manager: Option<Uuid>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Project slug
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Project slug
    pub id: String,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// in-progress, completed or frozen
    #[arg(long, short = 's')]
    pub status: Option<ProjectStatus>,

    #[arg(long, short = 'd', value_parser = parse_datetime)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(clap::Args, Debug)]
pub struct BindArgs {
    /// Project slug
    pub project: String,

    /// Employee ID
    pub employee: Uuid,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::New(args) => run_new(args, global),
        ProjectCommands::Show(args) => run_show(args, global),
        ProjectCommands::Update(args) => run_update(args, global),
        ProjectCommands::Delete(args) => run_delete(args, global),
        ProjectCommands::Assign(args) => run_assign(args, global),
        ProjectCommands::Manager(args) => run_manager(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let mut project = Project::new(args.id, args.name, args.deadline);
    project.description = args.description;
    project.team = args.members.into_iter().collect();
    project.manager_id = args.manager;

    finish(provider.create_project(project), global.format, |p| {
        print_done("Created", "project", &p.id);
        if !p.team.is_empty() {
            println!("   Team: {} member(s)", p.team.len());
        }
    })
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.get_project_by_id(&args.id);
    // Team names only matter for the human view
    let team = if outcome.is_success() {
        provider.get_employees_by_project_id(&args.id).into_data()
    } else {
        None
    };

    finish(outcome, global.format, |p| {
        print_rule();
        print_field("ID", style(&p.id).cyan());
        print_field("Name", &p.name);
        print_field("Status", p.status);
        print_field("Deadline", format_date(&p.deadline));
        print_field("Created", format_date(&p.created_at));
        if !p.description.is_empty() {
            print_field("Description", &p.description);
        }
        print_rule();

        match team {
            Some(members) if !members.is_empty() => {
                let rows = members
                    .iter()
                    .map(|e| {
                        let role = if p.manager_id == Some(e.id) {
                            "manager".to_string()
                        } else {
                            String::new()
                        };
                        vec![e.id.to_string(), e.full_name.clone(), e.position.clone(), role]
                    })
                    .collect();
                print_table(&["ID", "NAME", "POSITION", "ROLE"], rows, "member");
            }
            _ => println!("{}", style("No team members").dim()),
        }
    })
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut project = require(provider.get_project_by_id(&args.id))?;

    if let Some(name) = args.name {
        project.name = name;
    }
    if let Some(description) = args.description {
        project.description = description;
    }
    if let Some(status) = args.status {
        project.status = status;
    }
    if let Some(deadline) = args.deadline {
        project.deadline = deadline;
    }

    finish(provider.update_project(project), global.format, |p| {
        print_done("Updated", "project", &p.id);
    })
}

fn run_delete(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_project(&args.id), global.format, |p| {
        print_done("Deleted", "project", &p.id);
    })
}

fn run_assign(args: BindArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.bind_employee_to_project(args.employee, &args.project);
    finish(outcome, global.format, |link| {
        println!(
            "{} Added {} to project {}",
            style("✓").green(),
            style(link.employee_id).cyan(),
            style(&link.project_id).cyan()
        );
    })
}

fn run_manager(args: BindArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.bind_project_manager(&args.project, args.employee);
    finish(outcome, global.format, |p| {
        println!(
            "{} {} now manages project {}",
            style("✓").green(),
            style(args.employee).cyan(),
            style(&p.id).cyan()
        );
    })
}
