//! `ptrack report` command - Project analytics

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{finish, open_provider, parse_datetime, print_table, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::analytics::{
    EmployeeEfficiency, ProjectCharacteristics, StatusSnapshot, BUG_STATUSES, TASK_STATUSES,
};

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Percentage of completed tasks
    Readiness(ProjectArg),

    /// Status of every task (or bug report) of a project
    Statuses(StatusesArgs),

    /// Labor efficiency of every team member
    Efficiency(EfficiencyArgs),

    /// Combined project report
    Characteristics(CharacteristicsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProjectArg {
    /// Project slug
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusesArgs {
    /// Project slug
    pub project: String,

    /// Report bug statuses instead of task statuses
    #[arg(long)]
    pub bugs: bool,
}

#[derive(clap::Args, Debug)]
pub struct EfficiencyArgs {
    /// Project slug
    pub project: String,

    /// Evaluate overdue tasks as of this date (default: now)
    #[arg(long, value_parser = parse_datetime)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(clap::Args, Debug)]
pub struct CharacteristicsArgs {
    /// Project slug
    pub project: String,

    /// Include labor efficiency
    #[arg(long)]
    pub efficiency: bool,

    /// Include bug statuses
    #[arg(long)]
    pub bugs: bool,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Readiness(args) => run_readiness(args, global),
        ReportCommands::Statuses(args) => run_statuses(args, global),
        ReportCommands::Efficiency(args) => run_efficiency(args, global),
        ReportCommands::Characteristics(args) => run_characteristics(args, global),
    }
}

fn run_readiness(args: ProjectArg, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.calculate_project_readiness(&args.project), global.format, |r| {
        print_readiness(&args.project, *r);
    })
}

fn run_statuses(args: StatusesArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let (outcome, noun) = if args.bugs {
        (provider.get_bug_statuses(&args.project), "bug report")
    } else {
        (provider.get_task_statuses(&args.project), "task")
    };
    finish(outcome, global.format, |snapshot| print_statuses(snapshot, noun))
}

fn run_efficiency(args: EfficiencyArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = match args.at {
        Some(now) => provider.calculate_labor_efficiency_at(&args.project, now),
        None => provider.calculate_labor_efficiency(&args.project),
    };
    finish(outcome, global.format, |scores| print_efficiency(scores))
}

fn run_characteristics(args: CharacteristicsArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.get_project_characteristics(&args.project, args.efficiency, args.bugs);
    finish(outcome, global.format, print_characteristics)
}

fn print_characteristics(report: &ProjectCharacteristics) {
    println!("{}", style(format!("Project {}", report.project_id)).bold());
    println!();
    if let Some(readiness) = report.readiness() {
        print_readiness(&report.project_id, readiness);
        println!();
    }
    if let Some(tasks) = report.statuses(TASK_STATUSES) {
        println!("{}", style("Tasks").bold());
        print_statuses(tasks, "task");
        println!();
    }
    if let Some(scores) = report.efficiency() {
        println!("{}", style("Labor efficiency").bold());
        print_efficiency(scores);
        println!();
    }
    if let Some(bugs) = report.statuses(BUG_STATUSES) {
        println!("{}", style("Bug reports").bold());
        print_statuses(bugs, "bug report");
    }
}

fn print_readiness(project: &str, readiness: f64) {
    let shown = format!("{:.1}%", readiness);
    let shown = if readiness >= 100.0 {
        style(shown).green()
    } else if readiness >= 50.0 {
        style(shown).yellow()
    } else {
        style(shown).red()
    };
    println!("Readiness of {}: {}", style(project).cyan(), shown);
}

fn print_statuses(snapshot: &StatusSnapshot, noun: &str) {
    if snapshot.is_empty() {
        println!("No {}s found.", noun);
        return;
    }
    let rows = snapshot
        .iter()
        .map(|(id, entry)| vec![id.to_string(), truncate_str(&entry.name, 40), entry.status.clone()])
        .collect();
    print_table(&["ID", "NAME", "STATUS"], rows, noun);
}

fn print_efficiency(scores: &[EmployeeEfficiency]) {
    if scores.is_empty() {
        println!("No team members found.");
        return;
    }
    let rows = scores
        .iter()
        .map(|s| {
            vec![
                s.employee_id.to_string(),
                truncate_str(&s.full_name, 32),
                s.task_count.to_string(),
                format!("{:.1}", s.score),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "TASKS", "SCORE"], rows, "member");
}
