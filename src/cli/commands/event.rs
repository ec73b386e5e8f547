//! `ptrack event` command - Project event management

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    author_name, finish, format_date, open_provider, parse_datetime, print_done, print_field,
    print_rule, print_table, truncate_str,
};
use crate::cli::GlobalOpts;
use crate::entities::Event;

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// Schedule a new event
    New(NewArgs),

    /// Show an event
    Show(IdArgs),

    /// List events of a project
    List(ListArgs),

    /// Delete an event
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Event name
    pub name: String,

    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,

    /// Organizer (employee ID)
    #[arg(long, short = 'e')]
    pub employee: Uuid,

    /// Start (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_parser = parse_datetime)]
    pub start: DateTime<Utc>,

    /// End, not before the start (default: same as start)
    #[arg(long, value_parser = parse_datetime)]
    pub end: Option<DateTime<Utc>>,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Event ID
    pub id: Uuid,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,
}

pub fn run(cmd: EventCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EventCommands::New(args) => run_new(args, global),
        EventCommands::Show(args) => run_show(args, global),
        EventCommands::List(args) => run_list(args, global),
        EventCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let organizer = author_name(&provider, args.employee);
    let end = args.end.unwrap_or(args.start);
    let mut event = Event::new(args.project, args.employee, organizer, args.name, args.start, end);
    event.description = args.description;

    finish(provider.create_event(event), global.format, |e| {
        print_done("Scheduled", "event", e.id);
        println!(
            "   {} | {} - {}",
            style(&e.name).yellow(),
            format_date(&e.start_date),
            format_date(&e.end_date)
        );
    })
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_event_by_id(args.id), global.format, |e| {
        print_rule();
        print_field("ID", style(e.id).cyan());
        print_field("Name", &e.name);
        print_field("Project", &e.project_id);
        print_field("Organizer", &e.employee_full_name);
        print_field("Start", e.start_date.to_rfc3339());
        print_field("End", e.end_date.to_rfc3339());
        if !e.description.is_empty() {
            print_field("Description", &e.description);
        }
        print_rule();
    })
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_events_by_project_id(&args.project), global.format, |events| {
        if events.is_empty() {
            println!("No events found.");
            return;
        }
        let mut sorted: Vec<&Event> = events.iter().collect();
        sorted.sort_by_key(|e| e.start_date);
        let rows = sorted
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    truncate_str(&e.name, 40),
                    format_date(&e.start_date),
                    format_date(&e.end_date),
                    truncate_str(&e.employee_full_name, 24),
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "START", "END", "ORGANIZER"], rows, "event");
    })
}

fn run_delete(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_event(args.id), global.format, |e| {
        print_done("Deleted", "event", e.id);
    })
}
