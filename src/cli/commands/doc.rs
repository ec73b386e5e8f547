//! `ptrack doc` command - Project documentation

use clap::Subcommand;
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    author_name, finish, format_date, open_provider, parse_article, print_done, print_field,
    print_rule, print_table, truncate_str,
};
use crate::cli::GlobalOpts;
use crate::entities::Documentation;

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Write a new document
    New(NewArgs),

    /// Show a document with all its articles
    Show(IdArgs),

    /// List documents of a project
    List(ListArgs),

    /// Delete a document
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Document name
    pub name: String,

    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,

    /// Author (employee ID)
    #[arg(long, short = 'e')]
    pub employee: Uuid,

    /// Article as TITLE=TEXT (repeatable)
    #[arg(long = "article", short = 'a', value_parser = parse_article)]
    pub articles: Vec<(String, String)>,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Document ID
    pub id: Uuid,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,
}

pub fn run(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DocCommands::New(args) => run_new(args, global),
        DocCommands::Show(args) => run_show(args, global),
        DocCommands::List(args) => run_list(args, global),
        DocCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let author = author_name(&provider, args.employee);
    let mut doc = Documentation::new(args.project, args.employee, author, args.name);
    doc.description = args.description;
    for (title, text) in args.articles {
        doc = doc.with_article(title, text);
    }

    finish(provider.create_documentation(doc), global.format, |d| {
        print_done("Created", "document", d.id);
        println!("   {} | {} article(s)", style(&d.name).yellow(), d.body.len());
    })
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_documentation_by_id(args.id), global.format, |d| {
        print_rule();
        print_field("ID", style(d.id).cyan());
        print_field("Name", &d.name);
        print_field("Project", &d.project_id);
        print_field("Author", &d.employee_full_name);
        print_field("Created", format_date(&d.created_at));
        if !d.description.is_empty() {
            print_field("Description", &d.description);
        }
        print_rule();
        for (title, text) in &d.body {
            println!("{}", style(title).bold().underlined());
            println!("{}", text);
            println!();
        }
    })
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.get_documentation_by_project_id(&args.project);
    finish(outcome, global.format, |docs| {
        if docs.is_empty() {
            println!("No documentation found.");
            return;
        }
        let rows = docs
            .iter()
            .map(|d| {
                vec![
                    d.id.to_string(),
                    truncate_str(&d.name, 40),
                    truncate_str(&d.employee_full_name, 24),
                    d.body.len().to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "AUTHOR", "ARTICLES"], rows, "document");
    })
}

fn run_delete(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_documentation(args.id), global.format, |d| {
        print_done("Deleted", "document", d.id);
    })
}
