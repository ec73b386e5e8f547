//! `ptrack employee` command - Employee management

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;
use uuid::Uuid;

use crate::cli::helpers::{
    finish, open_provider, parse_date, print_done, print_field, print_rule, print_table, require,
};
use crate::cli::GlobalOpts;
use crate::entities::Employee;

#[derive(Subcommand, Debug)]
pub enum EmployeeCommands {
    /// Register a new employee
    New(NewArgs),

    /// Show an employee
    Show(IdArgs),

    /// List the team of a project
    List(ListArgs),

    /// Change an employee's contact details or position
    Update(UpdateArgs),

    /// Delete an employee together with everything they authored
    Delete(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub patronymic: Option<String>,

    #[arg(long, short = 'p')]
    pub position: String,

    #[arg(long, short = 'e', default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Birthday (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub birthday: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Employee ID
    pub id: Uuid,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Project slug
    #[arg(long, short = 'P')]
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Employee ID
    pub id: Uuid,

    #[arg(long)]
    pub position: Option<String>,

    #[arg(long, short = 'e')]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,
}

pub fn run(cmd: EmployeeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EmployeeCommands::New(args) => run_new(args, global),
        EmployeeCommands::Show(args) => run_show(args, global),
        EmployeeCommands::List(args) => run_list(args, global),
        EmployeeCommands::Update(args) => run_update(args, global),
        EmployeeCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;

    let mut employee = Employee::new(args.first_name, args.last_name, args.position);
    employee.patronymic = args.patronymic;
    employee.email = args.email;
    employee.phone_number = args.phone;
    employee.birthday = args.birthday;

    finish(provider.create_employee(employee), global.format, |e| {
        print_done("Registered", "employee", e.id);
        println!("   {}", style(&e.full_name).yellow());
    })
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.get_employee_by_id(args.id), global.format, |e| {
        print_rule();
        print_field("ID", style(e.id).cyan());
        print_field("Name", &e.full_name);
        print_field("Position", &e.position);
        if let Some(birthday) = e.birthday {
            print_field("Birthday", birthday);
        }
        if !e.email.is_empty() {
            print_field("Email", &e.email);
        }
        if !e.phone_number.is_empty() {
            print_field("Phone", &e.phone_number);
        }
        print_rule();
    })
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let outcome = provider.get_employees_by_project_id(&args.project);
    finish(outcome, global.format, |team| {
        if team.is_empty() {
            println!("No team members found.");
            return;
        }
        let rows = team
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.full_name.clone(),
                    e.position.clone(),
                    e.email.clone(),
                ]
            })
            .collect();
        print_table(&["ID", "NAME", "POSITION", "EMAIL"], rows, "employee");
    })
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    let mut employee = require(provider.get_employee_by_id(args.id))?;

    if let Some(position) = args.position {
        employee.position = position;
    }
    if let Some(email) = args.email {
        employee.email = email;
    }
    if let Some(phone) = args.phone {
        employee.phone_number = phone;
    }

    finish(provider.update_employee(employee), global.format, |e| {
        print_done("Updated", "employee", e.id);
    })
}

fn run_delete(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let provider = open_provider(global)?;
    finish(provider.delete_employee(args.id), global.format, |e| {
        print_done("Deleted", "employee", e.id);
    })
}
