use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::api::employee::ListParams;
use crate::client::EmployeeClient;
use crate::config::Config;
use crate::model::counter::{DEFAULT_COUNTER_BASE, EMPLOYEE_COUNTER};
use crate::model::employee::{EmployeeInput, FormNumber};
use crate::store;

#[derive(Parser, Debug)]
#[command(name = "employee-directory", version, about = "Employee directory REST service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server.
    Serve,
    /// Inspect or rewind the sequence counters.
    #[command(subcommand)]
    Counter(CounterCommand),
    /// Call a running server.
    Client(ClientArgs),
}

#[derive(Subcommand, Debug)]
pub enum CounterCommand {
    /// Print every counter.
    Show,
    /// Set a counter; the next employee gets `value + 1`.
    Reset {
        #[arg(long, default_value_t = DEFAULT_COUNTER_BASE)]
        value: u64,
        #[arg(long, default_value = EMPLOYEE_COUNTER)]
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Collection root of the employee API
    #[arg(
        long,
        env = "EMPLOYEE_API_URL",
        default_value = "http://localhost:5000/api/employees"
    )]
    pub base_url: String,

    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand, Debug)]
pub enum ClientAction {
    /// List a page of employees.
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        designation: Option<String>,
        #[arg(long, help = "createdAt, name, salary, ...")]
        sort: Option<String>,
        #[arg(long, help = "asc or desc")]
        order: Option<String>,
    },
    /// Show one employee by id or handle.
    Get { id: String },
    /// Add an employee.
    Create(EmployeeArgs),
    /// Edit an employee; only the given fields change.
    Update {
        id: String,
        #[command(flatten)]
        fields: EmployeeArgs,
    },
    /// Delete an employee permanently.
    Delete { id: String },
}

#[derive(Args, Debug, Default)]
pub struct EmployeeArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub designation: Option<String>,
    #[arg(long)]
    pub salary: Option<f64>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub joining_date: Option<String>,
    #[arg(long, help = "Active or Inactive")]
    pub status: Option<String>,
}

impl From<EmployeeArgs> for EmployeeInput {
    fn from(args: EmployeeArgs) -> Self {
        EmployeeInput {
            name: args.name,
            email: args.email,
            department: args.department,
            designation: args.designation,
            salary: args.salary.map(FormNumber::Number),
            joining_date: args.joining_date,
            status: args.status,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_counter(command: CounterCommand, config: &Config) -> Result<()> {
    let store = store::connect(config).await?;

    match command {
        CounterCommand::Show => print_json(&store.counters().await?),
        CounterCommand::Reset { value, name } => {
            let counter = store.reset_counter(&name, value).await?;
            info!(name = %counter.name, seq = counter.seq, "Counter reset");
            print_json(&counter)
        }
    }
}

pub async fn run_client(args: ClientArgs) -> Result<()> {
    let client = EmployeeClient::new(&args.base_url)?;

    match args.action {
        ClientAction::List {
            page,
            limit,
            search,
            department,
            designation,
            sort,
            order,
        } => {
            let params = ListParams {
                page,
                limit,
                search,
                department,
                designation,
                sort,
                order,
            };
            print_json(&client.list(&params).await?)
        }
        ClientAction::Get { id } => print_json(&client.get(&id).await?),
        ClientAction::Create(fields) => print_json(&client.create(&fields.into()).await?),
        ClientAction::Update { id, fields } => {
            print_json(&client.update(&id, &fields.into()).await?)
        }
        ClientAction::Delete { id } => print_json(&client.delete(&id).await?),
    }
}
