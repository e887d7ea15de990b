pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cutquote",
    about = "Cutquote operator CLI",
    long_about = "Operate the cutquote database: migrations, demo data, order inspection and \
                  effective configuration.",
    after_help = "Examples:\n  cutquote migrate\n  cutquote seed\n  cutquote orders --customer C-001"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo customers, catalog and materials idempotently")]
    Seed,
    #[command(about = "List persisted orders, optionally for one customer")]
    Orders {
        #[arg(long, help = "Only list orders of this customer id")]
        customer: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Orders { customer } => commands::orders::run(customer.as_deref()),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
