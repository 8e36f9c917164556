mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::{QuoteArgs, ScheduleArgs, ValidateArgs};

/// Consumer loan quotes with decimal precision
#[derive(Parser)]
#[command(
    name = "lq",
    version,
    about = "Consumer loan quotes with decimal precision",
    long_about = "Quote an annuity loan (monthly payment, total repayable amount, APR), \
                  print its month-by-month repayment schedule, or check a request \
                  document against the quotation rules. Requests are JSON, read from \
                  --input or piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a loan request
    Quote(QuoteArgs),
    /// Month-by-month repayment schedule
    Schedule(ScheduleArgs),
    /// Validate a loan request without pricing it
    Validate(ValidateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::loan::run_quote(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Validate(args) => commands::loan::run_validate(args),
        Commands::Version => {
            println!("lq {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
