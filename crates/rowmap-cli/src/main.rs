//! rowmap CLI
//!
//! Demo application for rowmap: prints the bootstrap DDL of the example
//! entities and runs the department/person walkthrough against a store.

use clap::{Parser, Subcommand};
use rowmap::logging_facility::{init, Profile};

mod commands;
mod model;

#[derive(Debug, Parser)]
#[command(name = "rowmap")]
#[command(about = "rowmap - lightweight entity mapping over SQLite", long_about = None)]
struct Cli {
    /// Emit human-readable debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the DDL generated for the demo entities
    Schema(commands::schema::SchemaArgs),
    /// Save and list demo entities in a store file
    Demo(commands::demo::DemoArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Schema(args) => commands::schema::execute(args),
        Commands::Demo(args) => commands::demo::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
