use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crm")]
#[command(about = "Simple customer relationship manager for the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive menu (the default)
    Shell,

    /// List all customers
    #[command(alias = "ls")]
    List,

    /// Search customers by name, email or phone
    Search { keyword: String },

    /// Show a customer with their communications and tasks
    #[command(alias = "v")]
    Show { id: u32 },

    /// Print the overall report
    Report,
}
