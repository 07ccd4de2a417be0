//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::auth::{LoginArgs, RegisterArgs};
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::dashboard::DashboardArgs;
use crate::cli::commands::material::MaterialCommands;
use crate::cli::commands::product::ProductCommands;
use crate::cli::commands::user::UserCommands;

/// DRX - manage products, bills of materials and lifecycle stages
#[derive(Parser, Debug)]
#[command(name = "drx")]
#[command(author, version)]
#[command(about = "Manage products, bills of materials and lifecycle stages from the terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Backend base URL (overrides config and DRX_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Log requests and internal events to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, detail view for single items
    #[default]
    Auto,
    /// Aligned table
    Table,
    /// JSON
    Json,
    /// Comma-separated values
    Csv,
    /// Identifiers only, one per line
    Id,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and save the session
    Login(LoginArgs),

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Forget the saved session
    Logout,

    /// Show the signed-in user and accessible views
    Whoami,

    /// Products, their BOMs and lifecycle stages
    #[command(subcommand)]
    Product(ProductCommands),

    /// Material catalog
    #[command(subcommand)]
    Material(MaterialCommands),

    /// User accounts and roles (administrators)
    #[command(subcommand)]
    User(UserCommands),

    /// Stage, material, transition and role statistics (administrators)
    Dashboard(DashboardArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
