use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drx::cli::commands::{auth, completions, dashboard, material, product, user};
use drx::cli::{Cli, Commands};

/// Log filter used when neither DRX_LOG nor --verbose is given
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Login(args) => auth::run_login(args, global),
        Commands::Register(args) => auth::run_register(args, global),
        Commands::Logout => auth::run_logout(global),
        Commands::Whoami => auth::run_whoami(global),
        Commands::Product(cmd) => product::run(cmd, global),
        Commands::Material(cmd) => material::run(cmd, global),
        Commands::User(cmd) => user::run(cmd, global),
        Commands::Dashboard(args) => dashboard::run(args, global),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Logs go to stderr so JSON and CSV output stay clean
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("DRX_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
