//! `drx login`, `drx register`, `drx logout` and `drx whoami`

use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use miette::{IntoDiagnostic, Result};

use crate::cli::entity_cmd::{api_error, session_error};
use crate::cli::output::print_json;
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::api::{Backend, SignInRequest, SignUpRequest};
use crate::core::session::{can_access, View};
use crate::entities::UserProfile;

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Username (prompted when omitted)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, short = 'p', env = "DRX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Username (prompted when omitted)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Email address (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, short = 'p', env = "DRX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

fn prompt_text(label: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(label)
            .interact_text()
            .into_diagnostic(),
    }
}

fn prompt_password(value: Option<String>, confirm: bool) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    prompt.interact().into_diagnostic()
}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let username = prompt_text("Username", args.username)?;
    let password = prompt_password(args.password, false)?;

    let backend = ctx.backend()?;
    let response = backend
        .sign_in(&SignInRequest { username, password })
        .map_err(api_error)?;
    let profile = ctx
        .session
        .establish(&ctx.store, response)
        .map_err(session_error)?;

    println!(
        "{} Logged in as {}",
        style("✓").green(),
        style(&profile.username).cyan()
    );
    Ok(())
}

pub fn run_register(args: RegisterArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let username = prompt_text("Username", args.username)?;
    let email = prompt_text("Email", args.email)?;
    let password = prompt_password(args.password, true)?;

    let backend = ctx.backend()?;
    let response = backend
        .sign_up(&SignUpRequest {
            email,
            username,
            password,
        })
        .map_err(api_error)?;
    let profile = ctx
        .session
        .establish(&ctx.store, response)
        .map_err(session_error)?;

    println!(
        "{} Registered and logged in as {}",
        style("✓").green(),
        style(&profile.username).cyan()
    );
    Ok(())
}

pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::load(global)?;
    let was_logged_in = ctx.session.is_logged_in();
    ctx.session.clear(&ctx.store).map_err(session_error)?;

    if was_logged_in {
        println!("{} Logged out", style("✓").green());
    } else {
        println!("Not logged in.");
    }
    println!("   Run {} to sign in", style("drx login").yellow());
    Ok(())
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global)?;
    let profile = ctx.authorize(View::Home)?;

    if ctx.format == OutputFormat::Json {
        return print_json(profile);
    }
    print_profile(profile);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Username").bold(),
        style(&profile.username).cyan()
    );
    println!("{}: {}", style("Email").bold(), profile.email);
    println!(
        "{}: {}",
        style("Roles").bold(),
        if profile.roles.is_empty() {
            "-".to_string()
        } else {
            profile.roles.join(", ")
        }
    );
    println!("{}", style("─".repeat(60)).dim());

    let views: Vec<String> = View::ALL
        .iter()
        .map(|view| {
            if can_access(&profile.roles, view.required_roles()) {
                style(view.to_string()).green().to_string()
            } else {
                style(format!("({})", view)).dim().to_string()
            }
        })
        .collect();
    println!("{}: {}", style("Views").dim(), views.join("  "));
}
