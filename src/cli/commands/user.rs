//! `drx user` command - User accounts and role assignment

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::entity_cmd::{api_error, confirm, editor_error, print_notice};
use crate::cli::output::{effective_format, print_json};
use crate::cli::table::TableView;
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::api::HttpBackend;
use crate::core::collection::UserDirectory;
use crate::core::editor::{self, RolesDraft};
use crate::core::notice::Notice;
use crate::core::session::View;
use crate::entities::{RoleName, User};

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List user accounts
    List,

    /// Show a user's details
    Show(UserArgs),

    /// Replace a user's roles
    SetRoles(SetRolesArgs),

    /// Add a role to a user
    Grant(RoleArgs),

    /// Remove a role from a user
    Revoke(RoleArgs),

    /// Delete a user account
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct UserArgs {
    /// User ID or username
    pub user: String,
}

#[derive(clap::Args, Debug)]
pub struct SetRolesArgs {
    /// User ID or username
    pub user: String,

    /// Roles to assign (comma-separated)
    #[arg(value_delimiter = ',', required = true)]
    pub roles: Vec<RoleName>,
}

#[derive(clap::Args, Debug)]
pub struct RoleArgs {
    /// User ID or username
    pub user: String,

    /// Role name (e.g. ROLE_DESIGNER or designer)
    pub role: RoleName,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// User ID or username
    pub user: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run a user subcommand
pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global)?;
    ctx.authorize(View::Users)?;

    match cmd {
        UserCommands::List => run_list(&ctx),
        UserCommands::Show(args) => run_show(args, &ctx),
        UserCommands::SetRoles(args) => {
            update_roles(&ctx, &args.user, |draft| {
                draft.assign(&args.roles);
            })
        }
        UserCommands::Grant(args) => update_roles(&ctx, &args.user, |draft| {
            draft.grant(args.role);
        }),
        UserCommands::Revoke(args) => update_roles(&ctx, &args.user, |draft| {
            draft.revoke(args.role);
        }),
        UserCommands::Delete(args) => run_delete(args, &ctx),
    }
}

fn load_users(ctx: &Context) -> Result<(HttpBackend, UserDirectory)> {
    let backend = ctx.backend()?;
    let users = UserDirectory::fetch(&backend).map_err(api_error)?;
    Ok((backend, users))
}

fn find_user<'a>(users: &'a UserDirectory, key: &str) -> Result<&'a User> {
    users.find(key).ok_or_else(|| {
        miette::miette!(
            help = "Run `drx user list` to see all accounts",
            "User '{}' not found",
            key
        )
    })
}

fn roles_label(user: &User) -> String {
    if user.roles.is_empty() {
        "-".to_string()
    } else {
        user.role_names().join(", ")
    }
}

fn run_list(ctx: &Context) -> Result<()> {
    let (_, users) = load_users(ctx)?;

    let format = effective_format(ctx.format, true);
    if format == OutputFormat::Json {
        return print_json(users.users());
    }

    if users.users().is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut table = TableView::new(&["ID", "USERNAME", "EMAIL", "ROLES"]);
    for u in users.users() {
        table.row(vec![
            u.id.to_string(),
            u.username.clone(),
            u.email.clone(),
            roles_label(u),
        ]);
    }
    table.print(format)?;

    if format == OutputFormat::Table {
        println!();
        println!("{} user(s) found.", style(users.users().len()).cyan());
    }
    Ok(())
}

fn run_show(args: UserArgs, ctx: &Context) -> Result<()> {
    let (_, users) = load_users(ctx)?;
    let user = find_user(&users, &args.user)?;

    match ctx.format {
        OutputFormat::Json => return print_json(user),
        OutputFormat::Id => {
            println!("{}", user.id);
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("ID").bold(), style(user.id).cyan());
    println!("{}: {}", style("Username").bold(), style(&user.username).yellow());
    println!("{}: {}", style("Email").bold(), user.email);
    println!("{}: {}", style("Roles").bold(), roles_label(user));
    println!("{}", style("─".repeat(60)).dim());
    Ok(())
}

/// Edit a user's role set and send it to the backend
fn update_roles<F>(ctx: &Context, key: &str, edit: F) -> Result<()>
where
    F: FnOnce(&mut RolesDraft),
{
    let (backend, mut users) = load_users(ctx)?;
    let user = find_user(&users, key)?;
    let id = user.id;

    let mut draft = RolesDraft::edit(user);
    edit(&mut draft);
    if draft.roles().next().is_none() {
        return Err(miette::miette!("A user needs at least one role"));
    }

    let message = draft.submit(&backend, &mut users).map_err(editor_error)?;
    print_notice(&Notice::success(message));
    if let Some(updated) = users.get(id) {
        println!(
            "   {} {}",
            style(format!("{}:", updated.username)).dim(),
            roles_label(updated)
        );
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let (backend, mut users) = load_users(ctx)?;
    let user = find_user(&users, &args.user)?;
    let (id, username) = (user.id, user.username.clone());

    let prompt = format!("Delete user {} ({})?", id, username);
    let Some(confirmed) = confirm(&prompt, args.yes)? else {
        return Ok(());
    };

    editor::delete_user(&backend, &mut users, id, confirmed).map_err(api_error)?;
    println!(
        "{} Deleted user {}",
        style("✓").green(),
        style(&username).cyan()
    );
    Ok(())
}
