//! `drx material` command - Material catalog management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::entity_cmd::{api_error, confirm, editor_error};
use crate::cli::helpers::{format_opt, truncate_str};
use crate::cli::output::{effective_format, print_json};
use crate::cli::table::TableView;
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::collection::MaterialCatalog;
use crate::core::editor::{self, MaterialDraft, MaterialField};
use crate::core::session::View;

#[derive(Subcommand, Debug)]
pub enum MaterialCommands {
    /// List catalog materials
    List(ListArgs),

    /// Show a material's details
    Show(NumberArgs),

    /// Add a material to the catalog
    New(NewArgs),

    /// Change a material's description or dimensions (administrators)
    Edit(EditArgs),

    /// Delete a material (administrators)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive search in number and description
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NumberArgs {
    /// Material number (e.g. M0001)
    pub number: String,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Material number: "M" followed by four digits
    pub number: String,

    /// Description
    #[arg(long, short = 'd')]
    pub description: String,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub weight: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Material number
    pub number: String,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long)]
    pub weight: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Material number
    pub number: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run a material subcommand
pub fn run(cmd: MaterialCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global)?;
    ctx.authorize(View::Products)?;

    match cmd {
        MaterialCommands::List(args) => run_list(args, &ctx),
        MaterialCommands::Show(args) => run_show(args, &ctx),
        MaterialCommands::New(args) => run_new(args, &ctx),
        MaterialCommands::Edit(args) => run_edit(args, &ctx),
        MaterialCommands::Delete(args) => run_delete(args, &ctx),
    }
}

fn load_catalog(ctx: &Context) -> Result<MaterialCatalog> {
    let backend = ctx.backend()?;
    MaterialCatalog::fetch(&backend).map_err(api_error)
}

fn not_found(number: &str) -> miette::Report {
    miette::miette!(
        help = "Run `drx material list` to see the catalog",
        "Material {} not found",
        number
    )
}

fn run_list(args: ListArgs, ctx: &Context) -> Result<()> {
    let catalog = load_catalog(ctx)?;
    let materials = catalog.search(args.search.as_deref().unwrap_or(""));

    if args.count {
        println!("{}", materials.len());
        return Ok(());
    }

    let format = effective_format(ctx.format, true);
    if format == OutputFormat::Json {
        return print_json(&materials);
    }

    if materials.is_empty() {
        println!("No materials found.");
        return Ok(());
    }

    let mut table = TableView::new(&["NUMBER", "DESCRIPTION", "WIDTH", "HEIGHT", "WEIGHT"]);
    for m in &materials {
        table.row(vec![
            m.material_number.clone(),
            truncate_str(&m.material_description, 40),
            format_opt(m.width),
            format_opt(m.height),
            format_opt(m.weight),
        ]);
    }
    table.print(format)?;

    if format == OutputFormat::Table {
        println!();
        println!("{} material(s) found.", style(materials.len()).cyan());
    }
    Ok(())
}

fn run_show(args: NumberArgs, ctx: &Context) -> Result<()> {
    let catalog = load_catalog(ctx)?;
    let material = catalog.get(&args.number).ok_or_else(|| not_found(&args.number))?;

    match ctx.format {
        OutputFormat::Json => return print_json(material),
        OutputFormat::Id => {
            println!("{}", material.material_number);
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Number").bold(),
        style(&material.material_number).cyan()
    );
    println!(
        "{}: {}",
        style("Description").bold(),
        material.material_description
    );
    println!("{}: {}", style("Width").bold(), format_opt(material.width));
    println!("{}: {}", style("Height").bold(), format_opt(material.height));
    println!("{}: {}", style("Weight").bold(), format_opt(material.weight));
    println!("{}", style("─".repeat(60)).dim());
    Ok(())
}

fn run_new(args: NewArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let mut catalog = MaterialCatalog::fetch(&backend).map_err(api_error)?;

    let mut draft = MaterialDraft::create(args.number.trim());
    draft
        .set(MaterialField::Description(args.description))
        .set(MaterialField::Width(args.width))
        .set(MaterialField::Height(args.height))
        .set(MaterialField::Weight(args.weight));

    let saved = draft.submit(&backend, &mut catalog).map_err(editor_error)?;
    println!(
        "{} Created material {}",
        style("✓").green(),
        style(&saved.material_number).cyan()
    );
    Ok(())
}

fn run_edit(args: EditArgs, ctx: &Context) -> Result<()> {
    if args.description.is_none()
        && args.width.is_none()
        && args.height.is_none()
        && args.weight.is_none()
    {
        return Err(miette::miette!(
            help = "See `drx material edit --help` for the available options",
            "Nothing to change"
        ));
    }

    ctx.require_admin("edit materials")?;
    let backend = ctx.backend()?;
    let mut catalog = MaterialCatalog::fetch(&backend).map_err(api_error)?;
    let current = catalog.get(&args.number).ok_or_else(|| not_found(&args.number))?;

    let mut draft = MaterialDraft::edit(current);
    if let Some(v) = args.description {
        draft.set(MaterialField::Description(v));
    }
    if args.width.is_some() {
        draft.set(MaterialField::Width(args.width));
    }
    if args.height.is_some() {
        draft.set(MaterialField::Height(args.height));
    }
    if args.weight.is_some() {
        draft.set(MaterialField::Weight(args.weight));
    }

    let saved = draft.submit(&backend, &mut catalog).map_err(editor_error)?;
    println!(
        "{} Updated material {}",
        style("✓").green(),
        style(&saved.material_number).cyan()
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    ctx.require_admin("delete materials")?;
    let backend = ctx.backend()?;
    let mut catalog = MaterialCatalog::fetch(&backend).map_err(api_error)?;
    if !catalog.contains(&args.number) {
        return Err(not_found(&args.number));
    }

    let prompt = format!("Delete material {}?", args.number);
    let Some(confirmed) = confirm(&prompt, args.yes)? else {
        return Ok(());
    };

    editor::delete_material(&backend, &mut catalog, &args.number, confirmed).map_err(api_error)?;
    println!(
        "{} Deleted material {}",
        style("✓").green(),
        style(&args.number).cyan()
    );
    Ok(())
}
