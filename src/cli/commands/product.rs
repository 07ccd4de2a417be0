//! `drx product` command - Product management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::path::PathBuf;

use crate::cli::entity_cmd::{api_error, confirm, editor_error, print_notice};
use crate::cli::helpers::{format_timestamp, truncate_str, LineAssignment, LineSpec};
use crate::cli::output::{effective_format, print_json};
use crate::cli::table::TableView;
use crate::cli::{Context, FilterArgs, GlobalOpts, OutputFormat};
use crate::core::api::{Backend, HttpBackend};
use crate::core::collection::{resolve_stages, MaterialCatalog, ProductCollection};
use crate::core::editor::{self, BomLineField, ProductDraft, ProductField};
use crate::core::notice::Notice;
use crate::core::session::View;
use crate::entities::{Product, Stage, UNKNOWN_STAGE};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products with filtering
    List(ListArgs),

    /// Show a product's details
    Show(IdArgs),

    /// Create a new product
    New(NewArgs),

    /// Change a product's fields or BOM lines
    Edit(EditArgs),

    /// Delete a product (administrators)
    Delete(DeleteArgs),

    /// Move a product to its next lifecycle stage
    NextStage(IdArgs),

    /// Put a product into a specific lifecycle stage
    SetStage(SetStageArgs),

    /// Show a product's stage history
    History(IdArgs),

    /// Show a product's bill of materials
    Bom(IdArgs),

    /// List material numbers used by any product's BOM
    MaterialsInUse,

    /// Export the product catalog as CSV (one row per BOM line)
    Export(ExportArgs),
}

/// Columns to sort the product list by
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Stage,
    Height,
    Width,
    Weight,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort by field
    #[arg(long, default_value = "id")]
    pub sort: SortColumn,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Product ID
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Product name (3-50 characters)
    #[arg(long, short = 'n')]
    pub name: String,

    /// Description (5-200 characters)
    #[arg(long, short = 'd')]
    pub description: String,

    /// Estimated height
    #[arg(long, default_value_t = 0.0)]
    pub height: f64,

    /// Estimated width
    #[arg(long, default_value_t = 0.0)]
    pub width: f64,

    /// Estimated weight
    #[arg(long, default_value_t = 0.0)]
    pub weight: f64,

    /// BOM name (defaults to "New BOM" when materials are given)
    #[arg(long)]
    pub bom_name: Option<String>,

    /// BOM line as NUMBER[:QTY[:UNIT]] (repeatable)
    #[arg(long = "material", short = 'm', value_name = "NUMBER[:QTY[:UNIT]]")]
    pub materials: Vec<LineSpec>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Product ID
    pub id: i64,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New estimated height
    #[arg(long)]
    pub height: Option<f64>,

    /// New estimated width
    #[arg(long)]
    pub width: Option<f64>,

    /// New estimated weight
    #[arg(long)]
    pub weight: Option<f64>,

    /// New BOM name
    #[arg(long)]
    pub bom_name: Option<String>,

    /// Set a line's quantity, as LINE=QTY (repeatable)
    #[arg(long, value_name = "LINE=QTY")]
    pub set_quantity: Vec<LineAssignment>,

    /// Set a line's unit of measure, as LINE=UNIT (repeatable)
    #[arg(long, value_name = "LINE=UNIT")]
    pub set_unit: Vec<LineAssignment>,

    /// Remove a BOM line by number (repeatable)
    #[arg(long, value_name = "LINE")]
    pub remove_line: Vec<usize>,

    /// Append a BOM line as NUMBER[:QTY[:UNIT]] (repeatable)
    #[arg(long, value_name = "NUMBER[:QTY[:UNIT]]")]
    pub add_material: Vec<LineSpec>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Product ID
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetStageArgs {
    /// Product ID
    pub id: i64,

    /// Target stage (CONCEPT, FEASIBILITY, PROJECTION, PRODUCTION, RETREAT, STANDBY, CANCEL)
    pub stage: Stage,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output file (stdout when omitted)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run a product subcommand
pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global)?;
    ctx.authorize(View::Products)?;

    match cmd {
        ProductCommands::List(args) => run_list(args, &ctx),
        ProductCommands::Show(args) => run_show(args, &ctx),
        ProductCommands::New(args) => run_new(args, &ctx),
        ProductCommands::Edit(args) => run_edit(args, &ctx),
        ProductCommands::Delete(args) => run_delete(args, &ctx),
        ProductCommands::NextStage(args) => run_next_stage(args, &ctx),
        ProductCommands::SetStage(args) => run_set_stage(args, &ctx),
        ProductCommands::History(args) => run_history(args, &ctx),
        ProductCommands::Bom(args) => run_bom(args, &ctx),
        ProductCommands::MaterialsInUse => run_materials_in_use(&ctx),
        ProductCommands::Export(args) => run_export(args, &ctx),
    }
}

/// Fetch one product with its current stage resolved
fn fetch_one(backend: &HttpBackend, id: i64) -> Result<Product> {
    let product = backend
        .list_products()
        .map_err(api_error)?
        .into_iter()
        .find(|p| p.id == Some(id))
        .ok_or_else(|| miette::miette!("Product {} not found", id))?;
    resolve_stages(backend, vec![product])
        .pop()
        .ok_or_else(|| miette::miette!("Product {} not found", id))
}

fn stage_label(product: &Product) -> &str {
    product.current_stage.as_deref().unwrap_or(UNKNOWN_STAGE)
}

fn run_list(args: ListArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let collection = ProductCollection::fetch(&backend).map_err(api_error)?;
    let mut products = collection.filtered(&args.filter.to_filter());

    match args.sort {
        SortColumn::Id => products.sort_by_key(|p| p.id),
        SortColumn::Name => products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortColumn::Stage => products.sort_by_key(|p| {
            Stage::rank_of(stage_label(p)).unwrap_or(Stage::CANONICAL.len())
        }),
        SortColumn::Height => products.sort_by(|a, b| a.estimated_height.total_cmp(&b.estimated_height)),
        SortColumn::Width => products.sort_by(|a, b| a.estimated_width.total_cmp(&b.estimated_width)),
        SortColumn::Weight => products.sort_by(|a, b| a.estimated_weight.total_cmp(&b.estimated_weight)),
    }

    if args.reverse {
        products.reverse();
    }

    if let Some(limit) = args.limit {
        products.truncate(limit);
    }

    if args.count {
        println!("{}", products.len());
        return Ok(());
    }

    let format = effective_format(ctx.format, true);
    if format == OutputFormat::Json {
        return print_json(&products);
    }

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    let mut table = TableView::new(&["ID", "NAME", "STAGE", "HEIGHT", "WIDTH", "WEIGHT", "BOM LINES"]);
    for p in &products {
        table.row(vec![
            p.id_or_default().to_string(),
            truncate_str(&p.name, 40),
            stage_label(p).to_string(),
            p.estimated_height.to_string(),
            p.estimated_width.to_string(),
            p.estimated_weight.to_string(),
            p.bom_lines().len().to_string(),
        ]);
    }
    table.print(format)?;

    if format == OutputFormat::Table {
        println!();
        println!(
            "{} product(s) found. Use {} to view details.",
            style(products.len()).cyan(),
            style("drx product show <ID>").yellow()
        );
    }
    Ok(())
}

fn run_show(args: IdArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let product = fetch_one(&backend, args.id)?;

    match ctx.format {
        OutputFormat::Json => return print_json(&product),
        OutputFormat::Id => {
            println!("{}", product.id_or_default());
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(product.id_or_default()).cyan()
    );
    println!("{}: {}", style("Name").bold(), style(&product.name).yellow());
    println!("{}: {}", style("Stage").bold(), stage_label(&product));
    println!(
        "{}: {} x {} (weight {})",
        style("Dimensions").bold(),
        product.estimated_height,
        product.estimated_width,
        product.estimated_weight
    );
    println!("{}", style("─".repeat(60)).dim());
    println!();
    println!("{}", product.description);
    println!();

    match &product.bom {
        Some(bom) if !bom.bom_materials.is_empty() => {
            println!(
                "{} {} ({} line(s))",
                style("BOM:").bold(),
                bom.name,
                bom.bom_materials.len()
            );
            for line in &bom.bom_materials {
                println!(
                    "  • {} {} x{} {}",
                    style(line.material_number()).cyan(),
                    line.material.material_description,
                    line.quantity,
                    line.unit_measure_code
                );
            }
        }
        _ => println!("{}", style("No BOM data available").dim()),
    }
    Ok(())
}

/// Append a BOM line for a catalog material
fn add_line(draft: &mut ProductDraft, catalog: &MaterialCatalog, spec: &LineSpec) -> Result<()> {
    let material = catalog.get(&spec.material_number).cloned().ok_or_else(|| {
        miette::miette!(
            help = "Run `drx material list` to see the catalog",
            "Material {} not found",
            spec.material_number
        )
    })?;
    draft.add_material(material);
    let index = draft.product().bom_lines().len() - 1;
    draft
        .set_line(index, BomLineField::Quantity(spec.quantity))
        .and_then(|_| draft.set_line(index, BomLineField::Unit(spec.unit.clone())))
        .map_err(|e| miette::miette!("{}", e))
}

fn run_new(args: NewArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;

    let mut draft = ProductDraft::create();
    draft
        .set(ProductField::Name(args.name))
        .set(ProductField::Description(args.description))
        .set(ProductField::Height(args.height))
        .set(ProductField::Width(args.width))
        .set(ProductField::Weight(args.weight));

    if !args.materials.is_empty() {
        let catalog = MaterialCatalog::fetch(&backend).map_err(api_error)?;
        for spec in &args.materials {
            add_line(&mut draft, &catalog, spec)?;
        }
    }
    if let Some(bom_name) = args.bom_name {
        draft.set(ProductField::BomName(bom_name));
    }

    let mut products = ProductCollection::default();
    let saved = draft.submit(&backend, &mut products).map_err(editor_error)?;

    println!(
        "{} Created product {} ({})",
        style("✓").green(),
        style(saved.id_or_default()).cyan(),
        saved.name
    );
    Ok(())
}

fn run_edit(args: EditArgs, ctx: &Context) -> Result<()> {
    let has_changes = args.name.is_some()
        || args.description.is_some()
        || args.height.is_some()
        || args.width.is_some()
        || args.weight.is_some()
        || args.bom_name.is_some()
        || !args.set_quantity.is_empty()
        || !args.set_unit.is_empty()
        || !args.remove_line.is_empty()
        || !args.add_material.is_empty();
    if !has_changes {
        return Err(miette::miette!(
            help = "See `drx product edit --help` for the available options",
            "Nothing to change"
        ));
    }

    let backend = ctx.backend()?;
    let mut products = ProductCollection::new(vec![fetch_one(&backend, args.id)?]);
    let current = products
        .get(args.id)
        .ok_or_else(|| miette::miette!("Product {} not found", args.id))?;
    let mut draft = ProductDraft::edit(current);

    if let Some(v) = args.name {
        draft.set(ProductField::Name(v));
    }
    if let Some(v) = args.description {
        draft.set(ProductField::Description(v));
    }
    if let Some(v) = args.height {
        draft.set(ProductField::Height(v));
    }
    if let Some(v) = args.width {
        draft.set(ProductField::Width(v));
    }
    if let Some(v) = args.weight {
        draft.set(ProductField::Weight(v));
    }
    if let Some(v) = args.bom_name {
        draft.set(ProductField::BomName(v));
    }

    for a in &args.set_quantity {
        let qty = a
            .value
            .parse::<u32>()
            .map_err(|_| miette::miette!("Invalid quantity '{}' for line {}", a.value, a.line))?;
        draft
            .set_line(a.index(), BomLineField::Quantity(qty))
            .map_err(|e| miette::miette!("{}", e))?;
    }
    for a in &args.set_unit {
        draft
            .set_line(a.index(), BomLineField::Unit(a.value.clone()))
            .map_err(|e| miette::miette!("{}", e))?;
    }

    // Highest line first so earlier numbers stay valid
    let mut removals = args.remove_line.clone();
    removals.sort_unstable_by(|a, b| b.cmp(a));
    removals.dedup();
    for line in removals {
        let index = line
            .checked_sub(1)
            .ok_or_else(|| miette::miette!("BOM lines are numbered from 1"))?;
        draft.remove_line(index).map_err(|e| miette::miette!("{}", e))?;
    }

    if !args.add_material.is_empty() {
        let catalog = MaterialCatalog::fetch(&backend).map_err(api_error)?;
        for spec in &args.add_material {
            add_line(&mut draft, &catalog, spec)?;
        }
    }

    let saved = draft.submit(&backend, &mut products).map_err(editor_error)?;
    println!(
        "{} Updated product {} ({})",
        style("✓").green(),
        style(saved.id_or_default()).cyan(),
        saved.name
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    ctx.require_admin("delete products")?;
    let backend = ctx.backend()?;
    let product = fetch_one(&backend, args.id)?;

    let prompt = format!("Delete product {} ({})?", args.id, product.name);
    let Some(confirmed) = confirm(&prompt, args.yes)? else {
        return Ok(());
    };

    let mut products = ProductCollection::new(vec![product]);
    editor::delete_product(&backend, &mut products, args.id, confirmed).map_err(api_error)?;
    println!("{} Deleted product {}", style("✓").green(), args.id);
    Ok(())
}

fn require_stage_editor(ctx: &Context) -> Result<()> {
    if ctx.session.can_change_stage() {
        Ok(())
    } else {
        Err(miette::miette!(
            "Only administrators and designers can change lifecycle stages"
        ))
    }
}

/// Re-resolve and print the stage after a change
fn report_stage(backend: &HttpBackend, mut products: ProductCollection, id: i64) -> Result<()> {
    let product = products.refresh_stage(backend, id).map_err(api_error)?;
    println!(
        "   {}: {}",
        style("Current stage").dim(),
        style(stage_label(product)).cyan()
    );
    Ok(())
}

fn run_next_stage(args: IdArgs, ctx: &Context) -> Result<()> {
    require_stage_editor(ctx)?;
    let backend = ctx.backend()?;
    let products = ProductCollection::new(vec![fetch_one(&backend, args.id)?]);

    let message = backend.next_stage(args.id).map_err(api_error)?;
    print_notice(&Notice::success(message));
    report_stage(&backend, products, args.id)
}

fn run_set_stage(args: SetStageArgs, ctx: &Context) -> Result<()> {
    require_stage_editor(ctx)?;
    let backend = ctx.backend()?;
    let products = ProductCollection::new(vec![fetch_one(&backend, args.id)?]);

    let message = backend
        .set_stage(args.id, args.stage.as_str())
        .map_err(api_error)?;
    print_notice(&Notice::success(message));
    report_stage(&backend, products, args.id)
}

fn run_history(args: IdArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let mut history = backend.stage_history(args.id).map_err(api_error)?;
    history.sort_by_key(|r| r.start_of_stage);

    let format = effective_format(ctx.format, true);
    if format == OutputFormat::Json {
        return print_json(&history);
    }
    if history.is_empty() {
        println!("No stage history for product {}.", args.id);
        return Ok(());
    }

    let mut table = TableView::new(&["#", "STAGE", "CHANGED BY", "STARTED"]);
    for (i, record) in history.iter().enumerate() {
        table.row(vec![
            (i + 1).to_string(),
            record.stage_name().to_string(),
            record.actor().to_string(),
            format_timestamp(&record.start_of_stage),
        ]);
    }
    table.print(format)
}

fn run_bom(args: IdArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let product = fetch_one(&backend, args.id)?;

    let format = effective_format(ctx.format, true);
    if format == OutputFormat::Json {
        return print_json(&product.bom);
    }

    let Some(bom) = product.bom.as_ref().filter(|b| !b.bom_materials.is_empty()) else {
        println!("No BOM data available");
        return Ok(());
    };

    let mut table = TableView::new(&["LINE", "MATERIAL", "DESCRIPTION", "QTY", "UNIT"]);
    for (i, line) in bom.bom_materials.iter().enumerate() {
        table.row(vec![
            (i + 1).to_string(),
            line.material_number().to_string(),
            truncate_str(&line.material.material_description, 40),
            line.quantity.to_string(),
            line.unit_measure_code.clone(),
        ]);
    }
    if format == OutputFormat::Table {
        println!("{} {}", style("BOM:").bold(), style(&bom.name).yellow());
    }
    table.print(format)
}

fn run_materials_in_use(ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let products = ProductCollection::new(backend.list_products().map_err(api_error)?);
    let numbers = products.material_options();

    if ctx.format == OutputFormat::Json {
        return print_json(&numbers);
    }
    if numbers.is_empty() {
        println!("No materials in use.");
        return Ok(());
    }
    for number in numbers {
        println!("{}", number);
    }
    Ok(())
}

/// One CSV row per BOM line; products without lines get a single row
fn export_rows(products: &[Product]) -> TableView {
    let mut table = TableView::new(&[
        "product_id",
        "name",
        "description",
        "stage",
        "height",
        "width",
        "weight",
        "bom",
        "material_number",
        "material_description",
        "quantity",
        "unit",
    ]);
    for p in products {
        let base = vec![
            p.id_or_default().to_string(),
            p.name.clone(),
            p.description.clone(),
            stage_label(p).to_string(),
            p.estimated_height.to_string(),
            p.estimated_width.to_string(),
            p.estimated_weight.to_string(),
            p.bom.as_ref().map(|b| b.name.clone()).unwrap_or_default(),
        ];
        if p.bom_lines().is_empty() {
            let mut row = base;
            row.extend([String::new(), String::new(), String::new(), String::new()]);
            table.row(row);
            continue;
        }
        for line in p.bom_lines() {
            let mut row = base.clone();
            row.extend([
                line.material_number().to_string(),
                line.material.material_description.clone(),
                line.quantity.to_string(),
                line.unit_measure_code.clone(),
            ]);
            table.row(row);
        }
    }
    table
}

fn run_export(args: ExportArgs, ctx: &Context) -> Result<()> {
    let backend = ctx.backend()?;
    let collection = ProductCollection::fetch(&backend).map_err(api_error)?;
    let products = collection.filtered(&args.filter.to_filter());
    let table = export_rows(&products);

    match args.output {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            table.write_csv(file).into_diagnostic()?;
            println!(
                "{} Exported {} product(s) to {}",
                style("✓").green(),
                products.len(),
                style(path.display()).cyan()
            );
        }
        None => table.write_csv(std::io::stdout().lock()).into_diagnostic()?,
    }
    Ok(())
}
