//! `drx dashboard` command - Lifecycle statistics for administrators

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::entity_cmd::api_error;
use crate::cli::output::print_json;
use crate::cli::table::TableView;
use crate::cli::{Context, GlobalOpts, OutputFormat};
use crate::core::analytics::{self, MaterialUsage, TransitionSummary};
use crate::core::api::Backend;
use crate::core::collection::ProductCollection;
use crate::core::session::View;
use crate::entities::Stage;

const BAR_WIDTH: usize = 40;

/// Dashboard sections
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Section {
    /// Products per lifecycle stage
    Stages,
    /// Most used materials by BOM quantity
    Materials,
    /// Average time between stages
    Transitions,
    /// Users per role
    Roles,
}

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// Show only these sections (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<Section>,
}

impl DashboardArgs {
    fn shows(&self, section: Section) -> bool {
        self.only.is_empty() || self.only.contains(&section)
    }
}

/// Everything the dashboard displays, as emitted by `--format json`
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_distribution: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    material_usage: Option<Vec<MaterialUsage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_transitions: Option<Vec<TransitionSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_distribution: Option<BTreeMap<String, usize>>,
}

pub fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load(global)?;
    ctx.authorize(View::Dashboard)?;
    let backend = ctx.backend()?;

    let mut report = Report::default();

    let needs_products = args.shows(Section::Stages)
        || args.shows(Section::Materials)
        || args.shows(Section::Transitions);
    if needs_products {
        let products = ProductCollection::fetch(&backend).map_err(api_error)?;
        let products = products.products();
        if args.shows(Section::Stages) {
            report.stage_distribution = Some(analytics::stage_distribution(products));
        }
        if args.shows(Section::Materials) {
            report.material_usage = Some(analytics::material_usage(products));
        }
        if args.shows(Section::Transitions) {
            report.stage_transitions = Some(analytics::load_transition_summary(&backend, products));
        }
    }
    if args.shows(Section::Roles) {
        let users = backend.list_users().map_err(api_error)?;
        report.role_distribution = Some(analytics::role_distribution(&users));
    }

    if ctx.format == OutputFormat::Json {
        return print_json(&report);
    }
    print_report(&report)
}

/// Horizontal bar scaled against the largest value
fn render_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(len.clamp(1, width))
}

/// Canonical stages first, then anything else the backend reported
fn ordered_stages(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by_key(|(name, _)| Stage::rank_of(name).unwrap_or(Stage::CANONICAL.len()));
    rows
}

fn print_heading(title: &str) {
    println!();
    println!("{}", style(title).bold());
    println!("{}", style("─".repeat(60)).dim());
}

fn print_counts(rows: &[(&str, usize)]) {
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let label_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, count) in rows {
        println!(
            "  {:<width$}  {:>4}  {}",
            name,
            count,
            style(render_bar(*count, max, BAR_WIDTH)).cyan(),
            width = label_width
        );
    }
}

fn print_report(report: &Report) -> Result<()> {
    if let Some(stages) = &report.stage_distribution {
        print_heading("Products by stage");
        if stages.is_empty() {
            println!("  {}", style("No products").dim());
        } else {
            print_counts(&ordered_stages(stages));
        }
    }

    if let Some(usage) = &report.material_usage {
        print_heading("Top materials");
        if usage.is_empty() {
            println!("  {}", style("No BOM data available").dim());
        } else {
            let max = usage.iter().map(|u| u.total_quantity).max().unwrap_or(0);
            for u in usage {
                println!(
                    "  {:<8} {:>6}  {}",
                    u.material_number,
                    u.total_quantity,
                    style(render_bar(u.total_quantity as usize, max as usize, BAR_WIDTH)).green()
                );
            }
        }
    }

    if let Some(transitions) = &report.stage_transitions {
        print_heading("Stage transitions");
        if transitions.is_empty() {
            println!("  {}", style("No stage changes recorded").dim());
        } else {
            let mut table = TableView::new(&["FROM", "TO", "AVG DAYS", "COUNT"]);
            for t in transitions {
                table.row(vec![
                    t.from_stage.clone(),
                    t.to_stage.clone(),
                    format!("{:.1}", t.average_duration_days),
                    t.count.to_string(),
                ]);
            }
            table.print(OutputFormat::Table)?;
        }
    }

    if let Some(roles) = &report.role_distribution {
        print_heading("Users by role");
        if roles.is_empty() {
            println!("  {}", style("No users").dim());
        } else {
            let rows: Vec<(&str, usize)> = roles.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            print_counts(&rows);
        }
    }
    Ok(())
}
