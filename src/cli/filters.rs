//! Product filter arguments shared by list and export commands

use clap::ValueEnum;

use crate::core::filter::{Bounds, ProductFilter};
use crate::entities::{Stage, UNKNOWN_STAGE};

/// Stage filter for product commands
///
/// Used to filter products by their resolved current stage.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StageFilter {
    Concept,
    Feasibility,
    Projection,
    Production,
    Retreat,
    Standby,
    Cancel,
    /// Products whose stage could not be resolved
    Unknown,
}

impl StageFilter {
    /// Stage label this filter value selects
    pub fn label(&self) -> &'static str {
        match self {
            StageFilter::Concept => Stage::Concept.as_str(),
            StageFilter::Feasibility => Stage::Feasibility.as_str(),
            StageFilter::Projection => Stage::Projection.as_str(),
            StageFilter::Production => Stage::Production.as_str(),
            StageFilter::Retreat => Stage::Retreat.as_str(),
            StageFilter::Standby => Stage::Standby.as_str(),
            StageFilter::Cancel => Stage::Cancel.as_str(),
            StageFilter::Unknown => UNKNOWN_STAGE,
        }
    }
}

impl std::fmt::Display for StageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Filter flags for product lists
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only products in these stages (comma-separated, any of)
    #[arg(long, short = 's', value_delimiter = ',')]
    pub stage: Vec<StageFilter>,

    /// Only products whose BOM uses one of these materials
    #[arg(long, short = 'm', value_delimiter = ',', value_name = "MATERIAL_NUMBER")]
    pub material: Vec<String>,

    /// Case-insensitive substring of the product name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Minimum estimated height
    #[arg(long)]
    pub min_height: Option<f64>,

    /// Maximum estimated height
    #[arg(long)]
    pub max_height: Option<f64>,

    /// Minimum estimated width
    #[arg(long)]
    pub min_width: Option<f64>,

    /// Maximum estimated width
    #[arg(long)]
    pub max_width: Option<f64>,

    /// Minimum estimated weight
    #[arg(long)]
    pub min_weight: Option<f64>,

    /// Maximum estimated weight
    #[arg(long)]
    pub max_weight: Option<f64>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            stages: self.stage.iter().map(|s| s.label().to_string()).collect(),
            materials: self
                .material
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            height: Bounds::new(self.min_height, self.max_height),
            width: Bounds::new(self.min_width, self.max_width),
            weight: Bounds::new(self.min_weight, self.max_weight),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_filter_labels() {
        assert_eq!(StageFilter::Concept.label(), "CONCEPT");
        assert_eq!(StageFilter::Cancel.to_string(), "CANCEL");
        assert_eq!(StageFilter::Unknown.label(), UNKNOWN_STAGE);
    }

    #[test]
    fn test_default_args_give_empty_filter() {
        assert!(FilterArgs::default().to_filter().is_empty());
    }

    #[test]
    fn test_args_to_filter() {
        let args = FilterArgs {
            stage: vec![StageFilter::Concept, StageFilter::Unknown],
            material: vec![" M0001 ".to_string(), String::new()],
            min_height: Some(10.0),
            ..Default::default()
        };
        let filter = args.to_filter();
        assert!(filter.stages.contains("CONCEPT"));
        assert!(filter.stages.contains(UNKNOWN_STAGE));
        assert_eq!(filter.materials.len(), 1);
        assert!(filter.materials.contains("M0001"));
        assert_eq!(filter.height.min, Some(10.0));
        assert!(!filter.width.is_set());
    }
}
