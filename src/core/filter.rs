//! Product filtering
//!
//! A [`ProductFilter`] combines independent criteria with AND. Within the
//! stage and material sets any selected value matches (OR). Unset criteria
//! impose no constraint, so the default filter passes every product.

use std::collections::BTreeSet;

use crate::entities::Product;

/// Inclusive numeric range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// A value is excluded only when strictly outside an explicit bound
    pub fn contains(&self, value: f64) -> bool {
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        !below && !above
    }
}

/// Criteria for narrowing the product list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Accepted current-stage labels
    pub stages: BTreeSet<String>,
    /// Accepted material numbers; a product matches if any BOM line uses one
    pub materials: BTreeSet<String>,
    pub height: Bounds,
    pub width: Bounds,
    pub weight: Bounds,
    /// Case-insensitive substring of the product name
    pub name: Option<String>,
}

impl ProductFilter {
    /// True when no criterion is active
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
            && self.materials.is_empty()
            && !self.height.is_set()
            && !self.width.is_set()
            && !self.weight.is_set()
            && self.name.as_deref().map_or(true, str::is_empty)
    }

    /// Check a single product against every active criterion
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_name(product)
            && self.matches_stage(product)
            && self.matches_materials(product)
            && self.height.contains(product.estimated_height)
            && self.width.contains(product.estimated_width)
            && self.weight.contains(product.estimated_weight)
    }

    fn matches_name(&self, product: &Product) -> bool {
        match self.name.as_deref() {
            None | Some("") => true,
            Some(needle) => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }

    fn matches_stage(&self, product: &Product) -> bool {
        if self.stages.is_empty() {
            return true;
        }
        // A product whose stage was never resolved has no label to match
        product
            .current_stage
            .as_ref()
            .is_some_and(|stage| self.stages.contains(stage))
    }

    fn matches_materials(&self, product: &Product) -> bool {
        if self.materials.is_empty() {
            return true;
        }
        product
            .bom_lines()
            .iter()
            .any(|line| self.materials.contains(line.material_number()))
    }

    /// Products passing the filter, in their original order
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// Distinct material numbers used by the given products, in first-seen order
pub fn material_options(products: &[Product]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    products
        .iter()
        .flat_map(|p| p.bom_lines())
        .map(|line| line.material_number())
        .filter(|number| seen.insert(*number))
        .map(str::to_string)
        .collect()
}
