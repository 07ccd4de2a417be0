//! Product entity type - products and their bills of materials

use serde::{Deserialize, Serialize};

use crate::entities::material::Material;
use crate::entities::null_as_default;

/// Default unit of measure for new BOM lines
pub const DEFAULT_UNIT: &str = "pcs";

/// Name given to a BOM created implicitly when the first line is added
pub const NEW_BOM_NAME: &str = "New BOM";

/// One line of a bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomMaterial {
    /// Server-assigned line ID (absent for lines not yet saved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub material: Material,

    pub quantity: u32,

    #[serde(default)]
    pub unit_measure_code: String,
}

impl BomMaterial {
    pub fn new(material: Material, quantity: u32, unit: impl Into<String>) -> Self {
        Self {
            id: None,
            material,
            quantity,
            unit_measure_code: unit.into(),
        }
    }

    pub fn material_number(&self) -> &str {
        &self.material.material_number
    }
}

/// Bill of materials attached to a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    /// Ordered BOM lines
    #[serde(default, deserialize_with = "null_as_default")]
    pub bom_materials: Vec<BomMaterial>,
}

impl Bom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            bom_materials: Vec::new(),
        }
    }

    /// Whether any line references the given material number
    pub fn uses_material(&self, number: &str) -> bool {
        self.bom_materials
            .iter()
            .any(|line| line.material_number() == number)
    }
}

/// A product managed through its lifecycle
///
/// `current_stage` is not part of the backend's product record: it is resolved
/// with a separate request and attached client-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned ID (absent for products not yet created)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub estimated_height: f64,

    #[serde(default)]
    pub estimated_width: f64,

    #[serde(default)]
    pub estimated_weight: f64,

    #[serde(
        rename = "currentStage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_stage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom: Option<Bom>,
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Product ID, or 0 for unsaved products
    pub fn id_or_default(&self) -> i64 {
        self.id.unwrap_or_default()
    }

    /// BOM lines of this product (empty when it has no BOM)
    pub fn bom_lines(&self) -> &[BomMaterial] {
        self.bom
            .as_ref()
            .map(|b| b.bom_materials.as_slice())
            .unwrap_or(&[])
    }

    /// Copy suitable for a write request: the client-resolved stage is dropped
    pub fn to_payload(&self) -> Product {
        Product {
            current_stage: None,
            ..self.clone()
        }
    }
}
