//! Material entity type - catalog items usable in BOM lines

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Material numbers are "M" followed by exactly four digits (e.g. M1234)
pub const MATERIAL_NUMBER_PATTERN: &str = r"^M\d{4}$";

fn material_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MATERIAL_NUMBER_PATTERN).expect("static pattern is valid"))
}

/// Check a material number against [`MATERIAL_NUMBER_PATTERN`]
pub fn is_valid_material_number(number: &str) -> bool {
    material_number_regex().is_match(number)
}

/// A catalog material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Unique key of the material
    pub material_number: String,

    #[serde(default)]
    pub material_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Material {
    pub fn new(number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            material_number: number.into(),
            material_description: description.into(),
            ..Default::default()
        }
    }

    /// Case-insensitive match on material number or description
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.material_number.to_lowercase().contains(&needle)
            || self.material_description.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_number_validation() {
        assert!(is_valid_material_number("M1234"));
        assert!(is_valid_material_number("M0001"));
        assert!(!is_valid_material_number("1234"));
        assert!(!is_valid_material_number("M123"));
        assert!(!is_valid_material_number("M12345"));
        assert!(!is_valid_material_number("m1234"));
        assert!(!is_valid_material_number("M12a4"));
    }

    #[test]
    fn test_matches_search() {
        let steel = Material::new("M0042", "Stainless steel sheet");
        assert!(steel.matches_search("m004"));
        assert!(steel.matches_search("STEEL"));
        assert!(steel.matches_search(""));
        assert!(!steel.matches_search("copper"));
    }

    #[test]
    fn test_material_wire_format() {
        let json = r#"{"materialNumber":"M0001","materialDescription":"Bolt","height":1.5,"width":2.0,"weight":0.1}"#;
        let material: Material = serde_json::from_str(json).unwrap();
        assert_eq!(material.material_number, "M0001");
        assert_eq!(material.height, Some(1.5));

        let out = serde_json::to_value(&Material::new("M0002", "Nut")).unwrap();
        assert_eq!(out["materialNumber"], "M0002");
        assert!(out.get("width").is_none());
    }
}
