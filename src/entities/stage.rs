//! Lifecycle stages and stage history records

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label used when a product's current stage could not be resolved
pub const UNKNOWN_STAGE: &str = "Unknown";

/// Lifecycle stage of a product
///
/// Variants are declared in canonical lifecycle order, which is also the order
/// used when ranking stage transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Concept,
    Feasibility,
    Projection,
    Production,
    Retreat,
    Standby,
    Cancel,
}

impl Stage {
    /// All stages in canonical order
    pub const CANONICAL: [Stage; 7] = [
        Stage::Concept,
        Stage::Feasibility,
        Stage::Projection,
        Stage::Production,
        Stage::Retreat,
        Stage::Standby,
        Stage::Cancel,
    ];

    /// Wire name of the stage (e.g. "CONCEPT")
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Concept => "CONCEPT",
            Stage::Feasibility => "FEASIBILITY",
            Stage::Projection => "PROJECTION",
            Stage::Production => "PRODUCTION",
            Stage::Retreat => "RETREAT",
            Stage::Standby => "STANDBY",
            Stage::Cancel => "CANCEL",
        }
    }

    /// Position of this stage in the canonical sequence
    pub fn rank(&self) -> usize {
        Self::CANONICAL
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::CANONICAL.len())
    }

    /// Canonical rank of a stage name, or `None` for names outside the sequence
    ///
    /// Matching is exact: the backend always reports upper-case names.
    pub fn rank_of(name: &str) -> Option<usize> {
        Self::CANONICAL
            .iter()
            .position(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CANONICAL
            .iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Invalid stage: {}. Use one of: {}",
                    s,
                    Self::CANONICAL
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Stage reference embedded in a history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// User who performed a stage change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRef {
    pub username: String,
}

/// One entry of a product's stage history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryRecord {
    pub stage: StageRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ActorRef>,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start_of_stage: DateTime<Utc>,
}

impl StageHistoryRecord {
    /// Build a record from plain values
    pub fn new(stage: impl Into<String>, actor: Option<&str>, start: DateTime<Utc>) -> Self {
        Self {
            stage: StageRef {
                name: stage.into(),
                description: None,
            },
            user: actor.map(|username| ActorRef {
                username: username.to_string(),
            }),
            start_of_stage: start,
        }
    }

    pub fn stage_name(&self) -> &str {
        &self.stage.name
    }

    /// Username of the acting user, or "unknown" when the backend omitted it
    pub fn actor(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("unknown")
    }
}

/// Timestamps arrive either as ISO-8601 strings or epoch milliseconds,
/// depending on the backend's JSON date settings.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
        Raw::Text(text) => parse_timestamp(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse an ISO-8601 timestamp, treating values without an offset as UTC
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}
