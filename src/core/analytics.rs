//! Dashboard aggregations
//!
//! Read-only projections over already-fetched products, users and stage
//! histories. Only [`load_transition_summary`] talks to the backend, and it
//! tolerates per-product failures.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::core::api::Backend;
use crate::core::fanout::{fan_out, Slot};
use crate::entities::{Product, Stage, StageHistoryRecord, User, UNKNOWN_STAGE};

/// Number of materials reported by [`material_usage`]
pub const MATERIAL_USAGE_LIMIT: usize = 10;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Total quantity of one material across all BOM lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUsage {
    pub material_number: String,
    pub total_quantity: u64,
}

/// A single move between two consecutive history records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    pub from_stage: String,
    pub to_stage: String,
    pub duration_days: f64,
}

/// Mean duration of every transition between the same pair of stages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSummary {
    pub from_stage: String,
    pub to_stage: String,
    pub average_duration_days: f64,
    pub count: usize,
}

/// Count products per current stage
///
/// Products whose stage was never resolved are counted under
/// [`UNKNOWN_STAGE`].
pub fn stage_distribution(products: &[Product]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for product in products {
        let label = product.current_stage.as_deref().unwrap_or(UNKNOWN_STAGE);
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Most used materials by total BOM quantity
///
/// Sorted by quantity descending, ties by material number, and truncated to
/// [`MATERIAL_USAGE_LIMIT`] entries.
pub fn material_usage(products: &[Product]) -> Vec<MaterialUsage> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for line in products.iter().flat_map(|p| p.bom_lines()) {
        *totals.entry(line.material_number()).or_insert(0) += u64::from(line.quantity);
    }

    let mut usage: Vec<MaterialUsage> = totals
        .into_iter()
        .map(|(number, total)| MaterialUsage {
            material_number: number.to_string(),
            total_quantity: total,
        })
        .collect();
    usage.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then_with(|| a.material_number.cmp(&b.material_number))
    });
    usage.truncate(MATERIAL_USAGE_LIMIT);
    usage
}

/// Transitions of one product, in chronological order
///
/// Records with equal timestamps keep the order the server returned them in.
pub fn stage_transitions(history: &[StageHistoryRecord]) -> Vec<StageTransition> {
    let mut records: Vec<&StageHistoryRecord> = history.iter().collect();
    records.sort_by_key(|r| r.start_of_stage);

    records
        .windows(2)
        .map(|pair| {
            let elapsed = pair[1].start_of_stage - pair[0].start_of_stage;
            StageTransition {
                from_stage: pair[0].stage_name().to_string(),
                to_stage: pair[1].stage_name().to_string(),
                duration_days: elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY,
            }
        })
        .collect()
}

/// Ordering key of a stage name: canonical rank, unknown names last
fn stage_order(a: &str, b: &str) -> Ordering {
    let rank = |name: &str| Stage::rank_of(name).unwrap_or(Stage::CANONICAL.len());
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Group transitions by stage pair and average their durations
///
/// Groups are ordered by the canonical rank of the from-stage, then of the
/// to-stage. Stage names outside the canonical sequence sort after all known
/// ones, alphabetically among themselves.
pub fn summarize_transitions<I>(transitions: I) -> Vec<TransitionSummary>
where
    I: IntoIterator<Item = StageTransition>,
{
    let mut groups: HashMap<(String, String), (f64, usize)> = HashMap::new();
    for t in transitions {
        let entry = groups.entry((t.from_stage, t.to_stage)).or_insert((0.0, 0));
        entry.0 += t.duration_days;
        entry.1 += 1;
    }

    let mut summaries: Vec<TransitionSummary> = groups
        .into_iter()
        .map(|((from, to), (total, count))| TransitionSummary {
            from_stage: from,
            to_stage: to,
            average_duration_days: total / count as f64,
            count,
        })
        .collect();
    summaries.sort_by(|a, b| {
        stage_order(&a.from_stage, &b.from_stage)
            .then_with(|| stage_order(&a.to_stage, &b.to_stage))
    });
    summaries
}

/// Fetch every product's stage history and summarize the transitions
///
/// A product whose history cannot be fetched contributes no transitions.
pub fn load_transition_summary(
    backend: &dyn Backend,
    products: &[Product],
) -> Vec<TransitionSummary> {
    let ids: Vec<i64> = products.iter().filter_map(|p| p.id).collect();
    let histories = fan_out(
        "stage history",
        &ids,
        |id| backend.stage_history(*id),
        |_| Vec::new(),
    );

    summarize_transitions(
        histories
            .iter()
            .map(Slot::value)
            .flat_map(|history| stage_transitions(history)),
    )
}

/// Count users per role name
pub fn role_distribution(users: &[User]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for role in users.iter().flat_map(|u| &u.roles) {
        *counts.entry(role.name.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api::fake::FakeBackend;
    use crate::entities::product::{Bom, BomMaterial, DEFAULT_UNIT};
    use crate::entities::{Material, Role};
    use chrono::{Duration, TimeZone, Utc};

    fn with_bom(id: i64, stage: Option<&str>, lines: &[(&str, u32)]) -> Product {
        let mut p = Product::new(format!("Product {}", id), "description");
        p.id = Some(id);
        p.current_stage = stage.map(str::to_string);
        if !lines.is_empty() {
            let mut bom = Bom::new("bom");
            for (number, qty) in lines {
                bom.bom_materials
                    .push(BomMaterial::new(Material::new(*number, "m"), *qty, DEFAULT_UNIT));
            }
            p.bom = Some(bom);
        }
        p
    }

    #[test]
    fn test_dashboard_scenario() {
        let mut first = with_bom(1, Some("CONCEPT"), &[("M0001", 3)]);
        first.estimated_height = 5.0;
        let mut second = with_bom(2, Some("PRODUCTION"), &[]);
        second.estimated_height = 15.0;
        let products = vec![first, second];

        let dist = stage_distribution(&products);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist["CONCEPT"], 1);
        assert_eq!(dist["PRODUCTION"], 1);

        assert_eq!(
            material_usage(&products),
            vec![MaterialUsage {
                material_number: "M0001".to_string(),
                total_quantity: 3
            }]
        );
    }

    #[test]
    fn test_unresolved_stage_bucket() {
        let products = vec![with_bom(1, None, &[]), with_bom(2, Some("CONCEPT"), &[])];
        let dist = stage_distribution(&products);
        assert_eq!(dist[UNKNOWN_STAGE], 1);
        assert_eq!(dist["CONCEPT"], 1);
    }

    #[test]
    fn test_material_usage_top_ten() {
        let products: Vec<Product> = (0..12)
            .map(|i| {
                let number = format!("M{:04}", i);
                with_bom(i, Some("CONCEPT"), &[(number.as_str(), (i as u32) + 1)])
            })
            .chain(std::iter::once(with_bom(99, None, &[("M0003", 100)])))
            .collect();

        let usage = material_usage(&products);
        assert_eq!(usage.len(), MATERIAL_USAGE_LIMIT);
        assert!(usage
            .windows(2)
            .all(|w| w[0].total_quantity >= w[1].total_quantity));
        assert_eq!(usage[0].material_number, "M0003");
        assert_eq!(usage[0].total_quantity, 104);

        // Every reported total matches the sum over BOM lines of that material
        for entry in &usage {
            let expected: u64 = products
                .iter()
                .flat_map(|p| p.bom_lines())
                .filter(|l| l.material_number() == entry.material_number)
                .map(|l| u64::from(l.quantity))
                .sum();
            assert_eq!(entry.total_quantity, expected);
        }
    }

    #[test]
    fn test_material_usage_tie_break() {
        let products = vec![with_bom(1, None, &[("M0002", 5), ("M0001", 5)])];
        let numbers: Vec<String> = material_usage(&products)
            .into_iter()
            .map(|u| u.material_number)
            .collect();
        assert_eq!(numbers, vec!["M0001", "M0002"]);
    }

    #[test]
    fn test_two_day_transition() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let history = vec![
            StageHistoryRecord::new("FEASIBILITY", Some("bob"), t0 + Duration::days(2)),
            StageHistoryRecord::new("CONCEPT", Some("alice"), t0),
        ];

        let summary = summarize_transitions(stage_transitions(&history));
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].from_stage, "CONCEPT");
        assert_eq!(summary[0].to_stage, "FEASIBILITY");
        assert_eq!(summary[0].count, 1);
        assert_eq!(summary[0].average_duration_days, 2.0);
    }

    #[test]
    fn test_fractional_and_averaged_durations() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let a = vec![
            StageHistoryRecord::new("CONCEPT", None, t0),
            StageHistoryRecord::new("FEASIBILITY", None, t0 + Duration::hours(12)),
        ];
        let b = vec![
            StageHistoryRecord::new("CONCEPT", None, t0),
            StageHistoryRecord::new("FEASIBILITY", None, t0 + Duration::hours(36)),
        ];
        let summary = summarize_transitions(
            stage_transitions(&a)
                .into_iter()
                .chain(stage_transitions(&b)),
        );
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].average_duration_days, 1.0);
    }

    #[test]
    fn test_transition_order_puts_unknown_stages_last() {
        let t = |from: &str, to: &str| StageTransition {
            from_stage: from.to_string(),
            to_stage: to.to_string(),
            duration_days: 1.0,
        };
        let summary = summarize_transitions(vec![
            t("ARCHIVED", "CONCEPT"),
            t("PRODUCTION", "RETREAT"),
            t("CONCEPT", "PROJECTION"),
            t("CONCEPT", "FEASIBILITY"),
            t("CONCEPT", "LEGACY"),
        ]);
        let pairs: Vec<(&str, &str)> = summary
            .iter()
            .map(|s| (s.from_stage.as_str(), s.to_stage.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("CONCEPT", "FEASIBILITY"),
                ("CONCEPT", "PROJECTION"),
                ("CONCEPT", "LEGACY"),
                ("PRODUCTION", "RETREAT"),
                ("ARCHIVED", "CONCEPT"),
            ]
        );
    }

    #[test]
    fn test_single_record_has_no_transitions() {
        let history = vec![StageHistoryRecord::new("CONCEPT", None, Utc::now())];
        assert!(stage_transitions(&history).is_empty());
        assert!(stage_transitions(&[]).is_empty());
    }

    #[test]
    fn test_role_distribution() {
        let user = |id: i64, roles: &[&str]| User {
            id,
            username: format!("u{}", id),
            email: String::new(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        };
        let users = vec![
            user(1, &["ROLE_ADMIN", "ROLE_USER"]),
            user(2, &["ROLE_USER"]),
            user(3, &[]),
        ];
        let dist = role_distribution(&users);
        assert_eq!(dist["ROLE_USER"], 2);
        assert_eq!(dist["ROLE_ADMIN"], 1);
        assert_eq!(dist.len(), 2);
    }

    #[test]
    fn test_failed_history_contributes_nothing() {
        let products = vec![
            with_bom(1, None, &[]),
            with_bom(2, None, &[]),
            with_bom(3, None, &[]),
        ];
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history = |days: i64| {
            vec![
                StageHistoryRecord::new("CONCEPT", None, t0),
                StageHistoryRecord::new("FEASIBILITY", None, t0 + Duration::days(days)),
            ]
        };
        let backend = FakeBackend::new()
            .with_history(1, history(1))
            .with_history(2, history(40))
            .with_history(3, history(3));
        backend.fail("stage_history:2");

        let summary = load_transition_summary(&backend, &products);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].average_duration_days, 2.0);
    }
}
