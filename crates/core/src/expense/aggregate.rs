//! Auto-aggregation of material purchase rows into synthetic expense rows.
//!
//! The projector is a pure function over a snapshot of purchase rows: it is
//! recomputed on every read, has no cache and no side effects, and its cost is
//! linear in the number of rows.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Summary text attached to every auto-aggregated expense row.
pub const AUTO_SUMMARY: &str = "Material Purchase (Auto)";

/// Maximum length of the material slug inside an auto expense id.
const SLUG_MAX_LEN: usize = 50;

/// How many supplier names are listed before collapsing to "+N more".
const SUPPLIER_NAME_LIMIT: usize = 3;

/// A snapshot of one material purchase row, as fetched from storage.
#[derive(Debug, Clone)]
pub struct PurchaseRow {
    /// Site the material was purchased for.
    pub site_id: Uuid,
    /// Supplier the purchase was recorded against.
    pub supplier_id: Uuid,
    /// Date of the purchase entry.
    pub entry_date: NaiveDate,
    /// Material name as entered (matching is case-insensitive).
    pub material: String,
    /// Quantity purchased.
    pub qty: Decimal,
    /// Rate per unit.
    pub rate: Decimal,
    /// Stored total, preferred over qty x rate when present.
    pub total_amount: Option<Decimal>,
}

impl PurchaseRow {
    /// Amount this row contributes to its group: the stored total when
    /// present, otherwise qty x rate.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.total_amount.unwrap_or_else(|| self.qty * self.rate)
    }
}

/// A synthetic expense row derived from material purchases.
///
/// Never persisted; the id is deterministic over `(site_id, material)` so the
/// UI can key rows stably across reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoExpense {
    /// Deterministic id: `AUTO_MSL_<site_id>_<slug>`.
    pub id: String,
    /// Site the expenses belong to.
    pub site_id: Uuid,
    /// Latest entry date seen in the group.
    pub expense_date: NaiveDate,
    /// Material name, first-seen casing.
    pub title: String,
    /// Always [`AUTO_SUMMARY`].
    pub summary: String,
    /// Contributing supplier names, collapsed past three.
    pub payment_details: String,
    /// Sum of row amounts in the group.
    pub amount: Decimal,
}

/// Slugifies a material name for use in an auto expense id.
///
/// Lowercases, collapses runs of non-alphanumeric characters to a single
/// underscore, trims leading/trailing underscores, and truncates.
#[must_use]
pub fn slugify_material(material: &str) -> String {
    let mut slug = String::with_capacity(material.len());
    let mut pending_sep = false;

    for ch in material.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }

    slug.chars().take(SLUG_MAX_LEN).collect()
}

/// Builds the deterministic id for an auto expense row.
#[must_use]
pub fn auto_expense_id(site_id: Uuid, material: &str) -> String {
    format!("AUTO_MSL_{site_id}_{}", slugify_material(material))
}

/// Formats the distinct contributing supplier names.
///
/// Up to three names are joined with ", "; beyond that the first three are
/// kept and the remainder is collapsed to `+N more`.
#[must_use]
pub fn format_supplier_names(names: &[String]) -> String {
    if names.len() <= SUPPLIER_NAME_LIMIT {
        names.join(", ")
    } else {
        let shown = names[..SUPPLIER_NAME_LIMIT].join(", ");
        let rest = names.len() - SUPPLIER_NAME_LIMIT;
        format!("{shown} +{rest} more")
    }
}

struct Group {
    site_id: Uuid,
    title: String,
    expense_date: NaiveDate,
    amount: Decimal,
    supplier_names: Vec<String>,
}

/// Aggregates purchase rows into one auto expense row per `(site, material)`.
///
/// Material matching is case-insensitive; the first-seen casing is kept for
/// the output title. Supplier names are resolved through `supplier_names`
/// (rows whose supplier is missing from the map still contribute their
/// amount). Output is sorted by expense date descending, id ascending.
#[must_use]
pub fn aggregate_material_expenses(
    rows: &[PurchaseRow],
    supplier_names: &HashMap<Uuid, String>,
) -> Vec<AutoExpense> {
    let mut groups: HashMap<String, Group> = HashMap::new();

    for row in rows {
        let key = format!("{}__{}", row.site_id, row.material.to_lowercase());
        let group = groups.entry(key).or_insert_with(|| Group {
            site_id: row.site_id,
            title: row.material.clone(),
            expense_date: row.entry_date,
            amount: Decimal::ZERO,
            supplier_names: Vec::new(),
        });

        group.amount += row.amount();
        if row.entry_date > group.expense_date {
            group.expense_date = row.entry_date;
        }
        if let Some(name) = supplier_names.get(&row.supplier_id) {
            if !group.supplier_names.iter().any(|n| n == name) {
                group.supplier_names.push(name.clone());
            }
        }
    }

    let mut expenses: Vec<AutoExpense> = groups
        .into_values()
        .map(|group| AutoExpense {
            id: auto_expense_id(group.site_id, &group.title),
            site_id: group.site_id,
            expense_date: group.expense_date,
            title: group.title,
            summary: AUTO_SUMMARY.to_string(),
            payment_details: format_supplier_names(&group.supplier_names),
            amount: group.amount,
        })
        .collect();

    expenses.sort_by(|a, b| {
        b.expense_date
            .cmp(&a.expense_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    expenses
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn site() -> Uuid {
        Uuid::parse_str("5a37d2a2-9f20-4c3e-8a61-000000000001").unwrap()
    }

    fn supplier(n: u8) -> Uuid {
        Uuid::from_u128(u128::from(n))
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(
        site_id: Uuid,
        supplier_id: Uuid,
        entry_date: &str,
        material: &str,
        qty: Decimal,
        rate: Decimal,
        total_amount: Option<Decimal>,
    ) -> PurchaseRow {
        PurchaseRow {
            site_id,
            supplier_id,
            entry_date: date(entry_date),
            material: material.to_string(),
            qty,
            rate,
            total_amount,
        }
    }

    fn names(pairs: &[(u8, &str)]) -> HashMap<Uuid, String> {
        pairs
            .iter()
            .map(|&(n, name)| (supplier(n), name.to_string()))
            .collect()
    }

    #[rstest]
    #[case("Sand", "sand")]
    #[case("Ready Mix Concrete", "ready_mix_concrete")]
    #[case("Steel (12mm)", "steel_12mm")]
    #[case("  --Sand--  ", "sand")]
    #[case("a!!!b", "a_b")]
    #[case("***", "")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify_material(input), expected);
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "x".repeat(80);
        assert_eq!(slugify_material(&long).len(), 50);
    }

    #[test]
    fn test_auto_expense_id_is_stable() {
        let a = auto_expense_id(site(), "River Sand");
        let b = auto_expense_id(site(), "River Sand");
        assert_eq!(a, b);
        assert!(a.starts_with("AUTO_MSL_"));
        assert!(a.ends_with("_river_sand"));
    }

    #[test]
    fn test_format_supplier_names_short_list() {
        let list = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(format_supplier_names(&list), "A, B, C");
    }

    #[test]
    fn test_format_supplier_names_collapses_past_three() {
        let list = vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ];
        assert_eq!(format_supplier_names(&list), "A, B, C +1 more");

        let list: Vec<String> = (0..6).map(|n| format!("S{n}")).collect();
        assert_eq!(format_supplier_names(&list), "S0, S1, S2 +3 more");
    }

    #[test]
    fn test_case_insensitive_grouping_keeps_first_seen_casing() {
        let rows = vec![
            row(site(), supplier(1), "2024-01-10", "Sand", dec!(10), dec!(5), None),
            row(site(), supplier(2), "2024-01-12", "sand", dec!(4), dec!(5), None),
        ];
        let result = aggregate_material_expenses(&rows, &names(&[(1, "A"), (2, "B")]));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Sand");
        assert_eq!(result[0].amount, dec!(70));
        assert_eq!(result[0].payment_details, "A, B");
    }

    #[test]
    fn test_amount_prefers_stored_total() {
        let rows = vec![
            row(site(), supplier(1), "2024-01-10", "Sand", dec!(10), dec!(5), None),
            row(
                site(),
                supplier(1),
                "2024-01-11",
                "Sand",
                dec!(10),
                dec!(5),
                Some(dec!(120)),
            ),
        ];
        let result = aggregate_material_expenses(&rows, &names(&[(1, "A")]));

        // 10 x 5 fallback plus the stored 120, ignoring that row's qty x rate
        assert_eq!(result[0].amount, dec!(170));
    }

    #[test]
    fn test_expense_date_is_group_maximum() {
        let rows = vec![
            row(site(), supplier(1), "2024-01-15", "Sand", dec!(1), dec!(1), None),
            row(site(), supplier(1), "2024-01-10", "Sand", dec!(1), dec!(1), None),
            row(site(), supplier(1), "2024-01-12", "Sand", dec!(1), dec!(1), None),
        ];
        let result = aggregate_material_expenses(&rows, &names(&[(1, "A")]));
        assert_eq!(result[0].expense_date, date("2024-01-15"));
    }

    #[test]
    fn test_sites_do_not_cross_group() {
        let other_site = Uuid::parse_str("5a37d2a2-9f20-4c3e-8a61-000000000002").unwrap();
        let rows = vec![
            row(site(), supplier(1), "2024-01-10", "Sand", dec!(2), dec!(5), None),
            row(other_site, supplier(1), "2024-01-10", "Sand", dec!(3), dec!(5), None),
        ];
        let result = aggregate_material_expenses(&rows, &names(&[(1, "A")]));

        assert_eq!(result.len(), 2);
        let total: Decimal = result.iter().map(|e| e.amount).sum();
        assert_eq!(total, dec!(25));
    }

    #[test]
    fn test_output_sorted_date_desc_then_id() {
        let rows = vec![
            row(site(), supplier(1), "2024-01-10", "Sand", dec!(1), dec!(1), None),
            row(site(), supplier(1), "2024-01-15", "Cement", dec!(1), dec!(1), None),
            row(site(), supplier(1), "2024-01-15", "Bricks", dec!(1), dec!(1), None),
        ];
        let result = aggregate_material_expenses(&rows, &names(&[(1, "A")]));

        assert_eq!(result[0].title, "Bricks");
        assert_eq!(result[1].title, "Cement");
        assert_eq!(result[2].title, "Sand");
    }

    #[test]
    fn test_missing_supplier_name_still_counts_amount() {
        let rows = vec![row(
            site(),
            supplier(9),
            "2024-01-10",
            "Sand",
            dec!(10),
            dec!(5),
            None,
        )];
        let result = aggregate_material_expenses(&rows, &HashMap::new());

        assert_eq!(result[0].amount, dec!(50));
        assert_eq!(result[0].payment_details, "");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let result = aggregate_material_expenses(&[], &HashMap::new());
        assert!(result.is_empty());
    }

    fn material_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,20}"
    }

    fn row_strategy() -> impl Strategy<Value = PurchaseRow> {
        (
            0u8..4,
            0u8..4,
            material_strategy(),
            0i64..100_000,
            0i64..10_000,
            proptest::option::of(0i64..1_000_000),
            0u32..3650,
        )
            .prop_map(|(s, sup, material, qty, rate, total, day_offset)| PurchaseRow {
                site_id: Uuid::from_u128(u128::from(s) + 100),
                supplier_id: supplier(sup),
                entry_date: date("2020-01-01") + chrono::Days::new(u64::from(day_offset)),
                material,
                qty: Decimal::new(qty, 2),
                rate: Decimal::new(rate, 2),
                total_amount: total.map(|t| Decimal::new(t, 2)),
            })
    }

    proptest! {
        /// Same snapshot in, same rows out: ids, amounts, and ordering.
        #[test]
        fn prop_aggregation_is_idempotent(rows in proptest::collection::vec(row_strategy(), 0..40)) {
            let names = names(&[(0, "A"), (1, "B"), (2, "C"), (3, "D")]);
            let first = aggregate_material_expenses(&rows, &names);
            let second = aggregate_material_expenses(&rows, &names);
            prop_assert_eq!(first, second);
        }

        /// The sum over groups equals the sum over input rows.
        #[test]
        fn prop_amounts_are_conserved(rows in proptest::collection::vec(row_strategy(), 0..40)) {
            let names = HashMap::new();
            let result = aggregate_material_expenses(&rows, &names);

            let input_total: Decimal = rows.iter().map(PurchaseRow::amount).sum();
            let output_total: Decimal = result.iter().map(|e| e.amount).sum();
            prop_assert_eq!(input_total, output_total);
        }

        /// Group ids are unique within one projection.
        #[test]
        fn prop_ids_are_unique(rows in proptest::collection::vec(row_strategy(), 0..40)) {
            let result = aggregate_material_expenses(&rows, &HashMap::new());
            let mut ids: Vec<&str> = result.iter().map(|e| e.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), result.len());
        }

        /// Slugs never exceed the length cap and contain no separators at the edges.
        #[test]
        fn prop_slug_shape(material in "\\PC{0,80}") {
            let slug = slugify_material(&material);
            prop_assert!(slug.chars().count() <= 50);
            prop_assert!(!slug.starts_with('_'));
            prop_assert!(!slug.contains("__"));
        }
    }
}
