//! # Filter Engine
//!
//! Pure functions of the current dropdown selections over the loaded tables.
//! The map, the export and the company dropdown all go through this module,
//! so they cannot disagree about which rows a selection covers.
//!
//! ## Table of Contents
//! 1. Selection - Dropdown state
//! 2. FilteredView - Transient subsets
//! 3. Filtering
//! 4. Dropdown options

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::loader::DataContext;
use crate::records::{AssetRiskRecord, SupplyShedRecord};
use crate::risk::RiskCategory;

/// Sentinel dropdown value meaning "every company" (or "every municipality")
pub const ALL: &str = "all";
/// Label shown for the company sentinel
pub const ALL_COMPANIES_LABEL: &str = "All Companies";

// ============================================================================
// 1. Selection - Dropdown state
// ============================================================================

/// Current values of the two multi-select dropdowns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected destination municipalities; empty means all of them
    #[serde(default)]
    pub municipalities: Vec<String>,
    /// Selected destination companies, possibly containing [`ALL`]
    #[serde(default)]
    pub companies: Vec<String>,
}

impl Selection {
    pub fn new(municipalities: Vec<String>, companies: Vec<String>) -> Self {
        Self {
            municipalities,
            companies,
        }
    }

    /// Municipalities to keep, or `None` when the selection is empty.
    ///
    /// The list is taken literally: an `"all"` entry matches no municipality
    /// here and only widens the company options.
    pub fn municipality_filter(&self) -> Option<HashSet<&str>> {
        if self.municipalities.is_empty() {
            None
        } else {
            Some(self.municipalities.iter().map(String::as_str).collect())
        }
    }

    /// The single company to keep, or `None` when company filtering is skipped.
    ///
    /// Filtering is skipped when the selection is empty, contains the
    /// sentinel, or names more than one company. Two specific companies are
    /// therefore treated exactly like "All Companies".
    pub fn company_filter(&self) -> Option<&str> {
        match self.companies.as_slice() {
            [company] if company != ALL => Some(company.as_str()),
            _ => None,
        }
    }
}

fn company_option_filter(municipalities: &[String]) -> Option<HashSet<&str>> {
    if municipalities.is_empty() || municipalities.iter().any(|m| m == ALL) {
        None
    } else {
        Some(municipalities.iter().map(String::as_str).collect())
    }
}

// ============================================================================
// 2. FilteredView - Transient subsets
// ============================================================================

/// Rows of both tables matching one selection, borrowed from the context
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    pub supply_shed: Vec<&'a SupplyShedRecord>,
    pub asset_risk: Vec<&'a AssetRiskRecord>,
}

impl<'a> FilteredView<'a> {
    /// Distinct destination companies across the supply-shed subset
    pub fn supply_shed_companies(&self) -> HashSet<&'a str> {
        self.supply_shed
            .iter()
            .map(|r| r.destination_company.as_str())
            .collect()
    }

    /// Row count per risk category of the supply-shed subset, in legend order
    pub fn supply_shed_risk_counts(&self) -> [(RiskCategory, usize); 2] {
        RiskCategory::ALL.map(|category| {
            let n = self.supply_shed.iter().filter(|r| r.risk_score == category).count();
            (category, n)
        })
    }

    /// Row count per risk category of the asset subset, in legend order
    pub fn asset_risk_counts(&self) -> [(RiskCategory, usize); 2] {
        RiskCategory::ALL.map(|category| {
            let n = self.asset_risk.iter().filter(|r| r.asset_risk == category).count();
            (category, n)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.supply_shed.is_empty() && self.asset_risk.is_empty()
    }
}

// ============================================================================
// 3. Filtering
// ============================================================================

/// Narrow both tables to the selected destination municipalities and company.
///
/// Shared by the map and the export. Never touches the context.
pub fn filter_by_municipality_and_company<'a>(
    ctx: &'a DataContext,
    selection: &Selection,
) -> FilteredView<'a> {
    let municipalities = selection.municipality_filter();
    let company = selection.company_filter();

    let keep = |municipality: &str, row_company: &str| {
        municipalities
            .as_ref()
            .map_or(true, |set| set.contains(municipality))
            && company.map_or(true, |c| c == row_company)
    };

    let view = FilteredView {
        supply_shed: ctx
            .supply_shed()
            .iter()
            .filter(|r| keep(r.destination_municipality.as_str(), r.destination_company.as_str()))
            .collect(),
        asset_risk: ctx
            .asset_risk()
            .iter()
            .filter(|r| keep(r.destination_municipality.as_str(), r.destination_company.as_str()))
            .collect(),
    };

    tracing::debug!(
        municipalities = selection.municipalities.len(),
        company = company.unwrap_or(ALL),
        supply_shed = view.supply_shed.len(),
        asset_risk = view.asset_risk.len(),
        "Filtered risk tables"
    );

    view
}

// ============================================================================
// 4. Dropdown options
// ============================================================================

/// One dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    fn same(value: &str) -> Self {
        Self {
            label: value.to_string(),
            value: value.to_string(),
        }
    }
}

/// Options of a dropdown together with its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownState {
    pub options: Vec<DropdownOption>,
    pub value: Vec<String>,
}

/// Recompute the company dropdown for a municipality selection.
///
/// Options are the sentinel followed by every destination company serving
/// the selected municipalities, in table order. The value resets to the
/// sentinel when more than one company is available and to the empty
/// selection otherwise. Callers must apply this before redrawing the map.
pub fn derive_company_options(ctx: &DataContext, municipalities: &[String]) -> DropdownState {
    let filter = company_option_filter(municipalities);
    let companies = distinct_in_order(
        ctx.supply_shed()
            .iter()
            .filter(|r| {
                filter
                    .as_ref()
                    .map_or(true, |set| set.contains(r.destination_municipality.as_str()))
            })
            .map(|r| r.destination_company.as_str()),
    );

    let value = if companies.len() > 1 {
        vec![ALL.to_string()]
    } else {
        Vec::new()
    };

    let mut options = Vec::with_capacity(companies.len() + 1);
    options.push(DropdownOption {
        label: ALL_COMPANIES_LABEL.to_string(),
        value: ALL.to_string(),
    });
    options.extend(companies.into_iter().map(DropdownOption::same));

    DropdownState { options, value }
}

/// The municipality dropdown: every destination municipality of the
/// supply-shed table, preselecting `defaults`.
pub fn municipality_options(ctx: &DataContext, defaults: &[String]) -> DropdownState {
    let options = distinct_in_order(
        ctx.supply_shed()
            .iter()
            .map(|r| r.destination_municipality.as_str()),
    )
    .into_iter()
    .map(DropdownOption::same)
    .collect();

    DropdownState {
        options,
        value: defaults.to_vec(),
    }
}

fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{context, strings};

    fn company_values(state: &DropdownState) -> Vec<&str> {
        state.options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn test_rows_match_requested_municipalities() {
        let ctx = context();
        let selection = Selection::new(strings(&["UBERLANDIA", "SORRISO"]), strings(&[ALL]));
        let view = filter_by_municipality_and_company(&ctx, &selection);

        assert_eq!(view.supply_shed.len(), 5);
        assert_eq!(view.asset_risk.len(), 3);
        assert!(view
            .supply_shed
            .iter()
            .all(|r| ["UBERLANDIA", "SORRISO"].contains(&r.destination_municipality.as_str())));
        assert!(view
            .asset_risk
            .iter()
            .all(|r| ["UBERLANDIA", "SORRISO"].contains(&r.destination_municipality.as_str())));
    }

    #[test]
    fn test_empty_municipalities_select_everything() {
        let ctx = context();
        let everything = Selection::new(
            strings(&["UBERLANDIA", "RIO VERDE", "SORRISO"]),
            strings(&[ALL]),
        );
        let nothing = Selection::new(Vec::new(), strings(&[ALL]));

        let all_view = filter_by_municipality_and_company(&ctx, &everything);
        let empty_view = filter_by_municipality_and_company(&ctx, &nothing);

        assert_eq!(empty_view.supply_shed.len(), ctx.supply_shed().len());
        assert_eq!(empty_view.asset_risk.len(), ctx.asset_risk().len());
        let rows = |v: &FilteredView| v.supply_shed.iter().map(|r| r.row).collect::<Vec<_>>();
        assert_eq!(rows(&all_view), rows(&empty_view));
    }

    #[test]
    fn test_single_company_narrows_both_tables() {
        let ctx = context();
        let selection = Selection::new(strings(&["UBERLANDIA"]), strings(&["ADM"]));
        let view = filter_by_municipality_and_company(&ctx, &selection);

        assert_eq!(view.supply_shed.len(), 1);
        assert_eq!(view.asset_risk.len(), 1);
        assert!(view.supply_shed.iter().all(|r| r.destination_company == "ADM"));
        assert!(view.asset_risk.iter().all(|r| r.destination_company == "ADM"));
    }

    #[test]
    fn test_company_selection_does_not_change_options() {
        let ctx = context();
        let municipalities = strings(&["UBERLANDIA"]);
        let before = derive_company_options(&ctx, &municipalities);
        let _ = filter_by_municipality_and_company(
            &ctx,
            &Selection::new(municipalities.clone(), strings(&["ADM"])),
        );
        assert_eq!(derive_company_options(&ctx, &municipalities), before);
    }

    #[test]
    fn test_two_specific_companies_skip_company_filter() {
        let ctx = context();
        let two = Selection::new(strings(&["UBERLANDIA"]), strings(&["ADM", "CARGILL"]));
        let all = Selection::new(strings(&["UBERLANDIA"]), strings(&[ALL]));
        let sentinel_and_one = Selection::new(strings(&["UBERLANDIA"]), strings(&[ALL, "ADM"]));

        assert_eq!(two.company_filter(), None);
        assert_eq!(sentinel_and_one.company_filter(), None);
        assert_eq!(
            filter_by_municipality_and_company(&ctx, &two).supply_shed.len(),
            filter_by_municipality_and_company(&ctx, &all).supply_shed.len()
        );
    }

    #[test]
    fn test_sentinel_in_municipalities_is_literal_for_rows() {
        let ctx = context();
        let selection = Selection::new(strings(&[ALL, "UBERLANDIA"]), strings(&[ALL]));
        let view = filter_by_municipality_and_company(&ctx, &selection);

        assert_eq!(view.supply_shed.len(), 3);
        assert_eq!(view.asset_risk.len(), 2);
        assert!(view
            .supply_shed
            .iter()
            .all(|r| r.destination_municipality == "UBERLANDIA"));
        assert!(view
            .asset_risk
            .iter()
            .all(|r| r.destination_municipality == "UBERLANDIA"));

        // The company dropdown still widens to every company
        let options = derive_company_options(&ctx, &selection.municipalities);
        assert_eq!(options.options.len(), 5);
    }

    #[test]
    fn test_unknown_company_gives_empty_view() {
        let ctx = context();
        let selection = Selection::new(strings(&["UBERLANDIA"]), strings(&["BUNGE"]));
        assert!(filter_by_municipality_and_company(&ctx, &selection).is_empty());
    }

    #[test]
    fn test_company_options_for_municipality() {
        let ctx = context();
        let state = derive_company_options(&ctx, &strings(&["UBERLANDIA"]));

        assert_eq!(company_values(&state), vec![ALL, "CARGILL", "ADM"]);
        assert_eq!(state.options[0].label, ALL_COMPANIES_LABEL);
        assert_eq!(state.value, vec![ALL]);
    }

    #[test]
    fn test_single_company_has_no_default() {
        let ctx = context();
        let state = derive_company_options(&ctx, &strings(&["SORRISO"]));

        assert_eq!(company_values(&state), vec![ALL, "AMAGGI"]);
        assert!(state.value.is_empty());
    }

    #[test]
    fn test_company_options_idempotent_and_cover_all() {
        let ctx = context();
        let first = derive_company_options(&ctx, &[]);
        let second = derive_company_options(&ctx, &[]);
        assert_eq!(first, second);
        assert_eq!(company_values(&first), vec![ALL, "CARGILL", "ADM", "BUNGE", "AMAGGI"]);
        assert_eq!(derive_company_options(&ctx, &strings(&[ALL])), first);
    }

    #[test]
    fn test_municipality_options_in_table_order() {
        let ctx = context();
        let state = municipality_options(&ctx, &strings(&["UBERLANDIA"]));

        let values: Vec<&str> = state.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["UBERLANDIA", "RIO VERDE", "SORRISO"]);
        assert_eq!(state.value, vec!["UBERLANDIA"]);
    }

    #[test]
    fn test_risk_counts() {
        let ctx = context();
        let view = filter_by_municipality_and_company(&ctx, &Selection::default());
        assert_eq!(
            view.supply_shed_risk_counts(),
            [(RiskCategory::Negligible, 4), (RiskCategory::AtRisk, 3)]
        );
        assert_eq!(
            view.asset_risk_counts(),
            [(RiskCategory::Negligible, 2), (RiskCategory::AtRisk, 3)]
        );
    }
}
