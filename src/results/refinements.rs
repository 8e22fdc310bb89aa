//! Facet refinements of a results panel

use crate::backend::{FacetFilter, SearchParams};
use crate::error::{Error, Result};

/// Prefix of the hierarchical category attributes
pub const CATEGORY_PREFIX: &str = "hierarchicalCategories.";

/// Attributes a panel can be refined on
pub const REFINABLE_ATTRIBUTES: [&str; 5] = [
    "brand",
    "hierarchicalCategories.lvl0",
    "hierarchicalCategories.lvl1",
    "hierarchicalCategories.lvl2",
    "hierarchicalCategories.lvl3",
];

/// An active refinement as listed above the hits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRefinement {
    pub attribute: String,
    pub label: String,
    pub value: String,
}

/// Active facet values, in the order they were refined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refinements {
    filters: Vec<FacetFilter>,
}

impl Refinements {
    /// Add `value` on `attribute`, or remove it when already active.
    ///
    /// Returns whether the value is active afterwards.
    pub fn toggle(&mut self, attribute: &str, value: &str) -> Result<bool> {
        if !REFINABLE_ATTRIBUTES.contains(&attribute) {
            return Err(Error::InvalidParams(format!(
                "'{}' is not a refinable attribute",
                attribute
            )));
        }
        if value.trim().is_empty() {
            return Err(Error::InvalidParams(format!(
                "empty refinement value for '{}'",
                attribute
            )));
        }

        let filter = FacetFilter::new(attribute, value);
        if let Some(pos) = self.filters.iter().position(|f| *f == filter) {
            self.filters.remove(pos);
            Ok(false)
        } else {
            self.filters.push(filter);
            Ok(true)
        }
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply the active values to `params`
    pub fn apply_to(&self, params: SearchParams) -> SearchParams {
        self.filters
            .iter()
            .cloned()
            .fold(params, SearchParams::with_facet_filter)
    }

    /// Active values with their display label
    pub fn current(&self) -> Vec<CurrentRefinement> {
        self.filters
            .iter()
            .map(|f| CurrentRefinement {
                attribute: f.attribute.clone(),
                label: label_for(&f.attribute),
                value: f.value.clone(),
            })
            .collect()
    }
}

fn label_for(attribute: &str) -> String {
    if attribute.starts_with(CATEGORY_PREFIX) {
        return "Category".to_string();
    }
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
