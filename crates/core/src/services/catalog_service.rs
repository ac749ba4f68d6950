use std::collections::BTreeSet;

use crate::models::record::{Category, RecordSet};

/// Derives the choice lists (countries, items, categories) from loaded records.
///
/// Pure functions of their inputs: call them again after every reload or
/// selection change instead of keeping derived state around.
pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        Self
    }

    /// Distinct country names, sorted.
    pub fn distinct_countries(&self, records: &RecordSet) -> BTreeSet<String> {
        records
            .iter()
            .map(|r| r.record.country.clone())
            .collect()
    }

    /// Distinct item names, sorted. With a category, only items recorded
    /// under that category are listed.
    pub fn distinct_items(
        &self,
        records: &RecordSet,
        category: Option<Category>,
    ) -> BTreeSet<String> {
        records
            .iter()
            .filter(|r| category.map_or(true, |c| r.record.category == c))
            .map(|r| r.record.item_name.clone())
            .collect()
    }

    /// The fixed category list, in display order.
    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
