use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record::{Category, Record, TradeType};

/// Display filter for the record list. The default filter matches everything.
///
/// Constraints combine with AND:
/// - `trade_type`: exact match when set
/// - `categories`: membership when non-empty
/// - `text`: case-sensitive substring of the item name when non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub trade_type: Option<TradeType>,
    #[serde(default)]
    pub categories: BTreeSet<Category>,
    #[serde(default)]
    pub text: String,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade_type(mut self, trade_type: TradeType) -> Self {
        self.trade_type = Some(trade_type);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.trade_type.is_none() && self.categories.is_empty() && self.text.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(trade_type) = self.trade_type {
            if record.trade_type != trade_type {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&record.category) {
            return false;
        }
        self.text.is_empty() || record.item_name.contains(self.text.as_str())
    }
}
