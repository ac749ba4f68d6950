use crate::models::comparison::Comparison;
use crate::models::filter::RecordFilter;
use crate::models::record::{RecordSet, StoredRecord, TradeType};

/// Filtering and price comparison over a loaded `RecordSet`.
///
/// Pure business logic, no I/O. Results keep the original row ids so a
/// filtered row can still be edited or deleted.
pub struct QueryService;

impl QueryService {
    pub fn new() -> Self {
        Self
    }

    /// Records matching every constraint of `filter`, in sheet order.
    /// Trade type is checked first, then category, then the item text.
    pub fn filter(&self, records: &RecordSet, filter: &RecordFilter) -> RecordSet {
        let matched: Vec<_> = records
            .iter()
            .filter(|r| filter.matches(&r.record))
            .cloned()
            .collect();
        log::debug!("filter kept {} of {} record(s)", matched.len(), records.len());
        RecordSet {
            layout: records.layout.clone(),
            header: records.header,
            records: matched,
        }
    }

    /// All observations of exactly `item_name`, cheapest first.
    ///
    /// The sort is stable: records with the same price stay in sheet order.
    pub fn compare(&self, records: &RecordSet, item_name: &str) -> Comparison {
        let mut entries: Vec<_> = records
            .iter()
            .filter(|r| r.record.item_name == item_name)
            .cloned()
            .collect();
        entries.sort_by_key(|r| r.record.price);

        let (sell, buy): (Vec<StoredRecord>, Vec<StoredRecord>) = entries
            .iter()
            .cloned()
            .partition(|r| r.record.trade_type == TradeType::Sell);

        Comparison {
            item_name: item_name.to_string(),
            entries,
            sell,
            buy,
        }
    }
}

impl Default for QueryService {
    fn default() -> Self {
        Self::new()
    }
}
