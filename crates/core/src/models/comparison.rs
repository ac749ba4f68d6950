use serde::{Deserialize, Serialize};

use super::record::{StoredRecord, TradeType};

/// One bar of the price comparison chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub country: String,
    pub trade_type: TradeType,
    pub price: u64,
}

/// Every observation of a single item, cheapest first.
///
/// `entries` holds both sides; `sell` and `buy` are the same records split by
/// trade type, each keeping the ascending price order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub item_name: String,
    pub entries: Vec<StoredRecord>,
    pub sell: Vec<StoredRecord>,
    pub buy: Vec<StoredRecord>,
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bars for charting, in the same order as `entries`.
    pub fn price_bars(&self) -> Vec<PriceBar> {
        self.entries
            .iter()
            .map(|e| PriceBar {
                country: e.record.country.clone(),
                trade_type: e.record.trade_type,
                price: e.record.price,
            })
            .collect()
    }

    /// Lowest-priced observation on the given side.
    pub fn cheapest(&self, trade_type: TradeType) -> Option<&StoredRecord> {
        match trade_type {
            TradeType::Sell => self.sell.first(),
            TradeType::Buy => self.buy.first(),
        }
    }

    /// Highest-priced observation on the given side.
    pub fn dearest(&self, trade_type: TradeType) -> Option<&StoredRecord> {
        match trade_type {
            TradeType::Sell => self.sell.last(),
            TradeType::Buy => self.buy.last(),
        }
    }
}
