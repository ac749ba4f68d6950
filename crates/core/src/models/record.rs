use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::layout::SheetLayout;

/// Whether an observed price is what a country sells an item for, or what it
/// pays to buy one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    /// Default for rows written before the trade type column existed.
    #[default]
    Sell,
    Buy,
}

impl TradeType {
    /// Lenient parse used when reading cells. Unknown or empty text is `Sell`.
    pub fn from_cell(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "buy" | "買取" => TradeType::Buy,
            _ => TradeType::Sell,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Sell => "sell",
            TradeType::Buy => "buy",
        }
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of item categories a record can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BuildingBlocks,
    PlantsFood,
    OresIngots,
    MobDrops,
    EnchantmentsGear,
    Potions,
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 7] = [
        Category::BuildingBlocks,
        Category::PlantsFood,
        Category::OresIngots,
        Category::MobDrops,
        Category::EnchantmentsGear,
        Category::Potions,
        Category::Other,
    ];

    /// Label written to the sheet and shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Category::BuildingBlocks => "Building Blocks",
            Category::PlantsFood => "Plants & Food",
            Category::OresIngots => "Ores & Ingots",
            Category::MobDrops => "Mob Drops",
            Category::EnchantmentsGear => "Enchantments & Gear",
            Category::Potions => "Potions",
            Category::Other => "Other",
        }
    }

    /// Resolve a label as found in the sheet or an import file.
    ///
    /// Accepts the display label, the snake_case key, a few short forms
    /// ("ores", "blocks", "gear", ...) and the labels used by older sheets.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        let category = match normalized.as_str() {
            "building blocks" | "building_blocks" | "blocks" | "建築ブロック" => {
                Category::BuildingBlocks
            }
            "plants & food" | "plants_food" | "plants" | "food" | "植物・食料" => {
                Category::PlantsFood
            }
            "ores & ingots" | "ores_ingots" | "ores" | "ingots" | "鉱石・インゴット" => {
                Category::OresIngots
            }
            "mob drops" | "mob_drops" | "drops" | "モブドロップ" => Category::MobDrops,
            "enchantments & gear" | "enchantments_gear" | "enchantments" | "gear"
            | "equipment" | "エンチャント/装備" => Category::EnchantmentsGear,
            "potions" | "potion" | "ポーション" => Category::Potions,
            "other" | "その他" => Category::Other,
            _ => return None,
        };
        Some(category)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One trade-price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    pub category: Category,
    #[serde(default)]
    pub trade_type: TradeType,
    pub item_name: String,
    /// Unit price in the in-game currency.
    pub price: u64,
    #[serde(default)]
    pub note: String,
}

impl Record {
    pub fn new(
        country: impl Into<String>,
        category: Category,
        trade_type: TradeType,
        item_name: impl Into<String>,
        price: u64,
    ) -> Self {
        Self {
            country: country.into(),
            category,
            trade_type,
            item_name: item_name.into(),
            price,
            note: String::new(),
        }
    }

    /// Builder-style note setter.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Convenience constructors for the two trade sides
    pub fn sell(
        country: impl Into<String>,
        category: Category,
        item_name: impl Into<String>,
        price: u64,
    ) -> Self {
        Self::new(country, category, TradeType::Sell, item_name, price)
    }

    pub fn buy(
        country: impl Into<String>,
        category: Category,
        item_name: impl Into<String>,
        price: u64,
    ) -> Self {
        Self::new(country, category, TradeType::Buy, item_name, price)
    }
}

/// A record as it currently sits in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Physical sheet row (header is row 1). Shifts when earlier rows are deleted.
    pub row_id: u32,

    /// Stable key from the `id` column, if the sheet has one and the cell is filled.
    pub key: Option<Uuid>,

    pub record: Record,
}

impl StoredRecord {
    /// Single-line label used by selection lists, e.g. `[Alba] Iron (buy) - 5G`.
    pub fn display_label(&self) -> String {
        let r = &self.record;
        format!(
            "[{}] {} ({}) - {}G",
            r.country, r.item_name, r.trade_type, r.price
        )
    }
}

/// State of row 1 as found when the sheet was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRow {
    /// The sheet had no rows at all.
    Missing,
    /// A ledger header the layout was read from.
    Recognized,
    /// Row 1 holds something else and no data follows; it is replaced by
    /// the canonical header on the first write.
    Foreign,
}

/// All records of a sheet in row order, together with the layout they were
/// read with (needed to write rows back in the same column order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub layout: SheetLayout,
    pub header: HeaderRow,
    pub records: Vec<StoredRecord>,
}

impl Default for RecordSet {
    fn default() -> Self {
        Self {
            layout: SheetLayout::canonical(),
            header: HeaderRow::Missing,
            records: Vec::new(),
        }
    }
}

impl RecordSet {
    /// A sheet holding only its header row.
    pub fn empty(layout: SheetLayout) -> Self {
        Self {
            layout,
            header: HeaderRow::Recognized,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredRecord> {
        self.records.iter()
    }

    /// Row number the next appended record will land on.
    pub fn next_row_id(&self) -> u32 {
        self.records.len() as u32 + 2
    }

    /// True when `row_id` addresses one of the loaded data rows.
    pub fn contains_row(&self, row_id: u32) -> bool {
        row_id >= 2 && row_id < self.next_row_id()
    }

    pub fn get_by_row(&self, row_id: u32) -> Option<&StoredRecord> {
        if !self.contains_row(row_id) {
            return None;
        }
        self.records.get((row_id - 2) as usize)
    }

    pub fn find_by_key(&self, key: Uuid) -> Option<&StoredRecord> {
        self.records.iter().find(|r| r.key == Some(key))
    }

    pub fn last(&self) -> Option<&StoredRecord> {
        self.records.last()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a StoredRecord;
    type IntoIter = std::slice::Iter<'a, StoredRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
