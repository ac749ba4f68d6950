use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::layout::{Field, SheetLayout};
use crate::models::record::{Category, HeaderRow, Record, RecordSet, StoredRecord, TradeType};
use crate::sheets::traits::SheetClient;

/// Turns raw sheet rows into a typed `RecordSet`.
///
/// Row parsing never fails on cell contents: bad prices become 0, unknown
/// categories become `Other`, a missing trade type becomes `Sell`. Only a
/// header without the required columns, with data rows below it, is an error.
pub struct RecordStore;

impl RecordStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the whole worksheet and parse it.
    pub async fn load(&self, client: &dyn SheetClient) -> Result<RecordSet, CoreError> {
        let rows = client.read_all().await?;
        let set = self.parse_rows(&rows)?;
        log::debug!("loaded {} record(s) from {}", set.len(), client.name());
        Ok(set)
    }

    /// Parse rows as returned by `SheetClient::read_all` (header first).
    pub fn parse_rows(&self, rows: &[Vec<String>]) -> Result<RecordSet, CoreError> {
        let Some((header, data)) = rows.split_first() else {
            return Ok(RecordSet::default());
        };
        let layout = match SheetLayout::from_header(header) {
            Ok(layout) => layout,
            Err(_) if data.is_empty() => {
                log::warn!("row 1 is not a ledger header and the sheet has no data, treating it as empty");
                return Ok(RecordSet {
                    header: HeaderRow::Foreign,
                    ..RecordSet::default()
                });
            }
            Err(e) => return Err(e),
        };
        if !layout.has_trade_type() && !data.is_empty() {
            log::debug!("sheet has no trade type column, defaulting {} row(s) to sell", data.len());
        }

        let records = data
            .iter()
            .enumerate()
            .map(|(idx, row)| StoredRecord {
                row_id: idx as u32 + 2,
                key: layout
                    .cell(row, Field::Key)
                    .and_then(|k| Uuid::parse_str(k.trim()).ok()),
                record: Self::parse_record(&layout, row, idx as u32 + 2),
            })
            .collect();

        Ok(RecordSet {
            layout,
            header: HeaderRow::Recognized,
            records,
        })
    }

    fn parse_record(layout: &SheetLayout, row: &[String], row_id: u32) -> Record {
        let text = |field| layout.cell(row, field).unwrap_or("").to_string();

        let category_cell = text(Field::Category);
        let category = Category::parse(&category_cell).unwrap_or_else(|| {
            log::warn!("row {row_id}: unknown category '{category_cell}', using Other");
            Category::Other
        });

        Record {
            country: text(Field::Country),
            category,
            trade_type: layout
                .cell(row, Field::TradeType)
                .map(TradeType::from_cell)
                .unwrap_or_default(),
            item_name: text(Field::ItemName),
            price: parse_price(&text(Field::Price)),
            note: text(Field::Note),
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lenient price coercion: integers as is, non-negative decimals truncated,
/// anything else (empty, text, negative) is 0.
pub fn parse_price(cell: &str) -> u64 {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value.trunc() as u64,
        _ => 0,
    }
}
