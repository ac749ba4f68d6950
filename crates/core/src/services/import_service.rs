use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::models::record::{Category, Record, TradeType};
use crate::models::settings::Settings;

/// Converts a bulk price list into records.
///
/// Input shape (JSON):
///
/// ```json
/// { "Alba": { "Ores": { "Iron (buy)": 5, "Gold": 20 } } }
/// ```
///
/// i.e. country → category → item label → price. A label ending in the buy
/// or sell marker gets that trade type and loses the marker; unmarked labels
/// are sell prices. Records come out in document order.
///
/// The whole document is validated before anything is returned, so a bad
/// entry anywhere means no records at all.
pub struct ImportService {
    sell_marker: String,
    buy_marker: String,
    note: String,
}

impl ImportService {
    pub fn new(
        sell_marker: impl Into<String>,
        buy_marker: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            sell_marker: sell_marker.into().trim().to_string(),
            buy_marker: buy_marker.into().trim().to_string(),
            note: note.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.sell_marker,
            &settings.buy_marker,
            &settings.import_note,
        )
    }

    /// Parse an import document.
    pub fn parse_str(&self, text: &str) -> Result<Vec<Record>, CoreError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CoreError::ImportFormat(format!("not valid JSON: {e}")))?;
        self.parse_value(&value)
    }

    /// Parse an already-decoded import document.
    pub fn parse_value(&self, value: &Value) -> Result<Vec<Record>, CoreError> {
        let countries = as_object(value, "the document", "countries")?;
        let mut records = Vec::new();

        for (country, categories) in countries {
            let country_name = country.trim();
            if country_name.is_empty() {
                return Err(CoreError::ImportFormat("empty country name".into()));
            }
            let categories = as_object(categories, country, "categories")?;

            for (category_label, items) in categories {
                let path = format!("{country} / {category_label}");
                let category = Category::parse(category_label).ok_or_else(|| {
                    CoreError::ImportFormat(format!("{path}: unknown category"))
                })?;
                let items = as_object(items, &path, "items")?;

                for (label, price) in items {
                    let item_path = format!("{path} / {label}");
                    let (item_name, trade_type) = self.split_label(label);
                    if item_name.is_empty() {
                        return Err(CoreError::ImportFormat(format!(
                            "{item_path}: empty item name"
                        )));
                    }
                    let price = parse_import_price(price, &item_path)?;

                    records.push(Record {
                        country: country_name.to_string(),
                        category,
                        trade_type,
                        item_name,
                        price,
                        note: self.note.clone(),
                    });
                }
            }
        }

        log::debug!("parsed {} record(s) from import document", records.len());
        Ok(records)
    }

    /// Split an item label into the bare item name and its trade type.
    ///
    /// The longer marker is tried first so that a marker which happens to
    /// end with the other one still wins.
    pub fn split_label(&self, label: &str) -> (String, TradeType) {
        let trimmed = label.trim_end();
        let mut markers = [
            (self.sell_marker.as_str(), TradeType::Sell),
            (self.buy_marker.as_str(), TradeType::Buy),
        ];
        markers.sort_by_key(|(marker, _)| std::cmp::Reverse(marker.len()));

        for (marker, trade_type) in markers {
            if marker.is_empty() {
                continue;
            }
            if let Some(name) = trimmed.strip_suffix(marker) {
                return (name.trim().to_string(), trade_type);
            }
        }
        (trimmed.trim().to_string(), TradeType::Sell)
    }
}

impl Default for ImportService {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

fn as_object<'a>(
    value: &'a Value,
    at: &str,
    expected: &str,
) -> Result<&'a Map<String, Value>, CoreError> {
    value.as_object().ok_or_else(|| {
        CoreError::ImportFormat(format!(
            "{at}: expected an object of {expected}, found {}",
            kind(value)
        ))
    })
}

fn parse_import_price(value: &Value, path: &str) -> Result<u64, CoreError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CoreError::ImportFormat(format!(
            "{path}: price must be a non-negative integer, found {value}"
        ))
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
