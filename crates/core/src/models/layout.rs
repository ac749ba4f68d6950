use uuid::Uuid;

use crate::errors::CoreError;

use super::record::Record;

/// A record field a sheet column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Country,
    Category,
    TradeType,
    ItemName,
    Price,
    Note,
    /// Stable record key (UUID). Never overwritten by updates.
    Key,
}

impl Field {
    /// Header label written for new sheets.
    pub fn canonical_label(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Category => "category",
            Field::TradeType => "trade_type",
            Field::ItemName => "item_name",
            Field::Price => "price",
            Field::Note => "note",
            Field::Key => "id",
        }
    }

    /// Match a header cell. Case, surrounding whitespace, and the choice of
    /// space/underscore/hyphen separators are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        let field = match normalized.as_str() {
            "country" | "国名" => Field::Country,
            "category" | "カテゴリ" => Field::Category,
            "trade_type" | "type" | "取引種別" => Field::TradeType,
            "item_name" | "item" | "アイテム名" => Field::ItemName,
            "price" | "価格" => Field::Price,
            "note" | "notes" | "備考" => Field::Note,
            "id" | "key" => Field::Key,
            _ => return None,
        };
        Some(field)
    }

    fn is_data(&self) -> bool {
        !matches!(self, Field::Key)
    }
}

/// Column order of the current layout, A through G.
const CANONICAL_FIELDS: [Field; 7] = [
    Field::Country,
    Field::Category,
    Field::TradeType,
    Field::ItemName,
    Field::Price,
    Field::Note,
    Field::Key,
];

const REQUIRED_FIELDS: [Field; 4] = [Field::Country, Field::Category, Field::ItemName, Field::Price];

/// Mapping between sheet columns and record fields, derived from the header row.
///
/// Reading goes through header labels, so column order in the sheet does not
/// matter. Writing emits cells in the sheet's own column order; columns with
/// no field stay untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    header: Vec<String>,
    columns: Vec<Option<Field>>,
}

impl SheetLayout {
    /// The layout written to a brand new sheet.
    pub fn canonical() -> Self {
        Self {
            header: CANONICAL_FIELDS
                .iter()
                .map(|f| f.canonical_label().to_string())
                .collect(),
            columns: CANONICAL_FIELDS.iter().copied().map(Some).collect(),
        }
    }

    /// Build a layout from the sheet's header row.
    ///
    /// Unknown labels are kept as unmapped columns. If a label appears twice,
    /// the leftmost column wins.
    pub fn from_header(header: &[String]) -> Result<Self, CoreError> {
        let mut columns: Vec<Option<Field>> = Vec::with_capacity(header.len());
        for label in header {
            let field = Field::from_label(label).filter(|f| !columns.contains(&Some(*f)));
            columns.push(field);
        }

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .filter(|f| !columns.contains(&Some(**f)))
            .map(|f| f.canonical_label())
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::Layout(format!(
                "header is missing column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            header: header.to_vec(),
            columns,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.columns.iter().position(|c| *c == Some(field))
    }

    /// False for the legacy five-column layout.
    pub fn has_trade_type(&self) -> bool {
        self.index_of(Field::TradeType).is_some()
    }

    pub fn has_key(&self) -> bool {
        self.index_of(Field::Key).is_some()
    }

    /// The layout after inserting a trade type column right after the
    /// category column, and the zero-based index of the new column.
    /// Japanese headers get the Japanese label.
    pub fn with_trade_type(&self) -> (usize, Self) {
        let column = self.index_of(Field::Category).map_or(0, |idx| idx + 1);
        let japanese = self.header.iter().any(|label| label.trim() == "カテゴリ");
        let label = if japanese {
            "取引種別"
        } else {
            Field::TradeType.canonical_label()
        };

        let mut upgraded = self.clone();
        upgraded.header.insert(column, label.to_string());
        upgraded.columns.insert(column, Some(Field::TradeType));
        (column, upgraded)
    }

    /// Cell text for `field` in `row`, or `None` if the sheet has no such column.
    /// Short rows read as empty cells.
    pub fn cell<'a>(&self, row: &'a [String], field: Field) -> Option<&'a str> {
        let idx = self.index_of(field)?;
        Some(row.get(idx).map(String::as_str).unwrap_or(""))
    }

    /// Full row for an append, one cell per header column.
    pub fn to_append_row(&self, record: &Record, key: Option<Uuid>) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Some(Field::Key) => key.map(|k| k.to_string()).unwrap_or_default(),
                Some(field) => field_value(record, *field),
                None => String::new(),
            })
            .collect()
    }

    /// Row for an update: data cells are `Some`, everything else `None`
    /// (left as is). Trailing `None` cells are dropped, so on the current
    /// layout this spans A–F.
    pub fn to_update_row(&self, record: &Record) -> Vec<Option<String>> {
        let mut cells: Vec<Option<String>> = self
            .columns
            .iter()
            .map(|column| match column {
                Some(field) if field.is_data() => Some(field_value(record, *field)),
                _ => None,
            })
            .collect();
        while matches!(cells.last(), Some(None)) {
            cells.pop();
        }
        cells
    }
}

fn field_value(record: &Record, field: Field) -> String {
    match field {
        Field::Country => record.country.clone(),
        Field::Category => record.category.label().to_string(),
        Field::TradeType => record.trade_type.as_str().to_string(),
        Field::ItemName => record.item_name.clone(),
        Field::Price => record.price.to_string(),
        Field::Note => record.note.clone(),
        Field::Key => String::new(),
    }
}

/// A1-notation column letters for a zero-based column index (0 → A, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
