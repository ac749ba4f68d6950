use async_trait::async_trait;

use crate::errors::CoreError;

/// Trait abstraction over the tabular store the ledger lives in.
///
/// Rows are 1-based like spreadsheet rows: row 1 is the header, data starts
/// at row 2. Every method is a single call against the backing service, so a
/// failed call leaves the sheet as it was.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SheetClient: Send + Sync {
    /// Human-readable name of the backing store (for logs/errors).
    fn name(&self) -> &str;

    /// Every row of the worksheet, header included. Trailing empty cells may
    /// be missing from a row.
    async fn read_all(&self) -> Result<Vec<Vec<String>>, CoreError>;

    /// Append one row after the last non-empty row.
    async fn append_row(&self, values: Vec<String>) -> Result<(), CoreError>;

    /// Append several rows in one call.
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), CoreError>;

    /// Overwrite the cells of `row` starting at column A. A `None` cell is
    /// left unchanged.
    async fn update_row(&self, row: u32, values: Vec<Option<String>>) -> Result<(), CoreError>;

    /// Remove `row`; every following row moves up by one.
    async fn delete_row(&self, row: u32) -> Result<(), CoreError>;

    /// Insert an empty column before zero-based `column`; every following
    /// column moves right by one.
    async fn insert_column(&self, column: usize) -> Result<(), CoreError>;
}
