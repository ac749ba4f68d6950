pub mod errors;
pub mod models;
pub mod services;
pub mod sheets;

use std::collections::BTreeSet;
use uuid::Uuid;

use models::{
    comparison::Comparison,
    filter::RecordFilter,
    record::{Category, Record, RecordSet, StoredRecord},
    settings::Settings,
};
use services::{
    catalog_service::CatalogService, import_service::ImportService,
    mutation_service::MutationService, query_service::QueryService, record_store::RecordStore,
};
use sheets::{credential::Credential, google::GoogleSheetsClient, traits::SheetClient};

use errors::CoreError;

/// Main entry point for the market-research core library.
///
/// Owns the sheet client and the most recently loaded `RecordSet`. Every
/// mutation reloads the set afterwards, so row ids handed out by
/// [`records`](Self::records) are always the current ones.
#[must_use]
pub struct MarketResearch {
    client: Box<dyn SheetClient>,
    settings: Settings,
    records: RecordSet,
    store: RecordStore,
    catalog_service: CatalogService,
    query_service: QueryService,
    import_service: ImportService,
    mutation_service: MutationService,
}

impl std::fmt::Debug for MarketResearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketResearch")
            .field("client", &self.client.name())
            .field("records", &self.records.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl MarketResearch {
    /// Resolve the credential, open the configured Google spreadsheet and
    /// load its records.
    pub async fn connect(settings: Settings) -> Result<Self, CoreError> {
        let credential = Credential::resolve(settings.credentials_path.as_deref())?;
        let client = GoogleSheetsClient::open(
            &settings.document_name,
            settings.worksheet_index,
            credential,
        )
        .await?;
        Self::open(Box::new(client), settings).await
    }

    /// Use an already constructed client (e.g. `InMemorySheet`) and load its records.
    pub async fn open(client: Box<dyn SheetClient>, settings: Settings) -> Result<Self, CoreError> {
        let mut tracker = Self {
            client,
            import_service: ImportService::from_settings(&settings),
            settings,
            records: RecordSet::default(),
            store: RecordStore::new(),
            catalog_service: CatalogService::new(),
            query_service: QueryService::new(),
            mutation_service: MutationService::new(),
        };
        tracker.reload().await?;
        log::info!(
            "opened {} with {} record(s)",
            tracker.client.name(),
            tracker.records.len()
        );
        Ok(tracker)
    }

    /// Re-read the sheet. On failure the previously loaded records are kept.
    pub async fn reload(&mut self) -> Result<&RecordSet, CoreError> {
        self.records = self.store.load(self.client.as_ref()).await?;
        Ok(&self.records)
    }

    // ── Records ─────────────────────────────────────────────────────

    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    #[must_use]
    pub fn get_record(&self, row_id: u32) -> Option<&StoredRecord> {
        self.records.get_by_row(row_id)
    }

    #[must_use]
    pub fn get_record_by_key(&self, key: Uuid) -> Option<&StoredRecord> {
        self.records.find_by_key(key)
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Countries seen so far, for the country picker.
    #[must_use]
    pub fn countries(&self) -> BTreeSet<String> {
        self.catalog_service.distinct_countries(&self.records)
    }

    /// Item names seen so far, optionally narrowed to one category.
    #[must_use]
    pub fn items(&self, category: Option<Category>) -> BTreeSet<String> {
        self.catalog_service.distinct_items(&self.records, category)
    }

    #[must_use]
    pub fn categories(&self) -> &'static [Category] {
        self.catalog_service.categories()
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn filter(&self, filter: &RecordFilter) -> RecordSet {
        self.query_service.filter(&self.records, filter)
    }

    /// Every observation of `item_name`, cheapest first, split by trade type.
    #[must_use]
    pub fn compare(&self, item_name: &str) -> Comparison {
        self.query_service.compare(&self.records, item_name)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Append a record. Returns its row id.
    pub async fn add_record(&mut self, record: Record) -> Result<u32, CoreError> {
        let row_id = self
            .mutation_service
            .append(self.client.as_ref(), &self.records, &record)
            .await?;
        self.reload().await?;
        Ok(row_id)
    }

    /// Append several records in one write (all or nothing).
    pub async fn add_records(&mut self, records: &[Record]) -> Result<(), CoreError> {
        if records.is_empty() {
            return Ok(());
        }
        self.mutation_service
            .append_batch(self.client.as_ref(), &self.records, records)
            .await?;
        self.reload().await?;
        Ok(())
    }

    /// Replace the record at `row_id` (as found in the current `records()`).
    pub async fn update_record(&mut self, row_id: u32, record: Record) -> Result<(), CoreError> {
        self.mutation_service
            .update(self.client.as_ref(), &self.records, row_id, &record)
            .await?;
        self.reload().await?;
        Ok(())
    }

    /// Delete the record at `row_id`. Row ids after it shift down by one.
    pub async fn delete_record(&mut self, row_id: u32) -> Result<(), CoreError> {
        self.mutation_service
            .delete(self.client.as_ref(), &self.records, row_id)
            .await?;
        self.reload().await?;
        Ok(())
    }

    /// Replace the record with stable key `key`, resolving its row from a
    /// fresh read. Returns the row that was written.
    pub async fn update_record_by_key(&mut self, key: Uuid, record: Record) -> Result<u32, CoreError> {
        let row_id = self
            .mutation_service
            .update_by_key(self.client.as_ref(), key, &record)
            .await?;
        self.reload().await?;
        Ok(row_id)
    }

    /// Delete the record with stable key `key`, resolving its row from a fresh read.
    pub async fn delete_record_by_key(&mut self, key: Uuid) -> Result<(), CoreError> {
        self.mutation_service
            .delete_by_key(self.client.as_ref(), key)
            .await?;
        self.reload().await?;
        Ok(())
    }

    // ── Bulk Import ─────────────────────────────────────────────────

    /// Parse a bulk price list and append it in one write.
    /// Returns the number of records imported. A malformed document writes nothing.
    pub async fn import_str(&mut self, text: &str) -> Result<usize, CoreError> {
        let records = self.import_service.parse_str(text)?;
        self.add_records(&records).await?;
        log::info!("imported {} record(s)", records.len());
        Ok(records.len())
    }

    /// Read and import a bulk price list file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn import_file(&mut self, path: impl AsRef<std::path::Path>) -> Result<usize, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.import_str(&text).await.map_err(|e| match e {
            CoreError::ImportFormat(msg) => {
                CoreError::ImportFormat(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    /// Name of the backing store, for status lines.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.client.name()
    }
}
