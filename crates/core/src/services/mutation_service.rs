use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::layout::{column_letter, SheetLayout};
use crate::models::record::{HeaderRow, Record, RecordSet};
use crate::sheets::traits::SheetClient;

use super::record_store::RecordStore;

/// Writes records to the sheet: append, batch append, update and delete.
///
/// Row-id addressed commands take the `RecordSet` they were resolved
/// against; it must be freshly loaded, since every insert or delete shifts
/// the row ids after it. The key-addressed variants re-read the sheet
/// themselves right before writing.
///
/// Records are always written with a trade type column. A legacy sheet
/// without one gets the column inserted before its first write.
pub struct MutationService {
    store: RecordStore,
}

impl MutationService {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(),
        }
    }

    /// Append one record. Returns the row it was written to.
    pub async fn append(
        &self,
        client: &dyn SheetClient,
        current: &RecordSet,
        record: &Record,
    ) -> Result<u32, CoreError> {
        Self::validate(record)?;
        let (layout, header) = self.prepare_sheet(client, current).await?;

        let row = layout.to_append_row(record, layout.has_key().then(Uuid::new_v4));
        match header {
            Some(header) => client.append_rows(vec![header, row]).await?,
            None => client.append_row(row).await?,
        }

        let row_id = current.next_row_id();
        log::info!(
            "appended '{}' ({}) at row {row_id}",
            record.item_name,
            record.country
        );
        Ok(row_id)
    }

    /// Append several records in a single call. Nothing is written unless
    /// every record is valid.
    pub async fn append_batch(
        &self,
        client: &dyn SheetClient,
        current: &RecordSet,
        records: &[Record],
    ) -> Result<(), CoreError> {
        if records.is_empty() {
            return Ok(());
        }
        for (idx, record) in records.iter().enumerate() {
            if let Some(problem) = missing_field(record) {
                return Err(CoreError::Validation(format!("record {}: {problem}", idx + 1)));
            }
        }
        let (layout, header) = self.prepare_sheet(client, current).await?;

        let rows: Vec<Vec<String>> = header
            .into_iter()
            .chain(
                records
                    .iter()
                    .map(|r| layout.to_append_row(r, layout.has_key().then(Uuid::new_v4))),
            )
            .collect();
        client.append_rows(rows).await?;

        log::info!("appended {} record(s) in one batch", records.len());
        Ok(())
    }

    /// Replace all data fields of the record at `row_id`.
    pub async fn update(
        &self,
        client: &dyn SheetClient,
        current: &RecordSet,
        row_id: u32,
        record: &Record,
    ) -> Result<(), CoreError> {
        Self::validate(record)?;
        if !current.contains_row(row_id) {
            return Err(CoreError::RowNotFound(row_id));
        }
        let (layout, _) = self.prepare_sheet(client, current).await?;

        client.update_row(row_id, layout.to_update_row(record)).await?;
        log::info!("updated row {row_id}");
        Ok(())
    }

    /// Delete the record at `row_id`. Later rows move up by one.
    pub async fn delete(
        &self,
        client: &dyn SheetClient,
        current: &RecordSet,
        row_id: u32,
    ) -> Result<(), CoreError> {
        if !current.contains_row(row_id) {
            return Err(CoreError::RowNotFound(row_id));
        }
        client.delete_row(row_id).await?;
        log::info!("deleted row {row_id}");
        Ok(())
    }

    /// Update the record carrying `key`, wherever it sits right now.
    /// Returns the row that was written.
    pub async fn update_by_key(
        &self,
        client: &dyn SheetClient,
        key: Uuid,
        record: &Record,
    ) -> Result<u32, CoreError> {
        let fresh = self.store.load(client).await?;
        let row_id = Self::resolve_key(&fresh, key)?;
        self.update(client, &fresh, row_id, record).await?;
        Ok(row_id)
    }

    /// Delete the record carrying `key`, wherever it sits right now.
    pub async fn delete_by_key(&self, client: &dyn SheetClient, key: Uuid) -> Result<(), CoreError> {
        let fresh = self.store.load(client).await?;
        let row_id = Self::resolve_key(&fresh, key)?;
        self.delete(client, &fresh, row_id).await
    }

    /// Country and item name are required; everything else may be blank.
    pub fn validate(record: &Record) -> Result<(), CoreError> {
        match missing_field(record) {
            Some(problem) => Err(CoreError::Validation(problem.into())),
            None => Ok(()),
        }
    }

    fn resolve_key(records: &RecordSet, key: Uuid) -> Result<u32, CoreError> {
        records
            .find_by_key(key)
            .map(|r| r.row_id)
            .ok_or_else(|| CoreError::RecordNotFound(key.to_string()))
    }

    /// Get the sheet ready for new cells and return the layout to write
    /// them with. A header row still to be written (the sheet was empty) is
    /// returned so it goes out in the same call as the first records.
    async fn prepare_sheet(
        &self,
        client: &dyn SheetClient,
        current: &RecordSet,
    ) -> Result<(SheetLayout, Option<Vec<String>>), CoreError> {
        match current.header {
            HeaderRow::Missing => Ok((
                current.layout.clone(),
                Some(current.layout.header().to_vec()),
            )),
            HeaderRow::Foreign => {
                log::info!("replacing unrecognized header row of {}", client.name());
                client.update_row(1, header_cells(&current.layout)).await?;
                Ok((current.layout.clone(), None))
            }
            HeaderRow::Recognized if !current.layout.has_trade_type() => {
                let (column, upgraded) = current.layout.with_trade_type();
                log::info!(
                    "adding trade type column {} to {}",
                    column_letter(column),
                    client.name()
                );
                client.insert_column(column).await?;
                client.update_row(1, header_cells(&upgraded)).await?;
                Ok((upgraded, None))
            }
            HeaderRow::Recognized => Ok((current.layout.clone(), None)),
        }
    }
}

impl Default for MutationService {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_field(record: &Record) -> Option<&'static str> {
    if record.country.trim().is_empty() {
        Some("country must not be empty")
    } else if record.item_name.trim().is_empty() {
        Some("item name must not be empty")
    } else {
        None
    }
}

fn header_cells(layout: &SheetLayout) -> Vec<Option<String>> {
    layout.header().iter().cloned().map(Some).collect()
}
