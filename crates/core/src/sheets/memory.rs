use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::CoreError;
use super::traits::SheetClient;

/// A worksheet held in memory.
///
/// Follows the same row numbering and error behavior as the remote client,
/// which makes it a drop-in store for tests and offline sessions.
pub struct InMemorySheet {
    name: String,
    rows: Mutex<Vec<Vec<String>>>,
}

impl InMemorySheet {
    /// An empty worksheet (no header row yet).
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// A worksheet pre-filled with `rows` (first row is the header).
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            name: "in-memory".to_string(),
            rows: Mutex::new(rows),
        }
    }

    /// Build from string slices, handy for fixtures.
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::with_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Snapshot of the current contents.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn check_row(rows: &[Vec<String>], row: u32) -> Result<usize, CoreError> {
        if row == 0 || row as usize > rows.len() {
            return Err(CoreError::RowNotFound(row));
        }
        Ok(row as usize - 1)
    }
}

impl Default for InMemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SheetClient for InMemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, CoreError> {
        Ok(self.rows())
    }

    async fn append_row(&self, values: Vec<String>) -> Result<(), CoreError> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(values);
        Ok(())
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), CoreError> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(rows);
        Ok(())
    }

    async fn update_row(&self, row: u32, values: Vec<Option<String>>) -> Result<(), CoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let idx = Self::check_row(&rows, row)?;
        let target = &mut rows[idx];
        if target.len() < values.len() {
            target.resize(values.len(), String::new());
        }
        for (cell, value) in target.iter_mut().zip(values) {
            if let Some(value) = value {
                *cell = value;
            }
        }
        Ok(())
    }

    async fn delete_row(&self, row: u32) -> Result<(), CoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let idx = Self::check_row(&rows, row)?;
        rows.remove(idx);
        Ok(())
    }

    async fn insert_column(&self, column: usize) -> Result<(), CoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        for row in rows.iter_mut().filter(|r| r.len() >= column) {
            row.insert(column, String::new());
        }
        Ok(())
    }
}
