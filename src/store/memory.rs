use std::collections::BTreeMap;
use std::sync::Mutex;

use super::RawStore;
use crate::error::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    pages: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RawStore for MemoryStore {
    fn put(&self, identifier: &str, body: &str) -> Result<(), StoreError> {
        let mut pages = self.pages.lock().map_err(|_| StoreError::Poisoned)?;
        pages.insert(identifier.to_string(), body.to_string());
        Ok(())
    }

    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError> {
        let pages = self.pages.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(pages.get(identifier).cloned())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let pages = self.pages.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(pages.keys().cloned().collect())
    }
}
