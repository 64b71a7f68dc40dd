use crate::domain::model::{AddressId, SelectionRecord};
use crate::domain::ports::SelectionStore;
use crate::utils::error::{DeliveryError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-process selection store, one record set per address.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: Mutex<HashMap<AddressId, Vec<SelectionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(address: AddressId, records: Vec<SelectionRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut sets) = store.sets.lock() {
            sets.insert(address, records);
        }
        store
    }
}

impl SelectionStore for MemoryStore {
    fn load(&self, address: &AddressId) -> Result<Vec<SelectionRecord>> {
        let sets = self
            .sets
            .lock()
            .map_err(|_| DeliveryError::persistence("memory store poisoned"))?;
        Ok(sets.get(address).cloned().unwrap_or_default())
    }

    fn save(&self, address: &AddressId, records: &[SelectionRecord]) -> Result<()> {
        let mut sets = self
            .sets
            .lock()
            .map_err(|_| DeliveryError::persistence("memory store poisoned"))?;
        sets.insert(address.clone(), records.to_vec());
        Ok(())
    }
}
