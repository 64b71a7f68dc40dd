use crate::domain::model::{AddressId, SelectionGroup, SelectionRecord};
use crate::domain::ports::SelectionStore;
use crate::utils::error::{DeliveryError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Read-modify-write access to the selections of a shipping address.
///
/// The store only knows "replace the whole set", so every write here reads the
/// current set, merges the change and resubmits everything. A lock per address
/// is held across that cycle; share the gateway (`Arc`) between requests so
/// concurrent checkouts for the same address are serialized too.
pub struct SelectionGateway<S: SelectionStore> {
    store: S,
    locks: Mutex<HashMap<AddressId, Arc<Mutex<()>>>>,
}

impl<S: SelectionStore> SelectionGateway<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All records of the address; empty when no address is resolvable.
    pub fn load_all(&self, address: Option<&AddressId>) -> Result<Vec<SelectionRecord>> {
        match address {
            Some(address) => self.store.load(address),
            None => {
                tracing::debug!("No shipping address resolvable, no selections loaded");
                Ok(Vec::new())
            }
        }
    }

    pub fn load_group(&self, address: Option<&AddressId>, option_code: &str) -> Result<SelectionGroup> {
        let records = self.load_all(address)?;
        Ok(SelectionGroup::from_records(option_code, &records))
    }

    pub fn upsert_field(
        &self,
        address: Option<&AddressId>,
        option_code: &str,
        field_code: &str,
        value: &str,
    ) -> Result<Vec<SelectionRecord>> {
        self.upsert_fields(address, option_code, &[(field_code, value.to_string())])
    }

    /// Writes several fields of one option in a single transaction.
    pub fn upsert_fields(
        &self,
        address: Option<&AddressId>,
        option_code: &str,
        fields: &[(&str, String)],
    ) -> Result<Vec<SelectionRecord>> {
        let address = address.ok_or(DeliveryError::AddressUnavailable)?;
        let lock = self.address_lock(address)?;
        let outcome = match lock.lock() {
            Ok(_guard) => self.merge_and_save(address, option_code, fields),
            Err(_) => Err(DeliveryError::persistence(format!(
                "selection lock for address {} poisoned",
                address
            ))),
        };
        self.release_lock(address, lock);
        outcome
    }

    fn merge_and_save(
        &self,
        address: &AddressId,
        option_code: &str,
        fields: &[(&str, String)],
    ) -> Result<Vec<SelectionRecord>> {
        let mut records = self.store.load(address)?;
        for (field_code, value) in fields {
            merge_field(&mut records, option_code, field_code, value);
        }

        tracing::debug!(
            "Saving {} selections for address {} ({} field(s) of {})",
            records.len(),
            address,
            fields.len(),
            option_code
        );
        self.store.save(address, &records)?;
        Ok(records)
    }

    fn address_lock(&self, address: &AddressId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| DeliveryError::persistence("selection lock table poisoned"))?;
        Ok(locks
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Drops the table entry once no other caller holds or waits for it.
    fn release_lock(&self, address: &AddressId, lock: Arc<Mutex<()>>) {
        if let Ok(mut locks) = self.locks.lock() {
            // one reference in the table, one here
            if Arc::strong_count(&lock) == 2 {
                locks.remove(address);
            }
        }
    }
}

/// Replace-if-present-else-append; an empty value removes the record.
pub fn merge_field(records: &mut Vec<SelectionRecord>, option_code: &str, field_code: &str, value: &str) {
    if let Some(pos) = records
        .iter()
        .position(|record| record.matches(option_code, field_code))
    {
        records.remove(pos);
    }

    if !value.is_empty() {
        records.push(SelectionRecord::new(option_code, field_code, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::codes;

    fn address() -> AddressId {
        AddressId::new("42")
    }

    #[test]
    fn test_merge_field_replaces_existing_record() {
        let mut records = vec![
            SelectionRecord::new(codes::PREFERRED_DAY, codes::FIELD_DATE, "2024-05-01"),
            SelectionRecord::new(codes::GOGREEN_PLUS, codes::FIELD_ENABLED, "1"),
        ];

        merge_field(&mut records, codes::PREFERRED_DAY, codes::FIELD_DATE, "2024-05-02");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, "2024-05-02");
    }

    #[test]
    fn test_merge_field_empty_value_drops_record() {
        let mut records = vec![SelectionRecord::new(
            codes::PREFERRED_LOCATION,
            codes::FIELD_DETAILS,
            "Garage",
        )];

        merge_field(&mut records, codes::PREFERRED_LOCATION, codes::FIELD_DETAILS, "");
        assert!(records.is_empty());

        merge_field(&mut records, codes::PREFERRED_LOCATION, codes::FIELD_DETAILS, "");
        assert!(records.is_empty());
    }

    #[test]
    fn test_upsert_then_load_group() {
        let gateway = SelectionGateway::new(MemoryStore::new());
        let address = address();

        gateway
            .upsert_field(Some(&address), codes::PREFERRED_DAY, codes::FIELD_DATE, "2024-05-01")
            .unwrap();
        let group = gateway.load_group(Some(&address), codes::PREFERRED_DAY).unwrap();
        assert_eq!(group.value(codes::FIELD_DATE), "2024-05-01");

        gateway
            .upsert_field(Some(&address), codes::PREFERRED_DAY, codes::FIELD_DATE, "")
            .unwrap();
        let group = gateway.load_group(Some(&address), codes::PREFERRED_DAY).unwrap();
        assert!(group.get(codes::FIELD_DATE).is_none());
    }

    #[test]
    fn test_upsert_keeps_unrelated_options() {
        let gateway = SelectionGateway::new(MemoryStore::new());
        let address = address();

        gateway
            .upsert_field(Some(&address), codes::GOGREEN_PLUS, codes::FIELD_ENABLED, "1")
            .unwrap();
        gateway
            .upsert_fields(
                Some(&address),
                codes::DELIVERY_LOCATION,
                &[
                    (codes::FIELD_LOCATION_ID, "8003-4711".to_string()),
                    (codes::FIELD_CITY, "Bonn".to_string()),
                ],
            )
            .unwrap();

        let all = gateway.load_all(Some(&address)).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all
            .iter()
            .any(|r| r.matches(codes::GOGREEN_PLUS, codes::FIELD_ENABLED)));
    }

    #[test]
    fn test_lock_table_is_empty_after_upsert() {
        let gateway = SelectionGateway::new(MemoryStore::new());
        let address = address();

        gateway
            .upsert_field(Some(&address), codes::NO_NEIGHBOR, codes::FIELD_ENABLED, "1")
            .unwrap();
        assert!(gateway.locks.lock().unwrap().is_empty());

        let held = gateway.address_lock(&address).unwrap();
        gateway
            .upsert_field(Some(&address), codes::NO_NEIGHBOR, codes::FIELD_ENABLED, "")
            .unwrap();
        assert_eq!(gateway.locks.lock().unwrap().len(), 1);

        gateway.release_lock(&address, held);
        assert!(gateway.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_address() {
        let gateway = SelectionGateway::new(MemoryStore::new());

        assert!(gateway.load_all(None).unwrap().is_empty());
        let err = gateway
            .upsert_field(None, codes::NO_NEIGHBOR, codes::FIELD_ENABLED, "1")
            .unwrap_err();
        assert!(matches!(err, DeliveryError::AddressUnavailable));
    }
}
