use crate::domain::model::ShippingAddress;
use crate::domain::ports::{AddressSource, AddressValidator};
use std::sync::{Arc, RwLock};

/// Shipping address held by the checkout; clones share the same slot so the
/// caller can replace it before announcing `AddressSaved`.
#[derive(Debug, Clone, Default)]
pub struct SharedAddress {
    slot: Arc<RwLock<Option<ShippingAddress>>>,
}

impl SharedAddress {
    pub fn new(address: Option<ShippingAddress>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(address)),
        }
    }

    pub fn replace(&self, address: Option<ShippingAddress>) {
        match self.slot.write() {
            Ok(mut slot) => *slot = address,
            Err(poisoned) => *poisoned.into_inner() = address,
        }
    }
}

impl AddressSource for SharedAddress {
    fn shipping_address(&self) -> Option<ShippingAddress> {
        match self.slot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Domestic means "ships to this ISO country".
#[derive(Debug, Clone)]
pub struct DomesticCountry {
    country_id: String,
}

impl DomesticCountry {
    pub fn new(country_id: impl Into<String>) -> Self {
        Self {
            country_id: country_id.into(),
        }
    }
}

impl Default for DomesticCountry {
    fn default() -> Self {
        Self::new("DE")
    }
}

impl AddressValidator for DomesticCountry {
    fn is_domestic(&self, address: &ShippingAddress) -> bool {
        address.country_id.eq_ignore_ascii_case(&self.country_id)
    }
}
