use crate::domain::model::{AddressId, ComponentKind, OptionKind, SelectionRecord, ShippingAddress};
use crate::utils::error::Result;
use std::sync::Arc;

/// Key-value transport behind the selection gateway.
///
/// `save` replaces the complete set stored for the address; records that are
/// not resubmitted are dropped.
pub trait SelectionStore: Send + Sync {
    fn load(&self, address: &AddressId) -> Result<Vec<SelectionRecord>>;
    fn save(&self, address: &AddressId, records: &[SelectionRecord]) -> Result<()>;
}

impl<S: SelectionStore + ?Sized> SelectionStore for Arc<S> {
    fn load(&self, address: &AddressId) -> Result<Vec<SelectionRecord>> {
        (**self).load(address)
    }

    fn save(&self, address: &AddressId, records: &[SelectionRecord]) -> Result<()> {
        (**self).save(address, records)
    }
}

/// Supplies the shipping address of the current checkout, if one was saved.
pub trait AddressSource: Send + Sync {
    fn shipping_address(&self) -> Option<ShippingAddress>;
}

pub trait AddressValidator: Send + Sync {
    fn is_domestic(&self, address: &ShippingAddress) -> bool;
}

pub trait FeeProvider: Send + Sync {
    /// Surcharge for `kind` in the given store view; zero when none is configured.
    fn fee(&self, kind: ComponentKind, store_id: u32) -> f64;
}

/// Per-store checkout settings a session reads once on mount.
pub trait CheckoutSettings {
    fn store_id(&self) -> u32;

    /// Options whose stored value disables `kind` on load.
    fn conflicts_for(&self, kind: OptionKind) -> Vec<OptionKind>;
}
