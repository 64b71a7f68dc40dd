use crate::core::bus::{Emitter, EventBus};
use crate::core::component::{
    Completion, ComponentContext, ComponentSnapshot, MountOptions, OptionComponent,
};
use crate::core::coordinator::Coordinator;
use crate::core::detector::detect_active_service;
use crate::core::gateway::SelectionGateway;
use crate::domain::model::{
    AddressId, ComponentKind, DeliveryLocation, Event, Notice, OptionKind, ShippingAddress,
};
use crate::domain::ports::{
    AddressSource, AddressValidator, CheckoutSettings, FeeProvider, SelectionStore,
};
use crate::utils::error::{DeliveryError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Checkout services a session consults besides the selection store.
pub struct Collaborators {
    pub address: Box<dyn AddressSource>,
    pub validator: Box<dyn AddressValidator>,
    pub fees: Box<dyn FeeProvider>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub address_id: Option<AddressId>,
    pub domestic: bool,
    pub active_service: Option<OptionKind>,
    pub additional_fees: f64,
    pub components: Vec<ComponentSnapshot>,
    pub completion: Completion,
    pub notices: Vec<Notice>,
}

/// One checkout request: the coordinator, the mounted option components
/// and the event bus connecting them.
///
/// Every public call drains the bus before returning, so callers always
/// observe a settled state.
pub struct CheckoutSession<S: SelectionStore> {
    gateway: Arc<SelectionGateway<S>>,
    collaborators: Collaborators,
    address: Option<ShippingAddress>,
    domestic: bool,
    store_id: u32,
    conflicts: BTreeMap<OptionKind, Vec<OptionKind>>,
    coordinator: Coordinator,
    components: Vec<OptionComponent>,
    bus: EventBus,
    notices: Vec<Notice>,
}

impl<S: SelectionStore> CheckoutSession<S> {
    pub fn mount(
        gateway: Arc<SelectionGateway<S>>,
        collaborators: Collaborators,
        settings: &dyn CheckoutSettings,
    ) -> Self {
        let address = collaborators.address.shipping_address();
        let domestic = address
            .as_ref()
            .is_some_and(|a| collaborators.validator.is_domestic(a));

        let mut session = Self {
            gateway,
            collaborators,
            address,
            domestic,
            store_id: settings.store_id(),
            conflicts: OptionKind::PRIORITY
                .into_iter()
                .map(|kind| (kind, settings.conflicts_for(kind)))
                .collect(),
            coordinator: Coordinator::mounting(None),
            components: Vec::new(),
            bus: EventBus::new(),
            notices: Vec::new(),
        };
        session.mount_components();
        session
    }

    /// Loads the selections stored for the current address into fresh
    /// components and settles a new coordinator on them.
    fn mount_components(&mut self) {
        let address_id = self.address_id().cloned();
        if address_id.is_none() {
            tracing::warn!("⚠️ No shipping address saved yet, delivery options are disabled");
        }

        let detected = match detect_active_service(&self.gateway, address_id.as_ref()) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("❌ Could not restore delivery options: {}", e);
                self.notices.push(Notice {
                    option: None,
                    message: e.user_friendly_message(),
                });
                None
            }
        };
        self.coordinator = Coordinator::mounting(detected);
        self.components = ComponentKind::ALL.into_iter().map(OptionComponent::new).collect();

        let available = self.is_available();
        for index in 0..self.components.len() {
            let kind = self.components[index].kind();
            let fee = self.collaborators.fees.fee(kind, self.store_id);
            let kind_conflicts = kind
                .exclusive()
                .and_then(|k| self.conflicts.get(&k))
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut emitter = Emitter::new();
            let mut ctx = ComponentContext {
                gateway: &self.gateway,
                address: address_id.as_ref(),
                notices: &mut self.notices,
            };
            self.components[index].mount(
                &mut ctx,
                MountOptions {
                    available,
                    fee,
                    conflicts: kind_conflicts,
                    address: self.address.as_ref(),
                },
                &mut emitter,
            );
            self.bus.extend(emitter.take());
            self.drain();
        }

        if let Some(winner) = self.coordinator.settle() {
            self.bus.push(Event::ActiveServiceChanged(winner));
            self.drain();
        }

        tracing::info!(
            "🚀 Checkout mounted for address {:?} (domestic: {}, active: {:?})",
            address_id,
            self.domestic,
            self.coordinator.active_service()
        );
    }

    /// A field of one option was changed in the checkout form.
    pub fn edit(&mut self, kind: ComponentKind, field: &str, value: &str) -> Result<()> {
        tracing::debug!("✏️ {}.{} = {:?}", kind, field, value);
        self.with_component(kind, |component, ctx, emitter| {
            component.edit(field, value, ctx, emitter)
        })
    }

    pub fn select_packstation(&mut self, location: DeliveryLocation) -> Result<()> {
        tracing::info!("📦 Packstation selected: {} {}", location.id, location.display_name);
        self.with_component(OptionKind::ParcelPackstation.into(), |component, ctx, emitter| {
            component.select_location(location, ctx, emitter)
        })
    }

    pub fn clear_packstation(&mut self) -> Result<()> {
        self.with_component(OptionKind::ParcelPackstation.into(), |component, ctx, emitter| {
            component.clear_location(ctx, emitter)
        })
    }

    /// The shipping address step was saved; components re-check availability.
    /// A different address id brings its own stored selections, so the
    /// components are mounted again against it.
    pub fn address_saved(&mut self) {
        let previous = self.address_id().cloned();
        self.address = self.collaborators.address.shipping_address();
        self.domestic = self
            .address
            .as_ref()
            .is_some_and(|a| self.collaborators.validator.is_domestic(a));
        tracing::info!(
            "🏠 Shipping address saved (id: {:?}, domestic: {})",
            self.address_id(),
            self.domestic
        );

        self.bus.push(Event::AddressSaved);
        self.drain();

        if self.address_id() != previous.as_ref() {
            tracing::info!("🔄 Address changed from {:?}, reloading delivery options", previous);
            self.mount_components();
        }
    }

    /// First blocking component wins; everything else passes.
    pub fn validate_completion(&self) -> Completion {
        self.components
            .iter()
            .map(OptionComponent::validate_completion)
            .find(|completion| !completion.is_pass())
            .unwrap_or(Completion::Pass)
    }

    pub fn active_service(&self) -> Option<OptionKind> {
        self.coordinator.active_service()
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&OptionComponent> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    pub fn components(&self) -> &[OptionComponent] {
        &self.components
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn journal(&self) -> &[Event] {
        self.bus.journal()
    }

    /// Sum of the surcharges of every selected option.
    pub fn additional_fees(&self) -> f64 {
        self.components.iter().map(OptionComponent::charge).sum()
    }

    pub fn is_domestic(&self) -> bool {
        self.domestic
    }

    pub fn address_id(&self) -> Option<&AddressId> {
        self.address.as_ref().and_then(|a| a.id.as_ref())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            address_id: self.address_id().cloned(),
            domestic: self.domestic,
            active_service: self.active_service(),
            additional_fees: self.additional_fees(),
            components: self.components.iter().map(OptionComponent::snapshot).collect(),
            completion: self.validate_completion(),
            notices: self.notices.clone(),
        }
    }

    fn is_available(&self) -> bool {
        self.domestic && self.address_id().is_some()
    }

    fn with_component<F>(&mut self, kind: ComponentKind, action: F) -> Result<()>
    where
        F: FnOnce(&mut OptionComponent, &mut ComponentContext<'_, S>, &mut Emitter) -> Result<()>,
    {
        let address = self
            .address
            .as_ref()
            .and_then(|a| a.id.as_ref())
            .ok_or(DeliveryError::AddressUnavailable)?;
        if !self.domestic {
            return Err(DeliveryError::NotDomestic);
        }

        let component = self
            .components
            .iter_mut()
            .find(|c| c.kind() == kind)
            .ok_or_else(|| DeliveryError::UnsupportedOperation {
                option: kind.to_string(),
                operation: "mount".to_string(),
            })?;

        let mut emitter = Emitter::new();
        let mut ctx = ComponentContext {
            gateway: &self.gateway,
            address: Some(address),
            notices: &mut self.notices,
        };
        action(component, &mut ctx, &mut emitter)?;

        self.bus.extend(emitter.take());
        self.drain();
        Ok(())
    }

    /// Dispatches queued events until the bus is idle. Handler output is
    /// queued behind the current event, never delivered re-entrantly.
    fn drain(&mut self) {
        while let Some(event) = self.bus.next() {
            tracing::debug!("📨 {:?}", event);
            match event {
                Event::RequestExclusive(kind) => {
                    if let Some(winner) = self.coordinator.request(kind) {
                        self.bus.push(Event::ActiveServiceChanged(winner));
                    }
                }
                Event::ReleaseExclusive(kind) => {
                    if let Some(winner) = self.coordinator.release(kind) {
                        self.bus.push(Event::ActiveServiceChanged(winner));
                    }
                }
                Event::ActiveServiceChanged(winner) => {
                    let mut emitter = Emitter::new();
                    let mut ctx = ComponentContext {
                        gateway: &self.gateway,
                        address: self.address.as_ref().and_then(|a| a.id.as_ref()),
                        notices: &mut self.notices,
                    };
                    for component in &mut self.components {
                        component.on_active_service_changed(winner, &mut ctx, &mut emitter);
                    }
                    self.bus.extend(emitter.take());
                }
                Event::AddressSaved => {
                    let available = self.is_available();
                    let winner = self.coordinator.active_service();
                    for component in &mut self.components {
                        component.on_address_saved(available, self.address.as_ref(), winner);
                    }
                }
                Event::TotalsRefreshRequested(kind) => {
                    tracing::debug!("💶 Totals refresh requested by {}", kind);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DomesticCountry, MemoryStore, SharedAddress};
    use crate::config::DeliveryConfig;
    use crate::domain::codes;
    use crate::domain::model::SelectionRecord;

    fn session_with(records: Vec<SelectionRecord>) -> CheckoutSession<MemoryStore> {
        let address = ShippingAddress {
            id: Some(AddressId::new("42")),
            country_id: "DE".to_string(),
            ..Default::default()
        };
        let store = MemoryStore::with_records(AddressId::new("42"), records);
        let config = DeliveryConfig::default();
        CheckoutSession::mount(
            Arc::new(SelectionGateway::new(store)),
            Collaborators {
                address: Box::new(SharedAddress::new(Some(address))),
                validator: Box::new(DomesticCountry::default()),
                fees: Box::new(config.clone()),
            },
            &config,
        )
    }

    #[test]
    fn test_mount_broadcasts_once() {
        let session = session_with(vec![]);
        let broadcasts = session
            .journal()
            .iter()
            .filter(|e| matches!(e, Event::ActiveServiceChanged(_)))
            .count();
        assert_eq!(broadcasts, 1);
        assert_eq!(session.active_service(), None);
    }

    #[test]
    fn test_conflicting_persisted_state_is_repaired_on_mount() {
        let session = session_with(vec![
            SelectionRecord::new(codes::NO_NEIGHBOR, codes::FIELD_ENABLED, "1"),
            SelectionRecord::new(codes::PREFERRED_DAY, codes::FIELD_DATE, "2024-05-01"),
        ]);

        assert_eq!(session.active_service(), Some(OptionKind::PreferredDay));
        let no_neighbor = session.component(OptionKind::NoNeighbor.into()).unwrap();
        assert!(!no_neighbor.is_active());
        assert!(no_neighbor.is_disabled());
    }

    #[test]
    fn test_edit_rejected_without_domestic_address() {
        let store = MemoryStore::new();
        let config = DeliveryConfig::default();
        let mut session = CheckoutSession::mount(
            Arc::new(SelectionGateway::new(store)),
            Collaborators {
                address: Box::new(SharedAddress::new(Some(ShippingAddress {
                    id: Some(AddressId::new("7")),
                    country_id: "AT".to_string(),
                    ..Default::default()
                }))),
                validator: Box::new(DomesticCountry::default()),
                fees: Box::new(config.clone()),
            },
            &config,
        );

        let err = session
            .edit(OptionKind::NoNeighbor.into(), codes::FIELD_ENABLED, "1")
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NotDomestic));
        assert!(session.components().iter().all(|c| c.is_disabled()));
    }
}
