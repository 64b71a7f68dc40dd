use crate::core::bus::Emitter;
use crate::core::detector::has_value;
use crate::core::fields::OptionFields;
use crate::core::gateway::SelectionGateway;
use crate::domain::codes;
use crate::domain::model::{
    AddressId, ComponentKind, DeliveryLocation, Event, Notice, OptionKind, SelectionGroup,
    ShippingAddress,
};
use crate::domain::ports::SelectionStore;
use crate::utils::error::{DeliveryError, Result};
use crate::utils::validation::validate_postnumber;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentState {
    Unloaded,
    Loaded,
    Active,
    Inactive,
    Disabled,
}

/// Where a blocked checkout step should point the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRef {
    pub option: ComponentKind,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Completion {
    Pass,
    Blocked(ValidationRef),
}

impl Completion {
    pub fn is_pass(&self) -> bool {
        matches!(self, Completion::Pass)
    }
}

/// Store access for one handler invocation. Failures become notices so the
/// handler can finish its in-memory transition.
pub struct ComponentContext<'a, S: SelectionStore> {
    pub gateway: &'a SelectionGateway<S>,
    pub address: Option<&'a AddressId>,
    pub notices: &'a mut Vec<Notice>,
}

impl<S: SelectionStore> ComponentContext<'_, S> {
    fn load_group(&mut self, kind: ComponentKind) -> SelectionGroup {
        match self.gateway.load_group(self.address, kind.option_code()) {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!("❌ Loading {} selections failed: {}", kind, e);
                self.notices.push(Notice {
                    option: Some(kind),
                    message: e.user_friendly_message(),
                });
                SelectionGroup::default()
            }
        }
    }

    fn persist(&mut self, kind: ComponentKind, fields: &[(&str, String)]) -> bool {
        match self
            .gateway
            .upsert_fields(self.address, kind.option_code(), fields)
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    "❌ Persisting {} failed: {} (💡 {})",
                    kind,
                    e,
                    e.recovery_suggestion()
                );
                self.notices.push(Notice {
                    option: Some(kind),
                    message: e.user_friendly_message(),
                });
                false
            }
        }
    }
}

/// Inputs for [`OptionComponent::mount`].
pub struct MountOptions<'a> {
    /// Delivery services are offered for the shipping address.
    pub available: bool,
    pub fee: f64,
    /// Options whose stored value disables this one before the first broadcast.
    pub conflicts: &'a [OptionKind],
    pub address: Option<&'a ShippingAddress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSnapshot {
    pub kind: ComponentKind,
    pub state: ComponentState,
    pub disabled: bool,
    pub fee: f64,
    pub charge: f64,
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_message: Option<String>,
}

/// One delivery option as mounted in the checkout.
#[derive(Debug, Clone)]
pub struct OptionComponent {
    kind: ComponentKind,
    fields: OptionFields,
    state: ComponentState,
    disabled: bool,
    available: bool,
    fee: f64,
    postnumber_error: Option<String>,
    search_address: Option<ShippingAddress>,
}

impl OptionComponent {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            fields: OptionFields::empty(kind),
            state: ComponentState::Unloaded,
            disabled: false,
            available: false,
            fee: 0.0,
            postnumber_error: None,
            search_address: None,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn fields(&self) -> &OptionFields {
        &self.fields
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_active(&self) -> bool {
        self.fields.is_active()
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// Surcharge actually billed: the configured fee while selected, else zero.
    pub fn charge(&self) -> f64 {
        if self.fields.is_active() {
            self.fee
        } else {
            0.0
        }
    }

    /// Inline message from the last post number edit.
    pub fn validation_message(&self) -> Option<&str> {
        self.postnumber_error.as_deref()
    }

    /// Shipping address to prefill the locker finder with (Packstation only).
    pub fn locker_search_address(&self) -> Option<&ShippingAddress> {
        self.search_address.as_ref()
    }

    pub fn mount<S: SelectionStore>(
        &mut self,
        ctx: &mut ComponentContext<'_, S>,
        options: MountOptions<'_>,
        emitter: &mut Emitter,
    ) {
        let group = ctx.load_group(self.kind);
        self.fields = OptionFields::from_group(self.kind, &group);
        self.state = ComponentState::Loaded;
        self.available = options.available;
        self.fee = options.fee;
        self.update_search_address(options.address);
        if self.is_packstation() && self.fields.is_active() {
            self.check_postnumber();
        }

        match self.kind.exclusive() {
            Some(kind) if self.fields.is_active() => {
                self.disabled = !self.available;
                emitter.emit(Event::RequestExclusive(kind));
            }
            Some(kind) => {
                self.disabled = !self.available || Self::conflict_holds_value(ctx, kind, options.conflicts);
            }
            None => self.disabled = !self.available,
        }

        self.refresh_state();
        tracing::debug!("Mounted {} as {:?}", self.kind, self.state);
    }

    fn conflict_holds_value<S: SelectionStore>(
        ctx: &mut ComponentContext<'_, S>,
        kind: OptionKind,
        conflicts: &[OptionKind],
    ) -> bool {
        conflicts
            .iter()
            .filter(|other| **other != kind)
            .any(|other| {
                let group = ctx.load_group((*other).into());
                has_value(*other, &group)
            })
    }

    /// A single field changed in the checkout form.
    pub fn edit<S: SelectionStore>(
        &mut self,
        field: &str,
        value: &str,
        ctx: &mut ComponentContext<'_, S>,
        emitter: &mut Emitter,
    ) -> Result<()> {
        // a location without id is no location; drop the remaining fields with it
        if self.is_packstation() && field == codes::FIELD_LOCATION_ID && value.trim().is_empty() {
            return self.clear_location(ctx, emitter);
        }

        let was_active = self.fields.is_active();
        let previous = self.fields.value(field);
        self.fields.set(field, value)?;

        let stored = self.fields.value(field);
        ctx.persist(self.kind, &[(field, stored.clone())]);

        if self.is_packstation() && field == codes::FIELD_POSTNUMBER {
            self.check_postnumber();
        }

        self.announce(was_active, emitter);
        if stored != previous {
            self.request_totals_refresh(emitter);
        }
        self.refresh_state();
        Ok(())
    }

    /// Stores a location picked in the locker finder as one transaction.
    pub fn select_location<S: SelectionStore>(
        &mut self,
        mut location: DeliveryLocation,
        ctx: &mut ComponentContext<'_, S>,
        emitter: &mut Emitter,
    ) -> Result<()> {
        if !self.is_packstation() {
            return Err(self.unsupported("select_location"));
        }
        if location.id.trim().is_empty() {
            return Err(DeliveryError::validation(
                codes::FIELD_LOCATION_ID,
                "Please choose a Packstation or post office.",
            ));
        }

        let was_active = self.fields.is_active();
        location.enabled = true;
        self.fields = OptionFields::ParcelPackstation(location);
        ctx.persist(self.kind, &self.fields.persisted());
        self.check_postnumber();

        self.announce(was_active, emitter);
        self.request_totals_refresh(emitter);
        self.refresh_state();
        Ok(())
    }

    pub fn clear_location<S: SelectionStore>(
        &mut self,
        ctx: &mut ComponentContext<'_, S>,
        emitter: &mut Emitter,
    ) -> Result<()> {
        if !self.is_packstation() {
            return Err(self.unsupported("clear_location"));
        }

        let was_active = self.fields.is_active();
        self.fields = OptionFields::empty(self.kind);
        self.postnumber_error = None;
        ctx.persist(self.kind, &self.fields.persisted());

        self.announce(was_active, emitter);
        if was_active {
            self.request_totals_refresh(emitter);
        }
        self.refresh_state();
        Ok(())
    }

    /// Reconciles against the coordinator's announcement. Repeated
    /// announcements of the same winner change nothing.
    pub fn on_active_service_changed<S: SelectionStore>(
        &mut self,
        winner: Option<OptionKind>,
        ctx: &mut ComponentContext<'_, S>,
        emitter: &mut Emitter,
    ) {
        let Some(kind) = self.kind.exclusive() else {
            return;
        };

        if winner != Some(kind) && self.fields.is_active() {
            tracing::info!("🔄 {} yields to {:?}, clearing stored selection", kind, winner);
            self.fields = OptionFields::empty(self.kind);
            self.postnumber_error = None;
            // the in-memory clear and the release go out even if the write fails
            ctx.persist(self.kind, &self.fields.persisted());
            emitter.emit(Event::ReleaseExclusive(kind));
            self.request_totals_refresh(emitter);
        }

        self.disabled = !self.available || matches!(winner, Some(w) if w != kind);
        self.refresh_state();
    }

    pub fn on_address_saved(
        &mut self,
        available: bool,
        address: Option<&ShippingAddress>,
        winner: Option<OptionKind>,
    ) {
        self.available = available;
        self.update_search_address(address);
        self.disabled = match self.kind.exclusive() {
            Some(kind) => !available || matches!(winner, Some(w) if w != kind),
            None => !available,
        };
        self.refresh_state();
    }

    /// Checkout-step gate. Only an active Packstation selection can block.
    pub fn validate_completion(&self) -> Completion {
        match &self.fields {
            OptionFields::ParcelPackstation(location) if self.fields.is_active() => {
                match validate_postnumber(&location.location_type, &location.customer_postnumber) {
                    Ok(()) => Completion::Pass,
                    Err(e) => Completion::Blocked(ValidationRef {
                        option: self.kind,
                        field: codes::FIELD_POSTNUMBER.to_string(),
                        message: e.user_friendly_message(),
                    }),
                }
            }
            _ => Completion::Pass,
        }
    }

    pub fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            kind: self.kind,
            state: self.state,
            disabled: self.disabled,
            fee: self.fee,
            charge: self.charge(),
            fields: self.fields.to_map(),
            validation_message: self.postnumber_error.clone(),
        }
    }

    fn announce(&self, was_active: bool, emitter: &mut Emitter) {
        let Some(kind) = self.kind.exclusive() else {
            return;
        };
        match (was_active, self.fields.is_active()) {
            (false, true) => emitter.emit(Event::RequestExclusive(kind)),
            (true, false) => emitter.emit(Event::ReleaseExclusive(kind)),
            _ => {}
        }
    }

    fn request_totals_refresh(&self, emitter: &mut Emitter) {
        if self.fee > 0.0 {
            emitter.emit(Event::TotalsRefreshRequested(self.kind));
        }
    }

    fn check_postnumber(&mut self) {
        if let OptionFields::ParcelPackstation(location) = &self.fields {
            self.postnumber_error =
                validate_postnumber(&location.location_type, &location.customer_postnumber)
                    .err()
                    .map(|e| e.user_friendly_message());
        }
    }

    fn update_search_address(&mut self, address: Option<&ShippingAddress>) {
        if self.is_packstation() {
            self.search_address = address.filter(|a| a.is_complete()).cloned();
        }
    }

    fn is_packstation(&self) -> bool {
        self.kind == ComponentKind::Exclusive(OptionKind::ParcelPackstation)
    }

    fn unsupported(&self, operation: &str) -> DeliveryError {
        DeliveryError::UnsupportedOperation {
            option: self.kind.to_string(),
            operation: operation.to_string(),
        }
    }

    fn refresh_state(&mut self) {
        self.state = if self.disabled {
            ComponentState::Disabled
        } else if self.fields.is_active() {
            ComponentState::Active
        } else {
            ComponentState::Inactive
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::model::SelectionRecord;

    struct Harness {
        gateway: SelectionGateway<MemoryStore>,
        address: AddressId,
        notices: Vec<Notice>,
    }

    impl Harness {
        fn new(records: Vec<SelectionRecord>) -> Self {
            let address = AddressId::new("500");
            Self {
                gateway: SelectionGateway::new(MemoryStore::with_records(address.clone(), records)),
                address,
                notices: Vec::new(),
            }
        }

        fn ctx(&mut self) -> ComponentContext<'_, MemoryStore> {
            ComponentContext {
                gateway: &self.gateway,
                address: Some(&self.address),
                notices: &mut self.notices,
            }
        }

        fn mount(&mut self, kind: ComponentKind, conflicts: &[OptionKind]) -> (OptionComponent, Vec<Event>) {
            let mut component = OptionComponent::new(kind);
            let mut emitter = Emitter::new();
            component.mount(
                &mut self.ctx(),
                MountOptions {
                    available: true,
                    fee: 1.2,
                    conflicts,
                    address: None,
                },
                &mut emitter,
            );
            (component, emitter.take())
        }
    }

    #[test]
    fn test_mount_with_value_requests_exclusivity() {
        let mut h = Harness::new(vec![SelectionRecord::new(
            codes::PREFERRED_LOCATION,
            codes::FIELD_DETAILS,
            "Garage",
        )]);

        let (component, events) = h.mount(OptionKind::PreferredLocation.into(), &[]);
        assert_eq!(component.state(), ComponentState::Active);
        assert_eq!(events, vec![Event::RequestExclusive(OptionKind::PreferredLocation)]);
    }

    #[test]
    fn test_mount_disabled_by_conflict_emits_nothing() {
        let mut h = Harness::new(vec![SelectionRecord::new(
            codes::PREFERRED_LOCATION,
            codes::FIELD_DETAILS,
            "Garage",
        )]);

        let (component, events) = h.mount(
            OptionKind::NoNeighbor.into(),
            &[OptionKind::PreferredLocation, OptionKind::PreferredNeighbor],
        );
        assert_eq!(component.state(), ComponentState::Disabled);
        assert!(events.is_empty());

        let (component, _) = h.mount(OptionKind::NoNeighbor.into(), &[OptionKind::PreferredNeighbor]);
        assert_eq!(component.state(), ComponentState::Inactive);
    }

    #[test]
    fn test_edit_transitions_emit_request_and_release() {
        let mut h = Harness::new(vec![]);
        let (mut component, _) = h.mount(OptionKind::PreferredNeighbor.into(), &[]);
        let mut emitter = Emitter::new();

        component
            .edit(codes::FIELD_NAME, "Frau Müller", &mut h.ctx(), &mut emitter)
            .unwrap();
        component
            .edit(codes::FIELD_ADDRESS, "Hauptstr. 3", &mut h.ctx(), &mut emitter)
            .unwrap();
        component.edit(codes::FIELD_NAME, "", &mut h.ctx(), &mut emitter).unwrap();
        component.edit(codes::FIELD_ADDRESS, "", &mut h.ctx(), &mut emitter).unwrap();

        let exclusivity: Vec<Event> = emitter
            .take()
            .into_iter()
            .filter(|e| !matches!(e, Event::TotalsRefreshRequested(_)))
            .collect();
        assert_eq!(
            exclusivity,
            vec![
                Event::RequestExclusive(OptionKind::PreferredNeighbor),
                Event::ReleaseExclusive(OptionKind::PreferredNeighbor),
            ]
        );
        assert!(h.gateway.load_all(Some(&h.address)).unwrap().is_empty());
    }

    #[test]
    fn test_losing_component_clears_and_releases() {
        let mut h = Harness::new(vec![SelectionRecord::new(
            codes::PREFERRED_DAY,
            codes::FIELD_DATE,
            "2024-05-01",
        )]);
        let (mut component, _) = h.mount(OptionKind::PreferredDay.into(), &[]);
        let mut emitter = Emitter::new();

        component.on_active_service_changed(Some(OptionKind::NoNeighbor), &mut h.ctx(), &mut emitter);
        assert!(!component.is_active());
        assert!(component.is_disabled());
        assert!(emitter
            .take()
            .contains(&Event::ReleaseExclusive(OptionKind::PreferredDay)));

        // same announcement again is a no-op
        component.on_active_service_changed(Some(OptionKind::NoNeighbor), &mut h.ctx(), &mut emitter);
        assert!(emitter.is_empty());
        assert!(h
            .gateway
            .load_group(Some(&h.address), codes::PREFERRED_DAY)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_addons_ignore_exclusivity() {
        let mut h = Harness::new(vec![SelectionRecord::new(
            codes::GOGREEN_PLUS,
            codes::FIELD_ENABLED,
            "1",
        )]);
        let (mut component, events) = h.mount(crate::domain::model::AddonKind::GoGreenPlus.into(), &[]);
        assert!(events.is_empty());

        let mut emitter = Emitter::new();
        component.on_active_service_changed(Some(OptionKind::PreferredDay), &mut h.ctx(), &mut emitter);
        assert!(component.is_active());
        assert!(!component.is_disabled());
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_packstation_completion_gate() {
        let mut h = Harness::new(vec![]);
        let (mut component, _) = h.mount(OptionKind::ParcelPackstation.into(), &[]);
        assert!(component.validate_completion().is_pass());

        let mut emitter = Emitter::new();
        component
            .select_location(
                DeliveryLocation {
                    location_type: "locker".to_string(),
                    id: "8003-4711".to_string(),
                    number: "123".to_string(),
                    ..Default::default()
                },
                &mut h.ctx(),
                &mut emitter,
            )
            .unwrap();
        assert!(component.validation_message().is_some());
        match component.validate_completion() {
            Completion::Blocked(reference) => assert_eq!(reference.field, codes::FIELD_POSTNUMBER),
            Completion::Pass => panic!("locker without post number must block"),
        }

        component
            .edit(codes::FIELD_POSTNUMBER, "12345678", &mut h.ctx(), &mut emitter)
            .unwrap();
        assert!(component.validation_message().is_none());
        assert!(component.validate_completion().is_pass());
    }

    #[test]
    fn test_emptying_location_id_clears_whole_location() {
        let mut h = Harness::new(vec![
            SelectionRecord::new(codes::DELIVERY_LOCATION, codes::FIELD_LOCATION_ID, "8003-4711"),
            SelectionRecord::new(codes::DELIVERY_LOCATION, codes::FIELD_LOCATION_TYPE, "locker"),
            SelectionRecord::new(codes::DELIVERY_LOCATION, codes::FIELD_CITY, "Bonn"),
            SelectionRecord::new(codes::DELIVERY_LOCATION, codes::FIELD_ENABLED, "1"),
        ]);
        let (mut component, _) = h.mount(OptionKind::ParcelPackstation.into(), &[]);
        assert!(component.is_active());

        let mut emitter = Emitter::new();
        component
            .edit(codes::FIELD_LOCATION_ID, "", &mut h.ctx(), &mut emitter)
            .unwrap();

        assert!(!component.is_active());
        assert!(emitter
            .take()
            .contains(&Event::ReleaseExclusive(OptionKind::ParcelPackstation)));
        assert!(h.gateway.load_all(Some(&h.address)).unwrap().is_empty());
    }

    #[test]
    fn test_closest_drop_point_charged_only_while_enabled() {
        let mut h = Harness::new(vec![]);
        let (mut component, events) =
            h.mount(crate::domain::model::AddonKind::ClosestDropPoint.into(), &[]);
        assert!(events.is_empty());
        assert_eq!(component.fee(), 1.2);
        assert_eq!(component.charge(), 0.0);

        let mut emitter = Emitter::new();
        component
            .edit(codes::FIELD_ENABLED, "1", &mut h.ctx(), &mut emitter)
            .unwrap();
        assert_eq!(component.charge(), 1.2);
        assert_eq!(
            emitter.take(),
            vec![Event::TotalsRefreshRequested(
                crate::domain::model::AddonKind::ClosestDropPoint.into()
            )]
        );
        assert_eq!(
            h.gateway
                .load_group(Some(&h.address), codes::CLOSEST_DROP_POINT)
                .unwrap()
                .value(codes::FIELD_ENABLED),
            "1"
        );

        component
            .edit(codes::FIELD_ENABLED, "0", &mut h.ctx(), &mut emitter)
            .unwrap();
        assert_eq!(component.charge(), 0.0);
    }

    #[test]
    fn test_select_location_rejected_on_other_options() {
        let mut h = Harness::new(vec![]);
        let (mut component, _) = h.mount(OptionKind::NoNeighbor.into(), &[]);
        let err = component
            .select_location(DeliveryLocation::default(), &mut h.ctx(), &mut Emitter::new())
            .unwrap_err();
        assert!(matches!(err, DeliveryError::UnsupportedOperation { .. }));
    }
}
