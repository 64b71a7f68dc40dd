use crate::domain::codes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Delivery services of which at most one may be active per checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
    PreferredDay,
    PreferredLocation,
    PreferredNeighbor,
    NoNeighbor,
    ParcelPackstation,
}

impl OptionKind {
    /// Highest priority first. Used to pick a winner from persisted state.
    pub const PRIORITY: [OptionKind; 5] = [
        OptionKind::PreferredDay,
        OptionKind::PreferredLocation,
        OptionKind::PreferredNeighbor,
        OptionKind::NoNeighbor,
        OptionKind::ParcelPackstation,
    ];

    pub fn option_code(self) -> &'static str {
        match self {
            OptionKind::PreferredDay => codes::PREFERRED_DAY,
            OptionKind::PreferredLocation => codes::PREFERRED_LOCATION,
            OptionKind::PreferredNeighbor => codes::PREFERRED_NEIGHBOR,
            OptionKind::NoNeighbor => codes::NO_NEIGHBOR,
            OptionKind::ParcelPackstation => codes::DELIVERY_LOCATION,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OptionKind::PreferredDay => "preferredDay",
            OptionKind::PreferredLocation => "preferredLocation",
            OptionKind::PreferredNeighbor => "preferredNeighbor",
            OptionKind::NoNeighbor => "noNeighbor",
            OptionKind::ParcelPackstation => "parcelPackstation",
        }
    }

    /// Position in [`OptionKind::PRIORITY`]; lower wins.
    pub fn rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    pub fn outranks(self, other: OptionKind) -> bool {
        self.rank() < other.rank()
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionKind::PRIORITY
            .into_iter()
            .find(|kind| kind.name() == s || kind.option_code() == s)
            .ok_or_else(|| format!("unknown exclusive option '{}'", s))
    }
}

/// Add-on services that never take part in exclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddonKind {
    GoGreenPlus,
    ParcelAnnouncement,
    /// Delivery to the drop point closest to the shipping address.
    ClosestDropPoint,
}

impl AddonKind {
    pub const ALL: [AddonKind; 3] = [
        AddonKind::GoGreenPlus,
        AddonKind::ParcelAnnouncement,
        AddonKind::ClosestDropPoint,
    ];

    pub fn option_code(self) -> &'static str {
        match self {
            AddonKind::GoGreenPlus => codes::GOGREEN_PLUS,
            AddonKind::ParcelAnnouncement => codes::PARCEL_ANNOUNCEMENT,
            AddonKind::ClosestDropPoint => codes::CLOSEST_DROP_POINT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AddonKind::GoGreenPlus => "goGreenPlus",
            AddonKind::ParcelAnnouncement => "parcelAnnouncement",
            AddonKind::ClosestDropPoint => "closestDropPoint",
        }
    }
}

/// Any option component mounted in the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentKind {
    Exclusive(OptionKind),
    Addon(AddonKind),
}

impl ComponentKind {
    /// Mount order: exclusive options by priority, add-ons last.
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Exclusive(OptionKind::PreferredDay),
        ComponentKind::Exclusive(OptionKind::PreferredLocation),
        ComponentKind::Exclusive(OptionKind::PreferredNeighbor),
        ComponentKind::Exclusive(OptionKind::NoNeighbor),
        ComponentKind::Exclusive(OptionKind::ParcelPackstation),
        ComponentKind::Addon(AddonKind::GoGreenPlus),
        ComponentKind::Addon(AddonKind::ParcelAnnouncement),
        ComponentKind::Addon(AddonKind::ClosestDropPoint),
    ];

    pub fn option_code(self) -> &'static str {
        match self {
            ComponentKind::Exclusive(kind) => kind.option_code(),
            ComponentKind::Addon(kind) => kind.option_code(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Exclusive(kind) => kind.name(),
            ComponentKind::Addon(kind) => kind.name(),
        }
    }

    pub fn exclusive(self) -> Option<OptionKind> {
        match self {
            ComponentKind::Exclusive(kind) => Some(kind),
            ComponentKind::Addon(_) => None,
        }
    }
}

impl From<OptionKind> for ComponentKind {
    fn from(kind: OptionKind) -> Self {
        ComponentKind::Exclusive(kind)
    }
}

impl From<AddonKind> for ComponentKind {
    fn from(kind: AddonKind) -> Self {
        ComponentKind::Addon(kind)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.option_code() == s)
            .ok_or_else(|| format!("unknown delivery option '{}'", s))
    }
}

impl TryFrom<String> for ComponentKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.name().to_string()
    }
}

/// Opaque identity of the shipping address selections are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(String);

impl AddressId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted `(option, field, value)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub option_code: String,
    pub field_code: String,
    pub value: String,
}

impl SelectionRecord {
    pub fn new(
        option_code: impl Into<String>,
        field_code: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            option_code: option_code.into(),
            field_code: field_code.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, option_code: &str, field_code: &str) -> bool {
        self.option_code == option_code && self.field_code == field_code
    }
}

/// Persisted records of a single option, keyed by field code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionGroup(BTreeMap<String, SelectionRecord>);

impl SelectionGroup {
    pub fn from_records<'a>(
        option_code: &str,
        records: impl IntoIterator<Item = &'a SelectionRecord>,
    ) -> Self {
        Self(
            records
                .into_iter()
                .filter(|record| record.option_code == option_code)
                .map(|record| (record.field_code.clone(), record.clone()))
                .collect(),
        )
    }

    /// Value of `field_code`, empty when absent.
    pub fn value(&self, field_code: &str) -> &str {
        self.0
            .get(field_code)
            .map(|record| record.value.as_str())
            .unwrap_or("")
    }

    pub fn get(&self, field_code: &str) -> Option<&SelectionRecord> {
        self.0.get(field_code)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Loose truthiness of a stored flag: anything but empty, "0" or "false".
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub id: Option<AddressId>,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
}

impl ShippingAddress {
    /// All parts needed to search for nearby lockers are present.
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.postal_code, &self.city, &self.country_id]
            .iter()
            .all(|part| !part.trim().is_empty())
    }
}

/// Packstation / post office chosen in the locker finder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryLocation {
    pub enabled: bool,
    pub customer_postnumber: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub id: String,
    pub number: String,
    pub display_name: String,
    pub company: String,
    pub country_code: String,
    pub postal_code: String,
    pub city: String,
    pub street: String,
}

impl DeliveryLocation {
    pub const FIELDS: [&'static str; 11] = [
        codes::FIELD_ENABLED,
        codes::FIELD_POSTNUMBER,
        codes::FIELD_LOCATION_TYPE,
        codes::FIELD_LOCATION_ID,
        codes::FIELD_LOCATION_NUMBER,
        codes::FIELD_DISPLAY_NAME,
        codes::FIELD_COMPANY,
        codes::FIELD_COUNTRY_CODE,
        codes::FIELD_POSTAL_CODE,
        codes::FIELD_CITY,
        codes::FIELD_STREET,
    ];

    pub fn is_locker(&self) -> bool {
        self.location_type == codes::LOCATION_TYPE_LOCKER
    }
}

/// Messages on the checkout event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum Event {
    RequestExclusive(OptionKind),
    ReleaseExclusive(OptionKind),
    ActiveServiceChanged(Option<OptionKind>),
    AddressSaved,
    TotalsRefreshRequested(ComponentKind),
}

/// User-visible, non-fatal message raised during a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub option: Option<ComponentKind>,
    pub message: String,
}
