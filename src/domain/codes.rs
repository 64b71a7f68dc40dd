//! Option and field codes as they appear in the selection store.

pub const PREFERRED_DAY: &str = "preferredDay";
pub const PREFERRED_LOCATION: &str = "preferredLocation";
pub const PREFERRED_NEIGHBOR: &str = "preferredNeighbour";
pub const NO_NEIGHBOR: &str = "noNeighborDelivery";
pub const DELIVERY_LOCATION: &str = "deliveryLocation";
pub const GOGREEN_PLUS: &str = "goGreenPlus";
pub const PARCEL_ANNOUNCEMENT: &str = "parcelAnnouncement";
pub const CLOSEST_DROP_POINT: &str = "closestDropPoint";

pub const FIELD_DATE: &str = "date";
pub const FIELD_DETAILS: &str = "details";
pub const FIELD_NAME: &str = "name";
pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_ENABLED: &str = "enabled";

pub const FIELD_POSTNUMBER: &str = "customerPostnumber";
pub const FIELD_LOCATION_TYPE: &str = "type";
pub const FIELD_LOCATION_ID: &str = "id";
pub const FIELD_LOCATION_NUMBER: &str = "number";
pub const FIELD_DISPLAY_NAME: &str = "displayName";
pub const FIELD_COMPANY: &str = "company";
pub const FIELD_COUNTRY_CODE: &str = "countryCode";
pub const FIELD_POSTAL_CODE: &str = "postalCode";
pub const FIELD_CITY: &str = "city";
pub const FIELD_STREET: &str = "street";

/// Location type that requires a DHL post number.
pub const LOCATION_TYPE_LOCKER: &str = "locker";

/// Persisted representation of a checked checkbox.
pub const TRUE_VALUE: &str = "1";
