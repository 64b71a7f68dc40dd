use crate::domain::codes;
use crate::domain::model::{is_truthy, AddonKind, ComponentKind, DeliveryLocation, OptionKind, SelectionGroup};
use crate::utils::error::{DeliveryError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Typed field values of one option component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionFields {
    PreferredDay { date: String },
    PreferredLocation { details: String },
    PreferredNeighbor { name: String, address: String },
    NoNeighbor { enabled: bool },
    ParcelPackstation(DeliveryLocation),
    GoGreenPlus { enabled: bool },
    ParcelAnnouncement { enabled: bool },
    ClosestDropPoint { enabled: bool },
}

fn flag(enabled: bool) -> String {
    if enabled {
        codes::TRUE_VALUE.to_string()
    } else {
        String::new()
    }
}

impl OptionFields {
    pub fn empty(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Exclusive(OptionKind::PreferredDay) => Self::PreferredDay {
                date: String::new(),
            },
            ComponentKind::Exclusive(OptionKind::PreferredLocation) => Self::PreferredLocation {
                details: String::new(),
            },
            ComponentKind::Exclusive(OptionKind::PreferredNeighbor) => Self::PreferredNeighbor {
                name: String::new(),
                address: String::new(),
            },
            ComponentKind::Exclusive(OptionKind::NoNeighbor) => Self::NoNeighbor { enabled: false },
            ComponentKind::Exclusive(OptionKind::ParcelPackstation) => {
                Self::ParcelPackstation(DeliveryLocation::default())
            }
            ComponentKind::Addon(AddonKind::GoGreenPlus) => Self::GoGreenPlus { enabled: false },
            ComponentKind::Addon(AddonKind::ParcelAnnouncement) => {
                Self::ParcelAnnouncement { enabled: false }
            }
            ComponentKind::Addon(AddonKind::ClosestDropPoint) => {
                Self::ClosestDropPoint { enabled: false }
            }
        }
    }

    /// Builds the fields from persisted records. Values are taken as stored;
    /// format checks only apply to edits.
    pub fn from_group(kind: ComponentKind, group: &SelectionGroup) -> Self {
        let mut fields = Self::empty(kind);
        for field in fields.field_codes() {
            let value = group.value(field);
            if !value.is_empty() {
                fields.assign(field, value);
            }
        }

        if let Self::ParcelPackstation(location) = &mut fields {
            if !location.id.is_empty() {
                location.enabled = true;
            }
        }
        fields
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::PreferredDay { .. } => OptionKind::PreferredDay.into(),
            Self::PreferredLocation { .. } => OptionKind::PreferredLocation.into(),
            Self::PreferredNeighbor { .. } => OptionKind::PreferredNeighbor.into(),
            Self::NoNeighbor { .. } => OptionKind::NoNeighbor.into(),
            Self::ParcelPackstation(_) => OptionKind::ParcelPackstation.into(),
            Self::GoGreenPlus { .. } => AddonKind::GoGreenPlus.into(),
            Self::ParcelAnnouncement { .. } => AddonKind::ParcelAnnouncement.into(),
            Self::ClosestDropPoint { .. } => AddonKind::ClosestDropPoint.into(),
        }
    }

    pub fn field_codes(&self) -> &'static [&'static str] {
        match self {
            Self::PreferredDay { .. } => &[codes::FIELD_DATE],
            Self::PreferredLocation { .. } => &[codes::FIELD_DETAILS],
            Self::PreferredNeighbor { .. } => &[codes::FIELD_NAME, codes::FIELD_ADDRESS],
            Self::NoNeighbor { .. }
            | Self::GoGreenPlus { .. }
            | Self::ParcelAnnouncement { .. }
            | Self::ClosestDropPoint { .. } => &[codes::FIELD_ENABLED],
            Self::ParcelPackstation(_) => &DeliveryLocation::FIELDS,
        }
    }

    /// Whether the fields encode a selection. For exclusive options this is
    /// the "has value" test shared by mount and the initial-state scan.
    pub fn is_active(&self) -> bool {
        match self {
            Self::PreferredDay { date } => !date.is_empty(),
            Self::PreferredLocation { details } => !details.is_empty(),
            Self::PreferredNeighbor { name, address } => !name.is_empty() || !address.is_empty(),
            Self::NoNeighbor { enabled }
            | Self::GoGreenPlus { enabled }
            | Self::ParcelAnnouncement { enabled }
            | Self::ClosestDropPoint { enabled } => *enabled,
            Self::ParcelPackstation(location) => !location.id.is_empty(),
        }
    }

    /// Applies an edit coming from the checkout form.
    pub fn set(&mut self, field: &str, value: &str) -> Result<()> {
        if !self.field_codes().contains(&field) {
            return Err(DeliveryError::UnknownField {
                option: self.kind().to_string(),
                field: field.to_string(),
            });
        }

        if matches!(self, Self::PreferredDay { .. }) && !value.is_empty() {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                DeliveryError::validation(
                    codes::FIELD_DATE,
                    format!("'{}' is not a valid delivery date (expected YYYY-MM-DD)", value),
                )
            })?;
        }

        self.assign(field, value);
        Ok(())
    }

    fn assign(&mut self, field: &str, value: &str) {
        let value = value.to_string();
        match self {
            Self::PreferredDay { date } => *date = value,
            Self::PreferredLocation { details } => *details = value,
            Self::PreferredNeighbor { name, address } => match field {
                codes::FIELD_NAME => *name = value,
                _ => *address = value,
            },
            Self::NoNeighbor { enabled }
            | Self::GoGreenPlus { enabled }
            | Self::ParcelAnnouncement { enabled }
            | Self::ClosestDropPoint { enabled } => *enabled = is_truthy(&value),
            Self::ParcelPackstation(location) => match field {
                codes::FIELD_ENABLED => location.enabled = is_truthy(&value),
                codes::FIELD_POSTNUMBER => location.customer_postnumber = value,
                codes::FIELD_LOCATION_TYPE => location.location_type = value,
                codes::FIELD_LOCATION_ID => location.id = value,
                codes::FIELD_LOCATION_NUMBER => location.number = value,
                codes::FIELD_DISPLAY_NAME => location.display_name = value,
                codes::FIELD_COMPANY => location.company = value,
                codes::FIELD_COUNTRY_CODE => location.country_code = value,
                codes::FIELD_POSTAL_CODE => location.postal_code = value,
                codes::FIELD_CITY => location.city = value,
                codes::FIELD_STREET => location.street = value,
                _ => {}
            },
        }
    }

    /// Stored form of a single field; empty means "remove".
    pub fn value(&self, field: &str) -> String {
        match self {
            Self::PreferredDay { date } => date.clone(),
            Self::PreferredLocation { details } => details.clone(),
            Self::PreferredNeighbor { name, address } => match field {
                codes::FIELD_NAME => name.clone(),
                _ => address.clone(),
            },
            Self::NoNeighbor { enabled }
            | Self::GoGreenPlus { enabled }
            | Self::ParcelAnnouncement { enabled }
            | Self::ClosestDropPoint { enabled } => flag(*enabled),
            Self::ParcelPackstation(location) => match field {
                codes::FIELD_ENABLED => flag(location.enabled),
                codes::FIELD_POSTNUMBER => location.customer_postnumber.clone(),
                codes::FIELD_LOCATION_TYPE => location.location_type.clone(),
                codes::FIELD_LOCATION_ID => location.id.clone(),
                codes::FIELD_LOCATION_NUMBER => location.number.clone(),
                codes::FIELD_DISPLAY_NAME => location.display_name.clone(),
                codes::FIELD_COMPANY => location.company.clone(),
                codes::FIELD_COUNTRY_CODE => location.country_code.clone(),
                codes::FIELD_POSTAL_CODE => location.postal_code.clone(),
                codes::FIELD_CITY => location.city.clone(),
                codes::FIELD_STREET => location.street.clone(),
                _ => String::new(),
            },
        }
    }

    /// Every field in stored form, in declaration order.
    pub fn persisted(&self) -> Vec<(&'static str, String)> {
        self.field_codes()
            .iter()
            .map(|field| (*field, self.value(field)))
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.persisted()
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (field.to_string(), value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SelectionRecord;

    fn group(option: &str, pairs: &[(&str, &str)]) -> SelectionGroup {
        let records: Vec<SelectionRecord> = pairs
            .iter()
            .map(|(field, value)| SelectionRecord::new(option, *field, *value))
            .collect();
        SelectionGroup::from_records(option, &records)
    }

    #[test]
    fn test_has_value_predicates() {
        let day = OptionFields::from_group(
            OptionKind::PreferredDay.into(),
            &group(codes::PREFERRED_DAY, &[(codes::FIELD_DATE, "2024-05-01")]),
        );
        assert!(day.is_active());

        let neighbor = OptionFields::from_group(
            OptionKind::PreferredNeighbor.into(),
            &group(codes::PREFERRED_NEIGHBOR, &[(codes::FIELD_ADDRESS, "Hauptstr. 1")]),
        );
        assert!(neighbor.is_active());

        let no_neighbor = OptionFields::from_group(
            OptionKind::NoNeighbor.into(),
            &group(codes::NO_NEIGHBOR, &[(codes::FIELD_ENABLED, "0")]),
        );
        assert!(!no_neighbor.is_active());

        let packstation = OptionFields::from_group(
            OptionKind::ParcelPackstation.into(),
            &group(codes::DELIVERY_LOCATION, &[(codes::FIELD_CITY, "Bonn")]),
        );
        assert!(!packstation.is_active());
    }

    #[test]
    fn test_packstation_with_id_is_enabled_on_load() {
        let fields = OptionFields::from_group(
            OptionKind::ParcelPackstation.into(),
            &group(codes::DELIVERY_LOCATION, &[(codes::FIELD_LOCATION_ID, "8003-4711")]),
        );

        match fields {
            OptionFields::ParcelPackstation(location) => {
                assert!(location.enabled);
                assert_eq!(location.id, "8003-4711");
            }
            other => panic!("unexpected fields {:?}", other),
        }
    }

    #[test]
    fn test_set_rejects_unknown_field() {
        let mut fields = OptionFields::empty(OptionKind::PreferredLocation.into());
        let err = fields.set("date", "2024-05-01").unwrap_err();
        assert!(matches!(err, DeliveryError::UnknownField { .. }));
    }

    #[test]
    fn test_set_validates_preferred_day() {
        let mut fields = OptionFields::empty(OptionKind::PreferredDay.into());
        assert!(fields.set(codes::FIELD_DATE, "01.05.2024").is_err());
        assert!(!fields.is_active());

        fields.set(codes::FIELD_DATE, "2024-05-01").unwrap();
        assert!(fields.is_active());
        fields.set(codes::FIELD_DATE, "").unwrap();
        assert!(!fields.is_active());
    }

    #[test]
    fn test_flags_persist_as_one_or_empty() {
        let mut fields = OptionFields::empty(AddonKind::GoGreenPlus.into());
        fields.set(codes::FIELD_ENABLED, "true").unwrap();
        assert_eq!(fields.value(codes::FIELD_ENABLED), "1");

        fields.set(codes::FIELD_ENABLED, "0").unwrap();
        assert_eq!(fields.value(codes::FIELD_ENABLED), "");
    }

    #[test]
    fn test_to_map_skips_empty_values() {
        let mut fields = OptionFields::empty(OptionKind::PreferredNeighbor.into());
        fields.set(codes::FIELD_NAME, "Frau Müller").unwrap();

        let map = fields.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map[codes::FIELD_NAME], "Frau Müller");
    }
}
