use crate::core::fields::OptionFields;
use crate::core::gateway::SelectionGateway;
use crate::domain::model::{AddressId, OptionKind, SelectionGroup, SelectionRecord};
use crate::domain::ports::SelectionStore;
use crate::utils::error::Result;

/// Reconstructs the active exclusive option from persisted selections.
///
/// Stored data may hold more than one non-empty exclusive option (old bugs,
/// migrations); the first kind in [`OptionKind::PRIORITY`] with a value wins.
pub fn detect_active_service<S: SelectionStore>(
    gateway: &SelectionGateway<S>,
    address: Option<&AddressId>,
) -> Result<Option<OptionKind>> {
    for kind in OptionKind::PRIORITY {
        let group = gateway.load_group(address, kind.option_code())?;
        if has_value(kind, &group) {
            tracing::debug!("Detected persisted selection for {}", kind);
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Same scan over an already loaded record set.
pub fn detect_in_records(records: &[SelectionRecord]) -> Option<OptionKind> {
    OptionKind::PRIORITY.into_iter().find(|kind| {
        let group = SelectionGroup::from_records(kind.option_code(), records);
        has_value(*kind, &group)
    })
}

/// Every exclusive kind that currently holds a value, by priority.
pub fn kinds_with_value(records: &[SelectionRecord]) -> Vec<OptionKind> {
    OptionKind::PRIORITY
        .into_iter()
        .filter(|kind| {
            let group = SelectionGroup::from_records(kind.option_code(), records);
            has_value(*kind, &group)
        })
        .collect()
}

pub fn has_value(kind: OptionKind, group: &SelectionGroup) -> bool {
    OptionFields::from_group(kind.into(), group).is_active()
}
