use crate::domain::model::{ComponentKind, DeliveryLocation, ShippingAddress};
use crate::utils::error::{DeliveryError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scripted checkout interaction replayed by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Shipping address saved before the checkout mounts.
    pub address: Option<ShippingAddress>,
    #[serde(default, rename = "step")]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ScenarioStep {
    Edit {
        option: ComponentKind,
        field: String,
        #[serde(default)]
        value: String,
    },
    SelectPackstation {
        location: DeliveryLocation,
    },
    ClearPackstation,
    /// Replaces the shipping address (when given) and announces it.
    AddressSaved {
        address: Option<ShippingAddress>,
    },
    /// Starts a new checkout request against the same store.
    Reload,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Validate for Scenario {
    fn validate(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                ScenarioStep::Edit { field, .. } => {
                    validate_non_empty_string(&format!("step[{}].field", index), field)?;
                }
                ScenarioStep::SelectPackstation { location } if location.id.trim().is_empty() => {
                    return Err(DeliveryError::MissingConfigError {
                        field: format!("step[{}].location.id", index),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
