pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{DeliveryConfig, Scenario, ScenarioStep};

pub use adapters::{DomesticCountry, JsonFileStore, MemoryStore, SharedAddress};
pub use core::component::{Completion, ComponentState, OptionComponent, ValidationRef};
pub use core::gateway::SelectionGateway;
pub use core::session::{CheckoutSession, Collaborators, SessionSnapshot};
pub use domain::model::{
    AddonKind, AddressId, ComponentKind, DeliveryLocation, Event, Notice, OptionKind,
    SelectionRecord, ShippingAddress,
};
pub use utils::error::{DeliveryError, Result};
