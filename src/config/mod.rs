pub mod scenario;
pub mod toml_config;

pub use scenario::{Scenario, ScenarioStep};
pub use toml_config::{CheckoutConfig, DeliveryConfig};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "delivery-options")]
#[command(about = "Replays a checkout scenario against the DHL delivery options")]
pub struct CliConfig {
    #[arg(long, help = "Checkout scenario (TOML)")]
    pub scenario: String,

    #[arg(long, help = "Delivery configuration (TOML); defaults apply when omitted")]
    pub config: Option<String>,

    #[arg(long, default_value = "./selections")]
    pub store_dir: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::validate_path;

        validate_path("scenario", &self.scenario)?;
        validate_path("store_dir", &self.store_dir)?;
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
