use crate::domain::model::{ComponentKind, OptionKind};
use crate::domain::ports::{CheckoutSettings, FeeProvider};
use crate::utils::error::{DeliveryError, Result};
use crate::utils::validation::{validate_country_code, validate_fee, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub checkout: CheckoutConfig,
    /// Surcharge per option name, shared by all store views.
    #[serde(default)]
    pub fees: BTreeMap<String, f64>,
    /// Per store view overrides, keyed by store id.
    #[serde(default)]
    pub store_fees: BTreeMap<String, BTreeMap<String, f64>>,
    /// Option name -> options whose stored value disables it on load.
    /// Options without an entry conflict with every other option.
    #[serde(default)]
    pub conflicts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_domestic_country")]
    pub domestic_country: String,
    #[serde(default = "default_store_id")]
    pub store_id: u32,
}

fn default_domestic_country() -> String {
    "DE".to_string()
}

fn default_store_id() -> u32 {
    1
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            domestic_country: default_domestic_country(),
            store_id: default_store_id(),
        }
    }
}

impl DeliveryConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeliveryError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DHL_STORE_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeliveryError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_country_code("checkout.domestic_country", &self.checkout.domestic_country)?;

        for (name, fee) in &self.fees {
            parse_component("fees", name)?;
            validate_fee(&format!("fees.{}", name), *fee)?;
        }

        for (store, fees) in &self.store_fees {
            store.parse::<u32>().map_err(|_| DeliveryError::InvalidConfigValueError {
                field: "store_fees".to_string(),
                value: store.clone(),
                reason: "Store view ids are positive integers".to_string(),
            })?;
            for (name, fee) in fees {
                parse_component("store_fees", name)?;
                validate_fee(&format!("store_fees.{}.{}", store, name), *fee)?;
            }
        }

        for (name, others) in &self.conflicts {
            let field = format!("conflicts.{}", name);
            let kind = parse_exclusive(&field, name)?;
            for other in others {
                if parse_exclusive(&field, other)? == kind {
                    return Err(DeliveryError::InvalidConfigValueError {
                        field,
                        value: other.clone(),
                        reason: "An option cannot conflict with itself".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// 取得商店設定的附加費用，找不到時回傳 0
    pub fn fee_for(&self, kind: ComponentKind, store_id: u32) -> f64 {
        let lookup = |fees: &BTreeMap<String, f64>| {
            fees.iter()
                .find(|(name, _)| name.parse::<ComponentKind>().ok() == Some(kind))
                .map(|(_, fee)| *fee)
        };

        self.store_fees
            .get(&store_id.to_string())
            .and_then(lookup)
            .or_else(|| lookup(&self.fees))
            .unwrap_or(0.0)
    }

    pub fn conflict_list(&self, kind: OptionKind) -> Vec<OptionKind> {
        let configured = self
            .conflicts
            .iter()
            .find(|(name, _)| name.parse::<OptionKind>().ok() == Some(kind));

        match configured {
            Some((_, others)) => others
                .iter()
                .filter_map(|other| other.parse::<OptionKind>().ok())
                .filter(|other| *other != kind)
                .collect(),
            None => OptionKind::PRIORITY
                .into_iter()
                .filter(|other| *other != kind)
                .collect(),
        }
    }
}

fn parse_component(field: &str, name: &str) -> Result<ComponentKind> {
    name.parse().map_err(|_| DeliveryError::InvalidConfigValueError {
        field: field.to_string(),
        value: name.to_string(),
        reason: "Unknown delivery option".to_string(),
    })
}

fn parse_exclusive(field: &str, name: &str) -> Result<OptionKind> {
    name.parse().map_err(|_| DeliveryError::InvalidConfigValueError {
        field: field.to_string(),
        value: name.to_string(),
        reason: "Only exclusive delivery services take part in conflicts".to_string(),
    })
}

impl CheckoutSettings for DeliveryConfig {
    fn store_id(&self) -> u32 {
        self.checkout.store_id
    }

    fn conflicts_for(&self, kind: OptionKind) -> Vec<OptionKind> {
        self.conflict_list(kind)
    }
}

impl FeeProvider for DeliveryConfig {
    fn fee(&self, kind: ComponentKind, store_id: u32) -> f64 {
        self.fee_for(kind, store_id)
    }
}

impl Validate for DeliveryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
