use clap::Parser;
use dhl_delivery_options::utils::error::{DeliveryError, ErrorSeverity};
use dhl_delivery_options::utils::{logger, validation::Validate};
use dhl_delivery_options::{
    CheckoutSession, CliConfig, Collaborators, Completion, DeliveryConfig, DomesticCountry,
    JsonFileStore, Scenario, ScenarioStep, SelectionGateway, SessionSnapshot, SharedAddress,
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(logger::LogFormat::from_flag(config.json_logs), config.verbose);

    tracing::info!("Starting delivery-options CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match replay(&config) {
        Ok(snapshot) => {
            if let Completion::Blocked(reference) = &snapshot.completion {
                tracing::warn!(
                    "🚧 Checkout cannot continue: {}.{} ({})",
                    reference.option,
                    reference.field,
                    reference.message
                );
            }
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            tracing::info!("✅ Scenario replayed successfully!");
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Scenario failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,      // 警告，但成功
                ErrorSeverity::Medium => 2,   // 儲存失敗
                ErrorSeverity::High => 1,     // 使用錯誤
                ErrorSeverity::Critical => 3, // 配置錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn replay(config: &CliConfig) -> Result<SessionSnapshot, DeliveryError> {
    let delivery = match &config.config {
        Some(path) => DeliveryConfig::from_file(path)?,
        None => DeliveryConfig::default(),
    };
    delivery.validate()?;

    let scenario = Scenario::from_file(&config.scenario)?;
    scenario.validate()?;
    tracing::info!("📋 Loaded scenario with {} steps", scenario.steps.len());

    let gateway = Arc::new(SelectionGateway::new(JsonFileStore::new(&config.store_dir)));
    let address = SharedAddress::new(scenario.address.clone());
    let mount = || {
        CheckoutSession::mount(
            Arc::clone(&gateway),
            Collaborators {
                address: Box::new(address.clone()),
                validator: Box::new(DomesticCountry::new(
                    delivery.checkout.domestic_country.clone(),
                )),
                fees: Box::new(delivery.clone()),
            },
            &delivery,
        )
    };

    let mut session = mount();
    for (index, step) in scenario.steps.into_iter().enumerate() {
        let outcome = match step {
            ScenarioStep::Edit {
                option,
                field,
                value,
            } => session.edit(option, &field, &value),
            ScenarioStep::SelectPackstation { location } => session.select_packstation(location),
            ScenarioStep::ClearPackstation => session.clear_packstation(),
            ScenarioStep::AddressSaved { address: saved } => {
                if let Some(saved) = saved {
                    address.replace(Some(saved));
                }
                session.address_saved();
                Ok(())
            }
            ScenarioStep::Reload => {
                tracing::info!("🔄 Reloading checkout");
                session = mount();
                Ok(())
            }
        };

        if let Err(e) = outcome {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::warn!("⚠️ Step {} rejected: {}", index + 1, e.user_friendly_message());
        }
    }

    for notice in session.notices() {
        tracing::warn!("📢 {}", notice.message);
    }

    Ok(session.snapshot())
}
