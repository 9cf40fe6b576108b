//! Orchestration-engine entry point: `account-module <args-file>`.

use account_service::config::AccountsConfig;
use account_service::plugin::{ModuleArgs, ModuleResult, ModuleRunner};
use account_service::startup::{spawn_shutdown_watcher, AppState};
use service_core::observability::{init_tracing, shutdown_tracing};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let result = run().await;
    shutdown_tracing();

    match serde_json::to_string(&result) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => println!(
            r#"{{"failed": true, "changed": false, "msg": "Failed to encode result: {}"}}"#,
            e
        ),
    }

    if result.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run() -> ModuleResult {
    let Some(path) = std::env::args().nth(1) else {
        return ModuleResult::failure("Usage: account-module <args-file>", "ValidationError");
    };

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            return ModuleResult::failure(
                format!("Failed to read module arguments from {}: {}", path, e),
                "ValidationError",
            )
        }
    };

    let args = match ModuleArgs::from_json(&raw) {
        Ok(args) => args,
        Err(e) => {
            return ModuleResult::failure(
                format!("Invalid module arguments: {}", e),
                "ValidationError",
            )
        }
    };

    let config = match AccountsConfig::load() {
        Ok(config) => config,
        Err(e) => return ModuleResult::failure(e.to_string(), "ConfigError"),
    };
    let otlp_endpoint = config
        .common
        .otlp_endpoint
        .clone()
        .or_else(|| std::env::var("OTLP_ENDPOINT").ok());
    init_tracing(
        "account-module",
        &config.common.log_level,
        otlp_endpoint.as_deref(),
    );

    let cancel = spawn_shutdown_watcher(None);
    let state = match AppState::build(&config, config.poll_config(), cancel.clone()) {
        Ok(state) => state,
        Err(e) => return ModuleResult::failure(e.to_string(), "ConfigError"),
    };

    let runner = ModuleRunner::new(state.provisioner, state.relocator, state.billing_access);
    let result = runner.run(args).await;
    cancel.cancel();
    result
}
