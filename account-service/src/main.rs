use account_service::cli::{execute, Cli};
use account_service::config::AccountsConfig;
use account_service::startup::{spawn_shutdown_watcher, AppState};
use clap::Parser;
use service_core::observability::{init_tracing, shutdown_tracing};
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AccountsConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FAILED: Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let otlp_endpoint = config
        .common
        .otlp_endpoint
        .clone()
        .or_else(|| std::env::var("OTLP_ENDPOINT").ok());
    init_tracing(
        "account-service",
        &config.common.log_level,
        otlp_endpoint.as_deref(),
    );

    let code = run(cli, &config).await;
    shutdown_tracing();
    code
}

async fn run(cli: Cli, config: &AccountsConfig) -> ExitCode {
    let mut poll = config.poll_config();
    if let Some(secs) = cli.poll_interval_secs {
        poll.interval = Duration::from_secs(secs);
    }
    if let Some(attempts) = cli.max_attempts {
        poll.max_attempts = attempts;
    }

    let cancel = spawn_shutdown_watcher(cli.timeout());
    let state = match AppState::build(config, poll, cancel.clone()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("FAILED: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = execute(cli.command, &state).await;
    cancel.cancel();

    match outcome {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(rendered) => {
                println!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("FAILED: Failed to encode result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(failure) => {
            eprintln!("FAILED: {}", failure.message);
            if let Some(request_id) = failure.request_id {
                eprintln!(
                    "The request keeps running remotely; check it with: account-service status {}",
                    request_id
                );
            }
            ExitCode::FAILURE
        }
    }
}
