use crate::models::BillingAccess;
use crate::services::control_plane::http::HttpControlPlaneConfig;
use crate::services::provisioner::{PollConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::retry::RetryConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATUS_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct AccountsConfig {
    pub common: core_config::Config,
    pub organizations: OrganizationsConfig,
    pub polling: PollingConfig,
    /// Applied to every new account unless a request overrides it.
    pub billing_access: BillingAccess,
}

#[derive(Debug, Clone)]
pub struct OrganizationsConfig {
    /// Endpoint accepting organization API calls (typically a signing proxy).
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
    pub status_max_retries: u32,
}

impl AccountsConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let billing_access = get_env("ACCOUNT_IAM_BILLING_ACCESS", Some("ALLOW"), is_prod)?;
        let billing_access = BillingAccess::parse(&billing_access).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "ACCOUNT_IAM_BILLING_ACCESS must be ALLOW or DENY, got '{}'",
                billing_access
            ))
        })?;

        let polling = PollingConfig {
            interval_secs: get_parsed("ACCOUNT_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?,
            max_attempts: get_parsed("ACCOUNT_POLL_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            status_max_retries: get_parsed(
                "ACCOUNT_STATUS_MAX_RETRIES",
                DEFAULT_STATUS_MAX_RETRIES,
            )?,
        };
        if polling.max_attempts == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCOUNT_POLL_MAX_ATTEMPTS must be at least 1"
            )));
        }

        Ok(AccountsConfig {
            common: common_config,
            organizations: OrganizationsConfig {
                endpoint: get_env("ORGANIZATIONS_ENDPOINT", Some(DEFAULT_ENDPOINT), is_prod)?,
                request_timeout_secs: get_parsed(
                    "ORGANIZATIONS_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
            },
            polling,
            billing_access,
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.polling.interval_secs),
            max_attempts: self.polling.max_attempts,
            status_retry: RetryConfig::with_max_retries(self.polling.status_max_retries),
        }
    }

    pub fn control_plane_config(&self) -> HttpControlPlaneConfig {
        HttpControlPlaneConfig {
            endpoint: self.organizations.endpoint.clone(),
            request_timeout: Duration::from_secs(self.organizations.request_timeout_secs),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Numeric settings fall back to their default even in production.
fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(&default.to_string()), false)?;
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
