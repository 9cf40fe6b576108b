#![allow(dead_code)]

use account_service::models::BillingAccess;
use account_service::services::control_plane::mock::MockControlPlane;
use account_service::services::PollConfig;
use account_service::startup::AppState;
use service_core::retry::RetryConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TEST_EMAIL: &str = "atlas-dev@example.com";
pub const TEST_NAME: &str = "Atlas";
pub const TEST_ACCOUNT_ID: &str = "111122223333";
pub const TEST_ROOT_ID: &str = "r-ab12";
pub const TEST_INTERVAL: Duration = Duration::from_secs(15);

pub struct TestApp {
    pub mock: Arc<MockControlPlane>,
    pub state: AppState,
    pub cancel: CancellationToken,
}

impl TestApp {
    pub fn spawn(mock: MockControlPlane) -> Self {
        Self::spawn_with(mock, poll_config(5))
    }

    pub fn spawn_with(mock: MockControlPlane, poll: PollConfig) -> Self {
        let mock = Arc::new(mock);
        let cancel = CancellationToken::new();
        let state = AppState::with_client(mock.clone(), poll, cancel.clone(), BillingAccess::Allow);

        Self {
            mock,
            state,
            cancel,
        }
    }
}

/// Poll settings for tests; status reads are retried twice without jitter.
pub fn poll_config(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: TEST_INTERVAL,
        max_attempts,
        status_retry: RetryConfig {
            add_jitter: false,
            ..RetryConfig::with_max_retries(2)
        },
    }
}
