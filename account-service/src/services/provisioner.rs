//! Account provisioning: submit a creation request, then poll its status
//! until the control plane reports a terminal state.

use crate::error::{ControlPlaneError, ProvisionError};
use crate::models::{AccountRequestStatus, CreateAccountRequest, RequestState};
use crate::services::control_plane::ControlPlane;
use crate::services::metrics;
use service_core::retry::{retry_call, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use validator::Validate;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// How the status of a submitted request is polled.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed pause between two status checks.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub max_attempts: u32,
    /// Retry policy for a single failing status read.
    pub status_retry: RetryConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            status_retry: RetryConfig::with_max_retries(3),
        }
    }
}

pub struct Provisioner {
    client: Arc<dyn ControlPlane>,
    poll: PollConfig,
    cancel: CancellationToken,
}

impl Provisioner {
    pub fn new(client: Arc<dyn ControlPlane>, poll: PollConfig) -> Self {
        Self {
            client,
            poll,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop polling when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Submit a new account and wait for the request to finish.
    ///
    /// Submission is attempted exactly once: the creation call is not
    /// idempotent, and a retry after an ambiguous failure could create a
    /// second account.
    #[tracing::instrument(
        skip(self, request),
        fields(email = %request.email, account_name = %request.account_name)
    )]
    pub async fn create(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<AccountRequestStatus, ProvisionError> {
        if let Err(e) = request.validate() {
            metrics::record_provision_outcome("ValidationError");
            return Err(ProvisionError::Validation(e.to_string()));
        }

        // Nothing has been sent yet, so stopping here leaves no remote request behind.
        if self.cancel.is_cancelled() {
            tracing::warn!("Cancelled before submission, no account requested");
            metrics::record_provision_outcome("CancelledError");
            return Err(ProvisionError::Cancelled { request_id: None });
        }

        let request_id = match self.client.create_account(request).await {
            Ok(request_id) => request_id,
            Err(e) => {
                tracing::error!(error = %e, "Account creation request was not accepted");
                metrics::record_provision_outcome("SubmissionError");
                return Err(ProvisionError::Submission(e));
            }
        };

        tracing::info!(request_id = %request_id, "Account creation request submitted");

        self.poll(&request_id).await
    }

    /// Poll an already submitted request until it is terminal.
    ///
    /// Safe to call again for a request that previously timed out or whose
    /// polling was cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn poll(&self, request_id: &str) -> Result<AccountRequestStatus, ProvisionError> {
        if request_id.trim().is_empty() {
            metrics::record_provision_outcome("ValidationError");
            return Err(ProvisionError::Validation(
                "request id must not be empty".to_string(),
            ));
        }

        let result = self.poll_until_terminal(request_id).await;
        metrics::record_provision_outcome(match &result {
            Ok(_) => "succeeded",
            Err(e) => e.kind(),
        });
        result
    }

    async fn poll_until_terminal(
        &self,
        request_id: &str,
    ) -> Result<AccountRequestStatus, ProvisionError> {
        let cancelled = || {
            tracing::warn!(request_id, "Polling cancelled, request left untouched");
            ProvisionError::Cancelled {
                request_id: Some(request_id.to_string()),
            }
        };

        for attempt in 1..=self.poll.max_attempts {
            let snapshot = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                result = retry_call(
                    &self.poll.status_retry,
                    "describe_create_account_status",
                    ControlPlaneError::is_transient,
                    || self.client.describe_account_request(request_id),
                ) => result.map_err(|source| ProvisionError::StatusCheck {
                    request_id: request_id.to_string(),
                    source,
                })?,
            };

            let raw_state = snapshot.state.clone();
            let status = AccountRequestStatus::try_from(snapshot).map_err(|violation| {
                tracing::error!(
                    request_id,
                    state = %raw_state,
                    error = %violation,
                    "Control plane reported an unexpected request state"
                );
                ProvisionError::UnexpectedState {
                    request_id: request_id.to_string(),
                    state: raw_state.clone(),
                    detail: violation.to_string(),
                }
            })?;
            metrics::record_status_poll(status.state().as_str());

            match status.state() {
                RequestState::Succeeded => {
                    tracing::info!(
                        request_id,
                        account_id = status.account_id().unwrap_or_default(),
                        attempt,
                        "Account created"
                    );
                    return Ok(status);
                }
                RequestState::Failed => {
                    let reason = status.failure_reason().unwrap_or_default().to_string();
                    tracing::warn!(request_id, reason = %reason, attempt, "Account creation failed");
                    return Err(ProvisionError::CreationFailed {
                        request_id: request_id.to_string(),
                        reason,
                    });
                }
                RequestState::InProgress => {
                    tracing::debug!(
                        request_id,
                        attempt,
                        max_attempts = self.poll.max_attempts,
                        "Account creation still in progress"
                    );
                }
            }

            if attempt < self.poll.max_attempts {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(cancelled()),
                    _ = sleep(self.poll.interval) => {}
                }
            }
        }

        tracing::warn!(
            request_id,
            attempts = self.poll.max_attempts,
            "Gave up waiting for account creation; the request keeps running remotely"
        );
        Err(ProvisionError::Timeout {
            request_id: request_id.to_string(),
            attempts: self.poll.max_attempts,
        })
    }
}
