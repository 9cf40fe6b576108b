//! Error taxonomy for provisioning and relocation.
//!
//! Raw control-plane failures never cross a component boundary: the
//! provisioner and relocator convert them into one of the classified kinds
//! below, so callers can match on the variant instead of on message text.

use thiserror::Error;

/// Failure reported by the control-plane client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    #[error("{code}: {message}")]
    Api {
        code: String,
        message: String,
        status: u16,
    },

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ControlPlaneError {
    /// Whether repeating the same read may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ControlPlaneError::Throttled(_) | ControlPlaneError::Network(_) => true,
            ControlPlaneError::Api { status, .. } => *status >= 500,
            ControlPlaneError::Decode(_) => false,
        }
    }

    /// Provider error code, when the provider sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ControlPlaneError::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Invalid account request: {0}")]
    Validation(String),

    #[error("Failed to submit account creation request: {0}")]
    Submission(#[source] ControlPlaneError),

    #[error("Account request {request_id} reported unexpected state '{state}': {detail}")]
    UnexpectedState {
        request_id: String,
        state: String,
        detail: String,
    },

    #[error("Account creation failed. Reason: {reason}")]
    CreationFailed { request_id: String, reason: String },

    #[error("Account request {request_id} still in progress after {attempts} status checks")]
    Timeout { request_id: String, attempts: u32 },

    /// `request_id` is `None` when cancellation came before submission.
    #[error("{}", cancelled_message(.request_id))]
    Cancelled { request_id: Option<String> },

    #[error("Failed to check status of account request {request_id}: {source}")]
    StatusCheck {
        request_id: String,
        #[source]
        source: ControlPlaneError,
    },
}

fn cancelled_message(request_id: &Option<String>) -> String {
    match request_id {
        Some(id) => format!("Polling of account request {} was cancelled", id),
        None => "Account creation was cancelled before submission".to_string(),
    }
}

impl ProvisionError {
    /// Stable name of the error kind for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Validation(_) => "ValidationError",
            ProvisionError::Submission(_) => "SubmissionError",
            ProvisionError::UnexpectedState { .. } => "UnexpectedStateError",
            ProvisionError::CreationFailed { .. } => "CreationFailedError",
            ProvisionError::Timeout { .. } => "TimeoutError",
            ProvisionError::Cancelled { .. } => "CancelledError",
            ProvisionError::StatusCheck { .. } => "StatusCheckError",
        }
    }

    /// Request id of a submitted request, when there is one to re-poll.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ProvisionError::Validation(_) | ProvisionError::Submission(_) => None,
            ProvisionError::Cancelled { request_id } => request_id.as_deref(),
            ProvisionError::UnexpectedState { request_id, .. }
            | ProvisionError::CreationFailed { request_id, .. }
            | ProvisionError::Timeout { request_id, .. }
            | ProvisionError::StatusCheck { request_id, .. } => Some(request_id.as_str()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RelocationError {
    #[error("Invalid move request: {0}")]
    Validation(String),

    #[error("Failed to look up current placement: {0}")]
    Lookup(#[source] ControlPlaneError),

    #[error("Inconsistent organization state: {detail}")]
    Consistency { detail: String, found: Vec<String> },

    #[error("Error moving account {account_id}: {source}")]
    Rejected {
        account_id: String,
        #[source]
        source: ControlPlaneError,
    },
}

impl RelocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelocationError::Validation(_) => "ValidationError",
            RelocationError::Lookup(_) => "LookupError",
            RelocationError::Consistency { .. } => "ConsistencyError",
            RelocationError::Rejected { .. } => "RelocationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ControlPlaneError {
        ControlPlaneError::Api {
            code: "ServiceException".to_string(),
            message: "boom".to_string(),
            status,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(ControlPlaneError::Throttled("slow down".into()).is_transient());
        assert!(ControlPlaneError::Network("reset".into()).is_transient());
        assert!(api(503).is_transient());
        assert!(!api(400).is_transient());
        assert!(!ControlPlaneError::Decode("garbage".into()).is_transient());
    }

    #[test]
    fn test_creation_failed_keeps_reason_verbatim() {
        let err = ProvisionError::CreationFailed {
            request_id: "car-1".to_string(),
            reason: "EMAIL_ALREADY_EXISTS".to_string(),
        };
        assert_eq!(err.kind(), "CreationFailedError");
        assert_eq!(
            err.to_string(),
            "Account creation failed. Reason: EMAIL_ALREADY_EXISTS"
        );
        assert_eq!(err.request_id(), Some("car-1"));
    }

    #[test]
    fn test_cancellation_messages() {
        let before = ProvisionError::Cancelled { request_id: None };
        assert_eq!(before.kind(), "CancelledError");
        assert_eq!(before.request_id(), None);
        assert_eq!(
            before.to_string(),
            "Account creation was cancelled before submission"
        );

        let polling = ProvisionError::Cancelled {
            request_id: Some("car-1".to_string()),
        };
        assert_eq!(polling.request_id(), Some("car-1"));
        assert_eq!(
            polling.to_string(),
            "Polling of account request car-1 was cancelled"
        );
    }

    #[test]
    fn test_submission_error_has_no_request_id() {
        let err = ProvisionError::Submission(ControlPlaneError::Network("timed out".into()));
        assert_eq!(err.kind(), "SubmissionError");
        assert_eq!(err.request_id(), None);
    }

    #[test]
    fn test_rejected_move_carries_remote_detail() {
        let err = RelocationError::Rejected {
            account_id: "111122223333".to_string(),
            source: ControlPlaneError::Api {
                code: "DestinationParentNotFoundException".to_string(),
                message: "We can't find the destination container".to_string(),
                status: 400,
            },
        };
        assert_eq!(err.kind(), "RelocationError");
        assert!(err
            .to_string()
            .contains("DestinationParentNotFoundException: We can't find the destination container"));
    }
}
