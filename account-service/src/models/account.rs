//! Account-creation requests and the status snapshots the control plane
//! reports for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Whether IAM users in the new account may see billing information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingAccess {
    #[default]
    Allow,
    Deny,
}

impl BillingAccess {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Some(BillingAccess::Allow),
            "DENY" => Some(BillingAccess::Deny),
            _ => None,
        }
    }
}

/// Key/value tag applied to a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Input for a new member account. Email uniqueness is enforced remotely.
#[derive(Debug, Clone, Validate)]
pub struct CreateAccountRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,

    #[validate(custom(function = "not_blank", message = "account name must not be blank"))]
    pub account_name: String,

    /// Admin role created in the new account; the provider default applies when unset.
    pub role_name: Option<String>,

    pub tags: Vec<Tag>,

    pub billing_access: BillingAccess,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl CreateAccountRequest {
    pub fn new(email: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            account_name: account_name.into(),
            role_name: None,
            tags: Vec::new(),
            billing_access: BillingAccess::default(),
        }
    }

    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_billing_access(mut self, billing_access: BillingAccess) -> Self {
        self.billing_access = billing_access;
        self
    }
}

/// The complete state space of an account-creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    InProgress,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IN_PROGRESS" => Some(RequestState::InProgress),
            "SUCCEEDED" => Some(RequestState::Succeeded),
            "FAILED" => Some(RequestState::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::InProgress => "IN_PROGRESS",
            RequestState::Succeeded => "SUCCEEDED",
            RequestState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::InProgress)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw status as reported by the control plane, before any checking.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestStatusSnapshot {
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub requested_timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    pub completed_timestamp: Option<DateTime<Utc>>,
}

impl RequestStatusSnapshot {
    pub fn in_progress(request_id: impl Into<String>) -> Self {
        Self::with_state(request_id, RequestState::InProgress.as_str())
    }

    pub fn succeeded(request_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::with_state(request_id, RequestState::Succeeded.as_str())
        }
    }

    pub fn failed(request_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(reason.into()),
            ..Self::with_state(request_id, RequestState::Failed.as_str())
        }
    }

    pub fn with_state(request_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: request_id.into(),
            state: state.into(),
            ..Default::default()
        }
    }
}

/// Timestamps arrive as fractional seconds since the epoch.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = Option::<f64>::deserialize(deserializer)?;
    Ok(seconds.and_then(|s| DateTime::from_timestamp_millis((s * 1000.0).round() as i64)))
}

/// Ways a snapshot can contradict the request state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusViolation {
    #[error("'{0}' is not a known request state")]
    UnknownState(String),

    #[error("SUCCEEDED without an account id")]
    MissingAccountId,

    #[error("FAILED without a failure reason")]
    MissingFailureReason,

    #[error("{state} must not carry {field}")]
    UnexpectedField {
        state: RequestState,
        field: &'static str,
    },
}

/// A checked status snapshot.
///
/// `account_id` is present exactly when the state is `SUCCEEDED` and
/// `failure_reason` exactly when it is `FAILED`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRequestStatus {
    #[serde(rename = "Id")]
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_name: Option<String>,
    state: RequestState,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    #[serde(rename = "RequestedTimestamp", skip_serializing_if = "Option::is_none")]
    requested_at: Option<DateTime<Utc>>,
    #[serde(rename = "CompletedTimestamp", skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl AccountRequestStatus {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    pub fn requested_at(&self) -> Option<DateTime<Utc>> {
        self.requested_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

impl TryFrom<RequestStatusSnapshot> for AccountRequestStatus {
    type Error = StatusViolation;

    fn try_from(snapshot: RequestStatusSnapshot) -> Result<Self, Self::Error> {
        let state = RequestState::parse(&snapshot.state)
            .ok_or_else(|| StatusViolation::UnknownState(snapshot.state.clone()))?;

        match state {
            RequestState::Succeeded => {
                if snapshot.account_id.is_none() {
                    return Err(StatusViolation::MissingAccountId);
                }
                if snapshot.failure_reason.is_some() {
                    return Err(StatusViolation::UnexpectedField {
                        state,
                        field: "a failure reason",
                    });
                }
            }
            RequestState::Failed => {
                if snapshot.failure_reason.is_none() {
                    return Err(StatusViolation::MissingFailureReason);
                }
                if snapshot.account_id.is_some() {
                    return Err(StatusViolation::UnexpectedField {
                        state,
                        field: "an account id",
                    });
                }
            }
            RequestState::InProgress => {
                if snapshot.account_id.is_some() {
                    return Err(StatusViolation::UnexpectedField {
                        state,
                        field: "an account id",
                    });
                }
                if snapshot.failure_reason.is_some() {
                    return Err(StatusViolation::UnexpectedField {
                        state,
                        field: "a failure reason",
                    });
                }
            }
        }

        Ok(Self {
            request_id: snapshot.id,
            account_name: snapshot.account_name,
            state,
            account_id: snapshot.account_id,
            failure_reason: snapshot.failure_reason,
            requested_at: snapshot.requested_timestamp,
            completed_at: snapshot.completed_timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_state_parse() {
        assert_eq!(
            RequestState::parse("IN_PROGRESS"),
            Some(RequestState::InProgress)
        );
        assert_eq!(RequestState::parse("SUCCEEDED"), Some(RequestState::Succeeded));
        assert_eq!(RequestState::parse("FAILED"), Some(RequestState::Failed));
        assert_eq!(RequestState::parse("PENDING"), None);
        assert_eq!(RequestState::parse("succeeded"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RequestState::InProgress.is_terminal());
        assert!(RequestState::Succeeded.is_terminal());
        assert!(RequestState::Failed.is_terminal());
    }

    #[test]
    fn test_succeeded_snapshot_carries_account_id_only() {
        let status =
            AccountRequestStatus::try_from(RequestStatusSnapshot::succeeded("car-1", "111122223333"))
                .unwrap();

        assert_eq!(status.state(), RequestState::Succeeded);
        assert_eq!(status.account_id(), Some("111122223333"));
        assert_eq!(status.failure_reason(), None);
    }

    #[test]
    fn test_failed_snapshot_carries_reason_only() {
        let status = AccountRequestStatus::try_from(RequestStatusSnapshot::failed(
            "car-1",
            "EMAIL_ALREADY_EXISTS",
        ))
        .unwrap();

        assert_eq!(status.state(), RequestState::Failed);
        assert_eq!(status.failure_reason(), Some("EMAIL_ALREADY_EXISTS"));
        assert_eq!(status.account_id(), None);
    }

    #[test]
    fn test_invariant_violations_are_rejected() {
        let missing_id = RequestStatusSnapshot::with_state("car-1", "SUCCEEDED");
        assert_eq!(
            AccountRequestStatus::try_from(missing_id),
            Err(StatusViolation::MissingAccountId)
        );

        let missing_reason = RequestStatusSnapshot::with_state("car-1", "FAILED");
        assert_eq!(
            AccountRequestStatus::try_from(missing_reason),
            Err(StatusViolation::MissingFailureReason)
        );

        let early_id = RequestStatusSnapshot {
            account_id: Some("111122223333".to_string()),
            ..RequestStatusSnapshot::in_progress("car-1")
        };
        assert!(matches!(
            AccountRequestStatus::try_from(early_id),
            Err(StatusViolation::UnexpectedField { .. })
        ));

        let unknown = RequestStatusSnapshot::with_state("car-1", "QUEUED");
        assert_eq!(
            AccountRequestStatus::try_from(unknown),
            Err(StatusViolation::UnknownState("QUEUED".to_string()))
        );
    }

    #[test]
    fn test_snapshot_deserializes_provider_payload() {
        let snapshot: RequestStatusSnapshot = serde_json::from_value(serde_json::json!({
            "Id": "car-5f1e0e",
            "AccountName": "Proj",
            "State": "SUCCEEDED",
            "AccountId": "111122223333",
            "RequestedTimestamp": 1700000000.5,
            "CompletedTimestamp": 1700000300
        }))
        .unwrap();

        assert_eq!(snapshot.id, "car-5f1e0e");
        assert_eq!(snapshot.account_name.as_deref(), Some("Proj"));
        assert_eq!(
            snapshot.requested_timestamp.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_500)
        );
        assert_eq!(
            snapshot.completed_timestamp.map(|t| t.timestamp()),
            Some(1_700_000_300)
        );
    }

    #[test]
    fn test_status_serializes_with_provider_field_names() {
        let status = AccountRequestStatus::try_from(RequestStatusSnapshot {
            account_name: Some("Proj".to_string()),
            ..RequestStatusSnapshot::succeeded("car-1", "111122223333")
        })
        .unwrap();

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["Id"], "car-1");
        assert_eq!(value["State"], "SUCCEEDED");
        assert_eq!(value["AccountId"], "111122223333");
        assert_eq!(value["AccountName"], "Proj");
        assert!(value.get("FailureReason").is_none());
    }

    #[test]
    fn test_request_validation() {
        assert!(CreateAccountRequest::new("a@x.com", "Proj").validate().is_ok());
        assert!(CreateAccountRequest::new("", "Proj").validate().is_err());
        assert!(CreateAccountRequest::new("not-an-email", "Proj")
            .validate()
            .is_err());
        assert!(CreateAccountRequest::new("a@x.com", "").validate().is_err());
        assert!(CreateAccountRequest::new("a@x.com", "   ").validate().is_err());
    }

    #[test]
    fn test_billing_access_parse() {
        assert_eq!(BillingAccess::parse("allow"), Some(BillingAccess::Allow));
        assert_eq!(BillingAccess::parse("DENY"), Some(BillingAccess::Deny));
        assert_eq!(BillingAccess::parse("maybe"), None);
    }
}
