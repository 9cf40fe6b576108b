//! Control-plane client abstraction.
//!
//! The organization API is the only source of truth for accounts, requests
//! and containers. Everything else in this crate talks to it through the
//! [`ControlPlane`] trait so tests can swap in a scripted implementation.

pub mod http;
pub mod mock;

use crate::error::ControlPlaneError;
use crate::models::{CreateAccountRequest, ParentContainer, RequestStatusSnapshot, Root};
use async_trait::async_trait;

#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Submit an account-creation request and return its request id.
    async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<String, ControlPlaneError>;

    /// Fetch the current status of an account-creation request.
    async fn describe_account_request(
        &self,
        request_id: &str,
    ) -> Result<RequestStatusSnapshot, ControlPlaneError>;

    /// List every parent the provider reports for an account.
    async fn list_parents(&self, account_id: &str)
        -> Result<Vec<ParentContainer>, ControlPlaneError>;

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<(), ControlPlaneError>;

    async fn list_roots(&self) -> Result<Vec<Root>, ControlPlaneError>;
}
