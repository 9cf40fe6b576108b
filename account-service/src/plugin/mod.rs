//! Orchestration-engine module surface.
//!
//! The engine hands the module a JSON argument file and expects a single
//! JSON object back. Every failure, including malformed arguments, is
//! reported through [`ModuleResult`] rather than a panic.

use crate::error::{ProvisionError, RelocationError};
use crate::models::{AccountRequestStatus, BillingAccess, CreateAccountRequest, MoveResult, Tag};
use crate::services::{Provisioner, Relocator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;

const WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleAction {
    CreateAccount,
    MoveAccount,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleArgs {
    pub action: Option<ModuleAction>,
    pub email: Option<String>,
    #[serde(alias = "projeto")]
    pub name: Option<String>,
    pub admin_role_name: Option<String>,
    pub tags: Option<Vec<Tag>>,
    #[serde(alias = "account_id")]
    pub id: Option<String>,
    #[serde(alias = "destination_ou_id")]
    pub ou_id: Option<String>,
}

impl ModuleArgs {
    /// Parse module arguments, flat or wrapped in the engine's envelope.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let mut value: Value = serde_json::from_str(raw)?;
        if let Some(inner) = value.get_mut(WRAPPER_KEY) {
            value = inner.take();
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Engine-facing outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountRequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<MoveResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ModuleResult {
    pub fn failure(msg: impl Into<String>, error: &'static str) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: msg.into(),
            status: None,
            response: None,
            error: Some(error),
            request_id: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed {
            1
        } else {
            0
        }
    }
}

impl From<ProvisionError> for ModuleResult {
    fn from(err: ProvisionError) -> Self {
        let mut result = ModuleResult::failure(err.to_string(), err.kind());
        result.request_id = err.request_id().map(str::to_string);
        result
    }
}

impl From<RelocationError> for ModuleResult {
    fn from(err: RelocationError) -> Self {
        ModuleResult::failure(err.to_string(), err.kind())
    }
}

pub struct ModuleRunner {
    provisioner: Arc<Provisioner>,
    relocator: Arc<Relocator>,
    billing_access: BillingAccess,
}

impl ModuleRunner {
    pub fn new(
        provisioner: Arc<Provisioner>,
        relocator: Arc<Relocator>,
        billing_access: BillingAccess,
    ) -> Self {
        Self {
            provisioner,
            relocator,
            billing_access,
        }
    }

    #[tracing::instrument(skip_all, fields(action = ?args.action))]
    pub async fn run(&self, args: ModuleArgs) -> ModuleResult {
        match args.action {
            Some(ModuleAction::CreateAccount) => self.create_account(args).await,
            Some(ModuleAction::MoveAccount) => self.move_account(args).await,
            None => ModuleResult::failure(
                "Parameter 'action' is required: create_account or move_account.",
                "ValidationError",
            ),
        }
    }

    async fn create_account(&self, args: ModuleArgs) -> ModuleResult {
        let (Some(email), Some(name)) = (non_blank(args.email), non_blank(args.name)) else {
            return ModuleResult::failure(
                "Parameters 'email' and 'name' are required for create_account.",
                "ValidationError",
            );
        };

        let mut request = CreateAccountRequest::new(email, name.clone())
            .with_billing_access(self.billing_access)
            .with_tags(args.tags.unwrap_or_default());
        if let Some(role_name) = non_blank(args.admin_role_name) {
            request = request.with_role_name(role_name);
        }

        match self.provisioner.create(&request).await {
            Ok(status) => ModuleResult {
                changed: true,
                failed: false,
                msg: format!(
                    "Account {} created successfully for the project {}.",
                    status.account_id().unwrap_or_default(),
                    name
                ),
                status: Some(status),
                response: None,
                error: None,
                request_id: None,
            },
            Err(e) => e.into(),
        }
    }

    async fn move_account(&self, args: ModuleArgs) -> ModuleResult {
        let (Some(account_id), Some(ou_id)) = (non_blank(args.id), non_blank(args.ou_id)) else {
            return ModuleResult::failure(
                "Parameters 'id' and 'ou_id' are required for move_account.",
                "ValidationError",
            );
        };

        match self.relocator.move_account(&account_id, &ou_id).await {
            Ok(result) => {
                let msg = if result.changed {
                    format!(
                        "Account {} moved from {} to {}.",
                        result.account_id, result.from_parent_id, result.to_parent_id
                    )
                } else {
                    format!(
                        "Account {} is already in the destination OU {}.",
                        result.account_id, result.to_parent_id
                    )
                };
                ModuleResult {
                    changed: result.changed,
                    failed: false,
                    msg,
                    status: None,
                    response: Some(result),
                    error: None,
                    request_id: None,
                }
            }
            Err(e) => e.into(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
