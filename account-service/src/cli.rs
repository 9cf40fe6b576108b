use crate::error::{ProvisionError, RelocationError};
use crate::models::{BillingAccess, CreateAccountRequest, Tag};
use crate::startup::AppState;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::time::Duration;

/// Provision member accounts and place them in organizational units
#[derive(Parser, Debug)]
#[command(name = "account-service", version)]
pub struct Cli {
    /// Cancel polling after this many seconds
    #[arg(long, global = true, env = "ACCOUNT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Override the pause between status checks
    #[arg(long, global = true)]
    pub poll_interval_secs: Option<u64>,

    /// Override the number of status checks before giving up
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a member account and wait until the request finishes
    Create {
        #[arg(long)]
        email: String,

        /// Account (project) name
        #[arg(long)]
        name: String,

        /// Admin role created in the new account
        #[arg(long)]
        role_name: Option<String>,

        /// Tag as KEY=VALUE, repeatable
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<Tag>,

        /// ALLOW or DENY; defaults to ACCOUNT_IAM_BILLING_ACCESS
        #[arg(long, value_parser = parse_billing_access)]
        billing_access: Option<BillingAccess>,
    },

    /// Move an account under a destination parent
    Move {
        account_id: String,
        destination_ou_id: String,
    },

    /// Poll an existing account-creation request
    Status { request_id: String },

    /// Print the organization root id
    Root,
}

pub fn parse_tag(raw: &str) -> Result<Tag, String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok(Tag::new(key.trim(), value)),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn parse_billing_access(raw: &str) -> Result<BillingAccess, String> {
    BillingAccess::parse(raw).ok_or_else(|| format!("expected ALLOW or DENY, got '{raw}'"))
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// A failed command, as shown to the operator.
#[derive(Debug)]
pub struct CommandFailure {
    pub message: String,
    pub request_id: Option<String>,
}

impl From<ProvisionError> for CommandFailure {
    fn from(err: ProvisionError) -> Self {
        Self {
            request_id: err.request_id().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl From<RelocationError> for CommandFailure {
    fn from(err: RelocationError) -> Self {
        Self {
            message: err.to_string(),
            request_id: None,
        }
    }
}

impl From<serde_json::Error> for CommandFailure {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: format!("Failed to encode result: {err}"),
            request_id: None,
        }
    }
}

pub async fn execute(command: Command, state: &AppState) -> Result<Value, CommandFailure> {
    match command {
        Command::Create {
            email,
            name,
            role_name,
            tags,
            billing_access,
        } => {
            let mut request = CreateAccountRequest::new(email, name)
                .with_tags(tags)
                .with_billing_access(billing_access.unwrap_or(state.billing_access));
            if let Some(role_name) = role_name {
                request = request.with_role_name(role_name);
            }
            let status = state.provisioner.create(&request).await?;
            Ok(serde_json::to_value(status)?)
        }
        Command::Move {
            account_id,
            destination_ou_id,
        } => {
            let result = state
                .relocator
                .move_account(&account_id, &destination_ou_id)
                .await?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Status { request_id } => {
            let status = state.provisioner.poll(&request_id).await?;
            Ok(serde_json::to_value(status)?)
        }
        Command::Root => {
            let root_id = state.relocator.root_id().await?;
            Ok(json!({ "root_id": root_id }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("team=core").unwrap(), Tag::new("team", "core"));
        assert_eq!(parse_tag("note=a=b").unwrap(), Tag::new("note", "a=b"));
        assert_eq!(parse_tag("empty=").unwrap(), Tag::new("empty", ""));
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=x").is_err());
    }

    #[test]
    fn test_create_arguments() {
        let cli = Cli::try_parse_from([
            "account-service",
            "create",
            "--email",
            "dev@example.com",
            "--name",
            "Atlas",
            "--tag",
            "team=core",
            "--tag",
            "env=dev",
            "--timeout-secs",
            "600",
        ])
        .unwrap();

        assert_eq!(cli.timeout(), Some(Duration::from_secs(600)));
        match cli.command {
            Command::Create { tags, role_name, .. } => {
                assert_eq!(tags.len(), 2);
                assert!(role_name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = Cli::try_parse_from(["account-service", "--max-attempts", "0", "root"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_move_arguments() {
        let cli = Cli::try_parse_from(["account-service", "move", "111122223333", "ou-dest"])
            .unwrap();

        match cli.command {
            Command::Move {
                account_id,
                destination_ou_id,
            } => {
                assert_eq!(account_id, "111122223333");
                assert_eq!(destination_ou_id, "ou-dest");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
