//! Idempotent relocation of an account between parent containers.

use crate::error::RelocationError;
use crate::models::MoveResult;
use crate::services::control_plane::ControlPlane;
use crate::services::metrics;
use std::sync::Arc;

pub struct Relocator {
    client: Arc<dyn ControlPlane>,
}

impl Relocator {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Move `account_id` under `destination_parent_id`.
    ///
    /// The current parent is looked up right before the move and used as
    /// the move source. No move is issued when the account already sits
    /// under the destination.
    #[tracing::instrument(skip(self))]
    pub async fn move_account(
        &self,
        account_id: &str,
        destination_parent_id: &str,
    ) -> Result<MoveResult, RelocationError> {
        let result = self.relocate(account_id, destination_parent_id).await;
        metrics::record_relocation_outcome(match &result {
            Ok(r) if r.changed => "moved",
            Ok(_) => "unchanged",
            Err(e) => e.kind(),
        });
        result
    }

    async fn relocate(
        &self,
        account_id: &str,
        destination_parent_id: &str,
    ) -> Result<MoveResult, RelocationError> {
        if account_id.trim().is_empty() {
            return Err(RelocationError::Validation(
                "account id must not be empty".to_string(),
            ));
        }
        if destination_parent_id.trim().is_empty() {
            return Err(RelocationError::Validation(
                "destination parent id must not be empty".to_string(),
            ));
        }

        let current_parent_id = self.current_parent_id(account_id).await?;

        if current_parent_id == destination_parent_id {
            tracing::info!(
                account_id,
                parent_id = %current_parent_id,
                "Account already under destination, nothing to move"
            );
            return Ok(MoveResult {
                changed: false,
                account_id: account_id.to_string(),
                from_parent_id: current_parent_id,
                to_parent_id: destination_parent_id.to_string(),
            });
        }

        self.client
            .move_account(account_id, &current_parent_id, destination_parent_id)
            .await
            .map_err(|source| {
                tracing::error!(
                    account_id,
                    from = %current_parent_id,
                    to = destination_parent_id,
                    error = %source,
                    "Move rejected by control plane"
                );
                RelocationError::Rejected {
                    account_id: account_id.to_string(),
                    source,
                }
            })?;

        tracing::info!(
            account_id,
            from = %current_parent_id,
            to = destination_parent_id,
            "Account moved"
        );

        Ok(MoveResult {
            changed: true,
            account_id: account_id.to_string(),
            from_parent_id: current_parent_id,
            to_parent_id: destination_parent_id.to_string(),
        })
    }

    /// Resolve the single parent of an account.
    pub async fn current_parent_id(&self, account_id: &str) -> Result<String, RelocationError> {
        let parents = self
            .client
            .list_parents(account_id)
            .await
            .map_err(RelocationError::Lookup)?;

        if let [parent] = parents.as_slice() {
            return Ok(parent.id.clone());
        }

        let found: Vec<String> = parents.into_iter().map(|p| p.id).collect();
        tracing::error!(
            account_id,
            parents = ?found,
            "Account does not have exactly one parent"
        );
        Err(RelocationError::Consistency {
            detail: format!(
                "account {} reports {} parents, expected exactly one",
                account_id,
                found.len()
            ),
            found,
        })
    }

    /// Resolve the id of the organization root.
    pub async fn root_id(&self) -> Result<String, RelocationError> {
        let roots = self
            .client
            .list_roots()
            .await
            .map_err(RelocationError::Lookup)?;

        if let [root] = roots.as_slice() {
            return Ok(root.id.clone());
        }

        let found: Vec<String> = roots.into_iter().map(|r| r.id).collect();
        Err(RelocationError::Consistency {
            detail: format!(
                "organization reports {} roots, expected exactly one",
                found.len()
            ),
            found,
        })
    }
}
