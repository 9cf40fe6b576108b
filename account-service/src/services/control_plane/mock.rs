//! Scripted in-memory control plane for testing.
//!
//! Status reads pop from a script; once it runs dry the request reports
//! `IN_PROGRESS` forever. Successful moves update the recorded parent so
//! repeated relocations observe their own effect.

use super::ControlPlane;
use crate::error::ControlPlaneError;
use crate::models::{CreateAccountRequest, ParentContainer, RequestStatusSnapshot, Root};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const MOCK_REQUEST_ID: &str = "car-mock0000000000000000000000000000";

/// A move the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub account_id: String,
    pub source_parent_id: String,
    pub destination_parent_id: String,
}

#[derive(Default)]
struct MockState {
    submission_failure: Option<ControlPlaneError>,
    statuses: VecDeque<Result<RequestStatusSnapshot, ControlPlaneError>>,
    parents: HashMap<String, Vec<ParentContainer>>,
    lookup_failure: Option<ControlPlaneError>,
    move_failure: Option<ControlPlaneError>,
    roots: Vec<Root>,
    create_calls: Vec<CreateAccountRequest>,
    describe_calls: usize,
    list_parents_calls: usize,
    list_roots_calls: usize,
    move_calls: usize,
    moves: Vec<RecordedMove>,
}

/// Mock control plane for testing.
#[derive(Default)]
pub struct MockControlPlane {
    state: Mutex<MockState>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue status snapshots returned by successive status reads.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RequestStatusSnapshot>) -> Self {
        self.state().statuses.extend(statuses.into_iter().map(Ok));
        self
    }

    /// Queue a failing status read.
    pub fn with_status_error(self, error: ControlPlaneError) -> Self {
        self.state().statuses.push_back(Err(error));
        self
    }

    pub fn fail_submission(self, error: ControlPlaneError) -> Self {
        self.state().submission_failure = Some(error);
        self
    }

    pub fn with_parents(self, account_id: &str, parents: Vec<ParentContainer>) -> Self {
        self.state().parents.insert(account_id.to_string(), parents);
        self
    }

    pub fn with_parent(self, account_id: &str, parent: ParentContainer) -> Self {
        self.with_parents(account_id, vec![parent])
    }

    /// Fail parent and root lookups.
    pub fn fail_lookups(self, error: ControlPlaneError) -> Self {
        self.state().lookup_failure = Some(error);
        self
    }

    pub fn fail_moves(self, error: ControlPlaneError) -> Self {
        self.state().move_failure = Some(error);
        self
    }

    pub fn with_roots(self, roots: Vec<Root>) -> Self {
        self.state().roots = roots;
        self
    }

    pub fn create_calls(&self) -> Vec<CreateAccountRequest> {
        self.state().create_calls.clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.state().describe_calls
    }

    pub fn list_parents_calls(&self) -> usize {
        self.state().list_parents_calls
    }

    pub fn list_roots_calls(&self) -> usize {
        self.state().list_roots_calls
    }

    /// Number of move attempts, including rejected ones.
    pub fn move_calls(&self) -> usize {
        self.state().move_calls
    }

    /// Moves that were accepted.
    pub fn moves(&self) -> Vec<RecordedMove> {
        self.state().moves.clone()
    }

    /// Number of remote calls of any kind.
    pub fn total_calls(&self) -> usize {
        let state = self.state();
        state.create_calls.len()
            + state.describe_calls
            + state.list_parents_calls
            + state.list_roots_calls
            + state.move_calls
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<String, ControlPlaneError> {
        let mut state = self.state();
        state.create_calls.push(request.clone());

        match &state.submission_failure {
            Some(err) => Err(err.clone()),
            None => Ok(MOCK_REQUEST_ID.to_string()),
        }
    }

    async fn describe_account_request(
        &self,
        request_id: &str,
    ) -> Result<RequestStatusSnapshot, ControlPlaneError> {
        let mut state = self.state();
        state.describe_calls += 1;

        match state.statuses.pop_front() {
            Some(Ok(mut snapshot)) => {
                snapshot.id = request_id.to_string();
                Ok(snapshot)
            }
            Some(Err(err)) => Err(err),
            None => Ok(RequestStatusSnapshot::in_progress(request_id)),
        }
    }

    async fn list_parents(
        &self,
        account_id: &str,
    ) -> Result<Vec<ParentContainer>, ControlPlaneError> {
        let mut state = self.state();
        state.list_parents_calls += 1;

        if let Some(err) = &state.lookup_failure {
            return Err(err.clone());
        }

        state
            .parents
            .get(account_id)
            .cloned()
            .ok_or_else(|| ControlPlaneError::Api {
                code: "ChildNotFoundException".to_string(),
                message: format!("Account {} not found", account_id),
                status: 400,
            })
    }

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<(), ControlPlaneError> {
        let mut state = self.state();
        state.move_calls += 1;

        if let Some(err) = &state.move_failure {
            return Err(err.clone());
        }

        let destination = if state.roots.iter().any(|r| r.id == destination_parent_id) {
            ParentContainer::root(destination_parent_id)
        } else {
            ParentContainer::organizational_unit(destination_parent_id)
        };
        state
            .parents
            .insert(account_id.to_string(), vec![destination]);
        state.moves.push(RecordedMove {
            account_id: account_id.to_string(),
            source_parent_id: source_parent_id.to_string(),
            destination_parent_id: destination_parent_id.to_string(),
        });

        Ok(())
    }

    async fn list_roots(&self) -> Result<Vec<Root>, ControlPlaneError> {
        let mut state = self.state();
        state.list_roots_calls += 1;

        if let Some(err) = &state.lookup_failure {
            return Err(err.clone());
        }
        Ok(state.roots.clone())
    }
}
