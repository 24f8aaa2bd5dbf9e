//! Read-only view of past submissions.

use std::sync::Arc;

use zvote_gateway::Backend;
use zvote_types::{Election, HistoryRow, VoteRecord};

use crate::store::SessionStore;
use crate::SessionError;

/// Label each record with the choice of the candidate it went to.
///
/// Records whose address is not on the ballot (delegations, or votes for
/// another election) get no label.
pub fn project_history(election: &Election, records: Vec<VoteRecord>) -> Vec<HistoryRow> {
    records
        .into_iter()
        .map(|record| HistoryRow {
            choice: election.choice_for(&record.address).map(str::to_string),
            id: record.id,
            hash: record.hash,
            address: record.address,
            amount: record.amount,
        })
        .collect()
}

#[derive(Clone)]
pub struct HistoryProjection {
    backend: Arc<dyn Backend>,
    store: SessionStore,
}

impl HistoryProjection {
    pub fn new(backend: Arc<dyn Backend>, store: SessionStore) -> Self {
        Self { backend, store }
    }

    /// Fetch every submission and join it against the loaded election.
    pub async fn load(&self) -> Result<Vec<HistoryRow>, SessionError> {
        let records = self
            .backend
            .fetch_votes()
            .await
            .map_err(SessionError::Backend)?;
        tracing::debug!(records = records.len(), "vote history fetched");
        Ok(project_history(&self.store.election(), records))
    }
}
