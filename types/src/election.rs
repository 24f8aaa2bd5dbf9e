//! Election definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::TypesError;
use crate::height::{progress, progress_pct, ProgressReading, SyncHeight};

/// One answer on the ballot. The address is the candidate's unique key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: String,
    pub choice: String,
}

/// A voting event: a question, its candidates, and the registration window.
///
/// An election whose `id` is empty is the "absent" sentinel and means no
/// election is loaded. [`Election::default`] is that sentinel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub question: String,
    pub start_height: u32,
    pub end_height: u32,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub signature_required: bool,
    /// Fields this client does not interpret, passed back to the backend as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Election {
    /// Parse a published election document.
    ///
    /// Besides the JSON shape, a document must carry an id and must not list
    /// the same candidate address twice.
    pub fn from_document(body: &str) -> Result<Self, TypesError> {
        let election: Election = serde_json::from_str(body)
            .map_err(|e| TypesError::InvalidElection(e.to_string()))?;
        if election.is_absent() {
            return Err(TypesError::MissingElectionId);
        }
        let mut seen = HashSet::new();
        for candidate in &election.candidates {
            if !seen.insert(candidate.address.as_str()) {
                return Err(TypesError::DuplicateCandidate(candidate.address.clone()));
            }
        }
        Ok(election)
    }

    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        !self.is_absent()
    }

    pub fn candidate(&self, address: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.address == address)
    }

    /// The choice label for a candidate address, if it is on the ballot.
    pub fn choice_for(&self, address: &str) -> Option<&str> {
        self.candidate(address).map(|c| c.choice.as_str())
    }

    pub fn progress_pct(&self, height: SyncHeight) -> Option<f64> {
        progress_pct(height, self.start_height, self.end_height)
    }

    pub fn progress(&self, height: SyncHeight) -> Option<ProgressReading> {
        progress(height, self.start_height, self.end_height)
    }
}
