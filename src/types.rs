//! KVStore Overlay Topic Manager - boundary types
//!
//! The types exchanged with the caller/persistence layer. Everything here
//! is transient - built fresh per admission call, no state owned.

use serde::{Deserialize, Serialize};

/// Byte length of the protected key carried in a token's first data field
pub const PROTECTED_KEY_LEN: usize = 32;

/// Number of data fields a KVStore token carries (protected key + value)
pub const KVSTORE_FIELD_COUNT: usize = 2;

/// An output of this topic admitted by a prior transaction
///
/// Opaque to the filter beyond its stable identifier - the persistence
/// layer owns the full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousUtxo {
    pub id: String,
}

impl PreviousUtxo {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Outcome of one admission pass over a parsed transaction
///
/// Field names serialise in camelCase to match the JSON shape the overlay
/// node exchanges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    /// Indices of outputs carrying a structurally valid KVStore token,
    /// in ascending order
    pub outputs_to_admit: Vec<u32>,
    /// Identifiers of previously tracked outputs to keep tracking
    pub outputs_to_retain: Vec<String>,
}

impl AdmissionResult {
    /// The all-failure result: nothing admitted, nothing retained
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs_to_admit.is_empty() && self.outputs_to_retain.is_empty()
    }
}
