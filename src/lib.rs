//! KVStore Overlay Topic Manager
//!
//! Classifies the outputs of a parsed transaction as admissible (or not)
//! for a key-value publication overlay topic. Outputs qualify when their
//! locking script decodes as a tagged-data token carrying exactly two
//! fields with a 32-byte protected key in the first.

pub mod admission;
pub mod decoder;
pub mod errors;
pub mod types;

pub use admission::KvstoreTopicManager;
pub use decoder::{DecodedToken, PushDropDecoder, ScriptDecoder};
pub use errors::AdmissionError;
pub use types::{AdmissionResult, PreviousUtxo};
