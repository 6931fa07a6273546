//! Output admission for the KVStore overlay topic
//!
//! A single-pass, order-preserving scan over the outputs of a parsed
//! transaction. Each output either carries a structurally valid KVStore
//! token (exactly two data fields, 32-byte protected key first) or is
//! ignored. Previously tracked outputs are retained unconditionally;
//! pruning belongs to the persistence layer.

use bitcoin::{Script, Transaction};
use tracing::debug;

use crate::decoder::{DecoderError, PushDropDecoder, ScriptDecoder};
use crate::errors::{AdmissionCheck, AdmissionError};
use crate::types::{AdmissionResult, PreviousUtxo, KVSTORE_FIELD_COUNT, PROTECTED_KEY_LEN};

/// Why an individual output was passed over
///
/// These are classification outcomes, not failures - a rejected output is
/// simply not a candidate for this topic. They never leave the scan loop.
#[derive(Debug, thiserror::Error)]
enum OutputRejection {
    #[error("script is not a tagged-data token: {0}")]
    Undecodable(#[from] DecoderError),

    #[error("token has {found} data fields, expected 2")]
    WrongFieldCount { found: usize },

    #[error("protected key is {found} bytes, expected 32")]
    InvalidKeyLength { found: usize },
}

/// Admission filter for KVStore advertisement outputs
///
/// Stateless and side-effect free apart from decode calls; concurrent
/// invocations need no coordination.
#[derive(Debug, Clone, Default)]
pub struct KvstoreTopicManager<D = PushDropDecoder> {
    decoder: D,
}

impl KvstoreTopicManager<PushDropDecoder> {
    /// Manager backed by the built-in tagged-data script decoder
    pub fn new() -> Self {
        Self {
            decoder: PushDropDecoder,
        }
    }
}

impl<D: ScriptDecoder> KvstoreTopicManager<D> {
    /// Manager backed by a caller-supplied decoder
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Classify the outputs of `parsed_transaction` for this topic
    ///
    /// Returns the indices of outputs to admit and the identifiers of
    /// previously tracked outputs to retain (always all of them). Any
    /// admission failure - malformed transaction shape or no qualifying
    /// output at all - is normalised into an empty result: malformed or
    /// irrelevant transactions contribute nothing to the topic.
    pub fn identify_admissible_outputs(
        &self,
        previous_utxos: &[PreviousUtxo],
        parsed_transaction: &Transaction,
    ) -> AdmissionResult {
        match self.evaluate(previous_utxos, parsed_transaction) {
            Ok(result) => result,
            Err(reason) => {
                debug!("admission failed, returning empty result: {}", reason);
                AdmissionResult::empty()
            }
        }
    }

    /// Fallible admission pass, kept crate-visible so tests can tell the
    /// rejection reasons apart
    pub(crate) fn evaluate(
        &self,
        previous_utxos: &[PreviousUtxo],
        parsed_transaction: &Transaction,
    ) -> AdmissionCheck<AdmissionResult> {
        if parsed_transaction.input.is_empty() {
            return Err(AdmissionError::InputsRequired);
        }
        if parsed_transaction.output.is_empty() {
            return Err(AdmissionError::OutputsRequired);
        }

        // Strict ascending scan - admitted indices are positional
        let mut outputs_to_admit = Vec::new();
        for (vout, output) in parsed_transaction.output.iter().enumerate() {
            match self.classify_output(&output.script_pubkey) {
                Ok(()) => outputs_to_admit.push(vout as u32),
                Err(rejection) => {
                    debug!("output {} not admissible: {}", vout, rejection);
                }
            }
        }

        if outputs_to_admit.is_empty() {
            return Err(AdmissionError::NoValidAdvertisement);
        }

        Ok(AdmissionResult {
            outputs_to_admit,
            outputs_to_retain: previous_utxos.iter().map(|utxo| utxo.id.clone()).collect(),
        })
    }

    /// Structural check for a single output's locking script
    fn classify_output(&self, script_pubkey: &Script) -> Result<(), OutputRejection> {
        let token = self.decoder.decode(&script_pubkey.to_hex_string())?;

        if token.fields.len() != KVSTORE_FIELD_COUNT {
            return Err(OutputRejection::WrongFieldCount {
                found: token.fields.len(),
            });
        }
        if token.fields[0].len() != PROTECTED_KEY_LEN {
            return Err(OutputRejection::InvalidKeyLength {
                found: token.fields[0].len(),
            });
        }

        Ok(())
    }
}
