use thiserror::Error;

/// Admission failure taxonomy - single point of truth
///
/// Every variant is caught at the public boundary and normalised into an
/// empty [`crate::types::AdmissionResult`]; no error crosses the component
/// boundary.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// The parsed transaction carries no inputs
    #[error("transaction inputs are required")]
    InputsRequired,

    /// The parsed transaction carries no outputs
    #[error("transaction outputs are required")]
    OutputsRequired,

    /// No output in the transaction qualified as a token for this topic
    #[error("transaction does not publish a valid advertisement descriptor")]
    NoValidAdvertisement,
}

/// Result type for admission evaluation
pub type AdmissionCheck<T> = Result<T, AdmissionError>;
