//! Error types for the convective-profile crate.
use crate::met_formulas::DomainError;
use thiserror::Error;

/// Error type for the crate.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum AnalysisError {
    /// Not enough usable levels to build a profile.
    #[error("Only {usable} usable levels in the profile, at least 3 are required.")]
    InsufficientProfile {
        /// Number of levels that survived the profile assembly.
        usable: usize,
    },
    /// Bad or invalid input, rejected before it reaches the numeric kernel.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Forward an error from the thermodynamic kernel.
    #[error("Thermodynamic domain error: {0}")]
    Domain(#[from] DomainError),
    /// The configuration document could not be read.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A collaborator failed to deliver its data.
    #[error("Data source failure: {0}")]
    Source(String),
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, AnalysisError>;

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Config(err.to_string())
    }
}
