//! Error types for post analysis.
//!
//! Malformed markup is never an error; the only failures the analyzer can
//! report come from the classifier it was given.

use thiserror::Error;

/// Failures of a classifier invocation.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    /// The inference service could not be reached or the request failed in transit.
    #[error("classifier request failed: {0}")]
    Transport(String),

    /// The inference service answered with a non-success status.
    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a prediction.
    #[error("could not decode classifier response: {0}")]
    Decode(String),

    /// The prediction lacks a score for the code class.
    #[error("prediction has {0} scores, expected at least 2")]
    MalformedPrediction(usize),
}

/// Errors returned by [`crate::analyzer::PostAnalyzer`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

pub type Result<T> = std::result::Result<T, Error>;
