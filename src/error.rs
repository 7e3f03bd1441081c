//! Error taxonomy (spec.md §7). Mirrors
//! `api_connection::connection::ApiConnectionError`: a hand-rolled enum with
//! manual `Display`/`std::error::Error` impls and `From` conversions, used
//! at the boundaries the `anyhow::Result` call chain crosses into typed
//! matching (e.g. the batch driver deciding whether to reconnect).

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// Catalog gateway returned an error or timed out.
    CatalogUnavailable(String),
    /// All search variants came back empty, or every candidate was rejected.
    NoCandidates { core_class: String },
    /// A required profile/band/synonym entry was missing for an eligible class.
    ConfigMissing { core_class: String, table: &'static str },
    /// The result builder's telemetry assertion failed. Fatal at the batch level.
    InvariantViolation(String),
    /// Atwater check failed, the energy clamp bound, and resulting confidence
    /// would fall below 0.1 — the caller falls through to the next stage.
    ConversionImplausible(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::CatalogUnavailable(msg) => write!(f, "catalog unavailable: {msg}"),
            EngineError::NoCandidates { core_class } => {
                write!(f, "no candidates survived for core class '{core_class}'")
            }
            EngineError::ConfigMissing { core_class, table } => {
                write!(f, "config table '{table}' has no entry for '{core_class}'")
            }
            EngineError::InvariantViolation(msg) => write!(f, "telemetry invariant violated: {msg}"),
            EngineError::ConversionImplausible(msg) => write!(f, "conversion implausible: {msg}"),
        }
    }
}

impl Error for EngineError {}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::CatalogUnavailable(err.to_string())
    }
}
