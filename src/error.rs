//! Error types for provider-core operations.
//!
//! This module provides the [`ProviderError`] type for all operations of the
//! provider core and the [`Result`] convenience type.
//!
//! A validation outcome of `invalid` is deliberately *not* an error: it is a
//! normal, reportable result carried by
//! [`ValidationOutcome`](crate::validate::ValidationOutcome) so the caller
//! can decide whether to suppress the record.

use thiserror::Error;

/// Error type for all provider-core operations.
///
/// Represents the failure conditions that can occur while building the
/// format registry, synthesizing records, or extracting set hierarchies.
/// Per-record failures (`MalformedDescriptor`, `Retrieval`, `EmptyBody`)
/// must not abort a batch; the surrounding harvesting loop isolates them
/// per item. `Configuration` is fatal at initialization.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required configuration property is absent.
    #[error("Required property is not set: {0}")]
    Configuration(String),

    /// The compact source descriptor for a record could not be used.
    #[error("Malformed source descriptor: {0}")]
    MalformedDescriptor(String),

    /// The query source could not produce a response.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The retrieval response carried no body stream.
    #[error("Body content of a retrieval response is missing for {resource_id}, md-prefix: {md_prefix}")]
    EmptyBody {
        /// Resource whose body was requested.
        resource_id: String,
        /// Metadata prefix the body was requested for.
        md_prefix: String,
    },

    /// A listing page carried a malformed pagination attribute or structure.
    #[error("Malformed listing page: {0}")]
    MalformedListing(String),

    /// Error related to character decoding of a response body.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error from the underlying XML parser.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;
