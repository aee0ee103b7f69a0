//! The metadata-validation collaborator interface.
//!
//! Validation is pluggable: the provider core submits each fetched metadata
//! document to a [`Validator`] and propagates the [`ValidationOutcome`] to
//! its caller. An `invalid` verdict is a normal, reportable result, not an
//! error; it tells the caller to suppress the record rather than embed a
//! nonconforming body.

use serde::{Deserialize, Serialize};

/// Verdict of schema/content conformance for a metadata document,
/// independent of transport success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
    /// The document conforms to its declared format.
    Valid,
    /// The document does not conform; it must not be embedded in a record.
    Invalid,
    /// The validator could not or did not check the document.
    Unknown,
}

/// Outcome produced by the external validator for one metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Conformance verdict.
    pub result: ValidationResult,
    /// Diagnostic details accompanying the verdict, if any.
    pub details: Option<String>,
}

impl ValidationOutcome {
    /// A `valid` outcome with no diagnostics.
    #[must_use]
    pub fn valid() -> Self {
        ValidationOutcome {
            result: ValidationResult::Valid,
            details: None,
        }
    }

    /// An `invalid` outcome carrying diagnostic details.
    #[must_use]
    pub fn invalid(details: impl Into<String>) -> Self {
        ValidationOutcome {
            result: ValidationResult::Invalid,
            details: Some(details.into()),
        }
    }

    /// An `unknown` outcome, for documents the validator did not check.
    #[must_use]
    pub fn unknown() -> Self {
        ValidationOutcome {
            result: ValidationResult::Unknown,
            details: None,
        }
    }

    /// Whether the verdict is [`ValidationResult::Invalid`].
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.result == ValidationResult::Invalid
    }
}

/// Pluggable validator certifying a metadata document against the format
/// named by its prefix.
///
/// Implementations live outside this crate. `unknown` is an acceptable
/// verdict for formats the validator cannot check.
pub trait Validator {
    /// Validate `xml` against the format named by `md_prefix`.
    fn validate(&self, md_prefix: &str, xml: &str) -> ValidationOutcome;
}
