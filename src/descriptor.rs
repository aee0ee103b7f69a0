//! Compact source-descriptor parsing.
//!
//! The upstream listing collaborator describes each harvestable record as a
//! positional, whitespace-separated string of at least six fields:
//!
//! ```text
//! <resourceId> <disseminationLocator> <deleted> <date> <releaseDate> <resourceType> [reserved...]
//! ```
//!
//! Fields past the sixth are reserved for future set-spec hints and ignored.
//! Dates are carried through verbatim; parsing them is deferred to header
//! emission (see [`datestamp`](crate::datestamp)).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Parsed form of the compact per-record source descriptor.
///
/// Created per synthesis call and not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Repository identifier of the resource.
    pub resource_id: String,
    /// Opaque locator selecting which view of the resource to retrieve.
    pub dissemination_locator: String,
    /// Whether the record is marked deleted in the repository.
    pub deleted: bool,
    /// Modification timestamp, used as the datestamp of deleted records.
    pub date: String,
    /// Release timestamp, used as the datestamp of live records.
    pub release_date: String,
    /// Repository type of the resource (e.g. `item`).
    pub resource_type: String,
}

impl SourceDescriptor {
    /// Parse a raw descriptor string.
    ///
    /// The deleted flag is compared case-insensitively against `true`; any
    /// other value means live. No other field is validated here.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MalformedDescriptor`] when fewer than six
    /// whitespace-separated fields are present.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.trim().split_whitespace().collect();
        if parts.len() < 6 {
            return Err(ProviderError::MalformedDescriptor(format!(
                "expecting 6 or more fields: '{raw}'"
            )));
        }
        Ok(SourceDescriptor {
            resource_id: parts[0].to_string(),
            dissemination_locator: parts[1].to_string(),
            deleted: parts[2].eq_ignore_ascii_case("true"),
            date: parts[3].to_string(),
            release_date: parts[4].to_string(),
            resource_type: parts[5].to_string(),
        })
    }
}

impl FromStr for SourceDescriptor {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        SourceDescriptor::parse(s)
    }
}
