//! Protocol datestamp normalization.
//!
//! Record headers carry second-precision UTC datestamps with a literal `Z`
//! suffix; the exact shape is a wire-compatibility requirement of the
//! harvesting protocol. Source timestamps arrive with arbitrary offsets and
//! are converted, not reformatted.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{ProviderError, Result};

/// Wire format of a protocol datestamp.
const DATESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Normalize a source timestamp to the protocol datestamp.
///
/// Accepts RFC 3339 timestamps with any offset and converts them to the
/// equivalent UTC instant. Timestamps without an offset are interpreted as
/// UTC. Fractional seconds are truncated.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedDescriptor`] when the timestamp cannot
/// be parsed; both date fields originate in the source descriptor.
pub fn to_utc_datestamp(raw: &str) -> Result<String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc).format(DATESTAMP_FORMAT).to_string());
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| {
            ProviderError::MalformedDescriptor(format!("unparseable datestamp: '{raw}'"))
        })?;
    Ok(naive.and_utc().format(DATESTAMP_FORMAT).to_string())
}
