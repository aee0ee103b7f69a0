//! Configuration access for the provider core.
//!
//! Property loading itself is an external concern. This module consumes an
//! already-loaded, string-keyed property map: [`required`] fails with
//! [`ProviderError::Configuration`] when a key is absent, [`optional`]
//! returns `None`. The `PROP_*` constants name every key the core reads.
//!
//! [`ProviderConfig`] resolves the repository endpoint settings read once at
//! initialization; both base URLs are normalized to end with `/` so path
//! segments can be appended directly.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ProviderError, Result};

/// String-keyed configuration properties, loaded by the host.
pub type Properties = HashMap<String, String>;

/// Repository base URL.
pub const PROP_BASE_URL: &str = "provider.baseURL";

/// Repository search/listing base URL.
pub const PROP_SEARCH_BASE_URL: &str = "provider.search.baseURL";

/// OAI namespace identifier used when building item identifiers.
pub const PROP_NAMESPACE_IDENTIFIER: &str = "provider.namespace-identifier";

/// Space-separated list of declared metadata format prefixes.
pub const PROP_FORMATS: &str = "provider.md.formats";

/// Common prefix of all per-format keys.
pub const PROP_FORMAT_START: &str = "provider.md.format.";

/// Per-format key suffix: alias that renames the lookup prefix.
pub const PROP_FORMAT_PFX_END: &str = ".mdPrefix";

/// Per-format key suffix: schema location URI.
pub const PROP_FORMAT_LOC_END: &str = ".loc";

/// Per-format key suffix: metadata namespace URI.
pub const PROP_FORMAT_URI_END: &str = ".uri";

/// Per-format key suffix: dissemination type.
pub const PROP_FORMAT_DISSTYPE_END: &str = ".dissType";

/// Look up a required property, trimmed.
///
/// # Errors
///
/// Returns [`ProviderError::Configuration`] naming the key when it is absent.
pub fn required(props: &Properties, key: &str) -> Result<String> {
    let val = props
        .get(key)
        .ok_or_else(|| ProviderError::Configuration(key.to_string()))?;
    debug!(key, value = val.as_str(), "required property");
    Ok(val.trim().to_string())
}

/// Look up an optional property, trimmed. Absent keys yield `None`.
#[must_use]
pub fn optional<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props.get(key).map(|val| val.trim())
}

/// Repository endpoint settings resolved at initialization.
///
/// Read-only after construction and safe to share across concurrent
/// synthesis calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the repository's retrieval endpoints, `/`-terminated.
    pub base_url: String,
    /// Base URL of the repository's search endpoints, `/`-terminated.
    pub search_base_url: String,
    /// Namespace identifier for item identifiers minted by this provider.
    pub namespace_identifier: String,
}

impl ProviderConfig {
    /// Resolve the endpoint settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when any of the three keys
    /// is absent.
    pub fn from_props(props: &Properties) -> Result<Self> {
        let mut base_url = required(props, PROP_BASE_URL)?;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let mut search_base_url = required(props, PROP_SEARCH_BASE_URL)?;
        if !search_base_url.ends_with('/') {
            search_base_url.push('/');
        }
        let namespace_identifier = required(props, PROP_NAMESPACE_IDENTIFIER)?;
        Ok(ProviderConfig {
            base_url,
            search_base_url,
            namespace_identifier,
        })
    }
}
