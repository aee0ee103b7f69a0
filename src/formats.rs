//! Metadata format registry.
//!
//! The registry maps format prefixes to [`MetadataFormat`] descriptors,
//! built once from configuration and read-only afterwards, so it can be
//! shared across concurrent synthesis calls without locking.
//!
//! Two rules are load-bearing and must not be simplified away:
//!
//! - Whenever the effective prefix is `oai_dc`, the namespace URI and schema
//!   location are forced to the protocol's fixed Dublin Core constants;
//!   configuration cannot override Dublin Core identity.
//! - A registry is never returned without a usable `oai_dc` entry: if the
//!   configuration omits it, a default entry with dissemination type `DC` is
//!   registered and a warning logged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{
    self, Properties, PROP_FORMATS, PROP_FORMAT_DISSTYPE_END, PROP_FORMAT_LOC_END,
    PROP_FORMAT_PFX_END, PROP_FORMAT_START, PROP_FORMAT_URI_END,
};
use crate::error::Result;

/// Prefix of the Dublin Core format every provider must expose.
pub const OAI_DC_PREFIX: &str = "oai_dc";

/// Fixed Dublin Core namespace URI required by the protocol.
pub const DC_NAMESPACE_URI: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";

/// Fixed Dublin Core schema location required by the protocol.
pub const DC_SCHEMA_LOCATION: &str = "http://www.openarchives.org/OAI/2.0/oai_dc.xsd";

/// Descriptor of one harvestable metadata format.
///
/// Immutable once constructed; identity is the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFormat {
    /// Prefix harvest requests use to name this format.
    pub prefix: String,
    /// Namespace URI of documents in this format.
    pub namespace_uri: String,
    /// Schema location URI of documents in this format.
    pub schema_location: String,
    /// Name of the repository view that disseminates this format.
    pub dissemination_type: String,
}

/// Mapping of format prefix to descriptor, in declaration order.
///
/// Built once at initialization and owned for the process lifetime.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: IndexMap<String, MetadataFormat>,
}

impl FormatRegistry {
    /// Build the registry from configuration.
    ///
    /// Reads the space-separated prefix list, then per declared prefix the
    /// required namespace-URI and schema-location keys. An optional alias
    /// key renames the lookup prefix; the required dissemination-type key is
    /// read under the effective (possibly aliased) prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`](crate::error::ProviderError)
    /// when the prefix list or any required per-format key is absent.
    pub fn build(props: &Properties) -> Result<Self> {
        let mut formats = IndexMap::new();
        let declared = config::required(props, PROP_FORMATS)?;

        for declared_prefix in declared.split_whitespace() {
            let namespace_uri = config::required(
                props,
                &format!("{PROP_FORMAT_START}{declared_prefix}{PROP_FORMAT_URI_END}"),
            )?;
            let schema_location = config::required(
                props,
                &format!("{PROP_FORMAT_START}{declared_prefix}{PROP_FORMAT_LOC_END}"),
            )?;

            let prefix = config::optional(
                props,
                &format!("{PROP_FORMAT_START}{declared_prefix}{PROP_FORMAT_PFX_END}"),
            )
            .unwrap_or(declared_prefix)
            .to_string();

            let dissemination_type = config::required(
                props,
                &format!("{PROP_FORMAT_START}{prefix}{PROP_FORMAT_DISSTYPE_END}"),
            )?;

            // Dublin Core identity is fixed by the protocol; configured
            // values for oai_dc are ignored.
            let (namespace_uri, schema_location) = if prefix == OAI_DC_PREFIX {
                (DC_NAMESPACE_URI.to_string(), DC_SCHEMA_LOCATION.to_string())
            } else {
                (namespace_uri, schema_location)
            };

            formats.insert(
                prefix.clone(),
                MetadataFormat {
                    prefix,
                    namespace_uri,
                    schema_location,
                    dissemination_type,
                },
            );
        }

        if !formats.contains_key(OAI_DC_PREFIX) {
            warn!(
                "oai_dc format is missing in the configuration; registering it \
                 with dissemination type 'DC'"
            );
            formats.insert(
                OAI_DC_PREFIX.to_string(),
                MetadataFormat {
                    prefix: OAI_DC_PREFIX.to_string(),
                    namespace_uri: DC_NAMESPACE_URI.to_string(),
                    schema_location: DC_SCHEMA_LOCATION.to_string(),
                    dissemination_type: "DC".to_string(),
                },
            );
        }

        Ok(FormatRegistry { formats })
    }

    /// Look up a format by prefix.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&MetadataFormat> {
        self.formats.get(prefix)
    }

    /// Whether a format with the given prefix is registered.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.formats.contains_key(prefix)
    }

    /// Registered formats, in declaration order (`oai_dc` last when it was
    /// synthesized).
    pub fn iter(&self) -> impl Iterator<Item = &MetadataFormat> {
        self.formats.values()
    }

    /// Number of registered formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether the registry is empty. Never true after [`build`](Self::build).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    fn props(entries: &[(&str, &str)]) -> Properties {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_build_plain_format() {
        let p = props(&[
            (PROP_FORMATS, "mods"),
            ("provider.md.format.mods.uri", "http://www.loc.gov/mods/v3"),
            (
                "provider.md.format.mods.loc",
                "http://www.loc.gov/standards/mods/v3/mods-3-3.xsd",
            ),
            ("provider.md.format.mods.dissType", "escidoc"),
        ]);
        let registry = FormatRegistry::build(&p).unwrap();

        let mods = registry.get("mods").unwrap();
        assert_eq!(mods.namespace_uri, "http://www.loc.gov/mods/v3");
        assert_eq!(mods.dissemination_type, "escidoc");
    }

    #[test]
    fn test_missing_formats_key_fails() {
        let err = FormatRegistry::build(&props(&[])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_missing_uri_key_fails() {
        let p = props(&[
            (PROP_FORMATS, "mods"),
            ("provider.md.format.mods.loc", "http://example.org/mods.xsd"),
            ("provider.md.format.mods.dissType", "escidoc"),
        ]);
        assert!(FormatRegistry::build(&p).is_err());
    }

    #[test]
    fn test_alias_renames_lookup_prefix() {
        // Declared as `dc`, aliased to `oai_dc`: the dissemination type is
        // keyed by the effective prefix.
        let p = props(&[
            (PROP_FORMATS, "dc"),
            ("provider.md.format.dc.uri", "http://example.org/dc/"),
            ("provider.md.format.dc.loc", "http://example.org/dc.xsd"),
            ("provider.md.format.dc.mdPrefix", "oai_dc"),
            ("provider.md.format.oai_dc.dissType", "DC"),
        ]);
        let registry = FormatRegistry::build(&p).unwrap();

        assert!(registry.get("dc").is_none());
        assert!(registry.contains(OAI_DC_PREFIX));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_oai_dc_identity_cannot_be_overridden() {
        let p = props(&[
            (PROP_FORMATS, "oai_dc"),
            ("provider.md.format.oai_dc.uri", "http://example.org/wrong/"),
            ("provider.md.format.oai_dc.loc", "http://example.org/wrong.xsd"),
            ("provider.md.format.oai_dc.dissType", "DC"),
        ]);
        let registry = FormatRegistry::build(&p).unwrap();

        let dc = registry.get(OAI_DC_PREFIX).unwrap();
        assert_eq!(dc.namespace_uri, DC_NAMESPACE_URI);
        assert_eq!(dc.schema_location, DC_SCHEMA_LOCATION);
    }

    #[test]
    fn test_oai_dc_synthesized_when_absent() {
        let p = props(&[
            (PROP_FORMATS, "mods"),
            ("provider.md.format.mods.uri", "http://www.loc.gov/mods/v3"),
            ("provider.md.format.mods.loc", "http://example.org/mods.xsd"),
            ("provider.md.format.mods.dissType", "escidoc"),
        ]);
        let registry = FormatRegistry::build(&p).unwrap();

        let dc = registry.get(OAI_DC_PREFIX).unwrap();
        assert_eq!(dc.namespace_uri, DC_NAMESPACE_URI);
        assert_eq!(dc.schema_location, DC_SCHEMA_LOCATION);
        assert_eq!(dc.dissemination_type, "DC");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let p = props(&[
            (PROP_FORMATS, "mods oai_dc"),
            ("provider.md.format.mods.uri", "http://www.loc.gov/mods/v3"),
            ("provider.md.format.mods.loc", "http://example.org/mods.xsd"),
            ("provider.md.format.mods.dissType", "escidoc"),
            ("provider.md.format.oai_dc.uri", "ignored"),
            ("provider.md.format.oai_dc.loc", "ignored"),
            ("provider.md.format.oai_dc.dissType", "DC"),
        ]);
        let registry = FormatRegistry::build(&p).unwrap();
        let prefixes: Vec<&str> = registry.iter().map(|f| f.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["mods", "oai_dc"]);
    }
}
