//! Metadata retrieval, decoding, and validation gating.
//!
//! [`fetch_and_validate`] is the pipeline between the query source and
//! record assembly: it selects a retrieval strategy for the dissemination
//! locator, streams the response body, decodes it using the charset declared
//! by the transport layer, submits the text to the validator, and, when the
//! verdict allows embedding, strips any XML declaration prologue so the
//! record body never contains a nested declaration.
//!
//! # Known limitation
//!
//! The transport-declared charset is trusted even when the XML document
//! self-declares a different encoding. This matches the legacy provider
//! behavior and is kept deliberately; sniffing the document's own
//! declaration would silently change semantics. A byte-order mark, if
//! present, still takes precedence over the label during decoding.

use std::io::Read;

use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::error::{ProviderError, Result};
use crate::query::{QuerySource, RetrievalStrategy};
use crate::validate::{ValidationOutcome, Validator};

lazy_static! {
    /// An XML declaration token and its surrounding whitespace.
    static ref XML_DECLARATION: Regex =
        Regex::new(r"\s*<\?xml.*?\?>\s*").expect("declaration pattern compiles");
}

/// Retrieve a resource's metadata body, decode it, and gate it through the
/// validator.
///
/// On an `invalid` verdict the text is returned unmodified together with the
/// outcome; the caller must not embed it. On `valid` or `unknown` the
/// returned text has any XML declaration stripped and is ready for
/// embedding. The response's connection handle is released on every exit
/// path, including errors mid-read.
///
/// # Errors
///
/// - [`ProviderError::Retrieval`] when the query source fails or the body
///   cannot be read to the end.
/// - [`ProviderError::EmptyBody`] when the response carries no body stream.
/// - [`ProviderError::Encoding`] when the transport-declared charset label
///   is not a known encoding.
pub fn fetch_and_validate<Q, V>(
    query: &Q,
    validator: &V,
    resource_id: &str,
    locator: &str,
    resource_type: &str,
    md_prefix: &str,
) -> Result<(String, ValidationOutcome)>
where
    Q: QuerySource + ?Sized,
    V: Validator + ?Sized,
{
    let mut content = match RetrievalStrategy::select(locator) {
        RetrievalStrategy::CanonicalDc => query.fetch_canonical_view(resource_id, resource_type)?,
        RetrievalStrategy::RawResource => {
            query.fetch_raw_resource(resource_id, resource_type, locator)?
        }
        RetrievalStrategy::NamedRecord => {
            query.fetch_named_record(resource_id, resource_type, locator)?
        }
    };

    // `content` releases its connection when it drops, on every path below.
    let Some(mut body) = content.take_body() else {
        return Err(ProviderError::EmptyBody {
            resource_id: resource_id.to_string(),
            md_prefix: md_prefix.to_string(),
        });
    };

    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)
        .map_err(|e| ProviderError::Retrieval(format!("IO error reading {locator}: {e}")))?;

    let xml = decode_body(&bytes, content.charset())?;

    let outcome = validator.validate(md_prefix, &xml);
    if outcome.is_invalid() {
        return Ok((xml, outcome));
    }

    let xml = XML_DECLARATION.replace_all(&xml, "").into_owned();
    Ok((xml, outcome))
}

/// Decode a response body using the transport-declared charset label.
fn decode_body(bytes: &[u8], charset: &str) -> Result<String> {
    let encoding = Encoding::for_label(charset.as_bytes()).ok_or_else(|| {
        ProviderError::Encoding(format!("unsupported transport charset label: '{charset}'"))
    })?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            charset,
            "response body contained byte sequences invalid for the declared charset; \
             replacement characters substituted"
        );
    }
    Ok(text.into_owned())
}
