//! Record synthesis: header and metadata-body emission.
//!
//! [`RecordSynthesizer`] orchestrates one synthesis call: parse the compact
//! source descriptor, emit the protocol header (deleted records use the
//! modification date as datestamp, live records the release date), fetch and
//! validate the metadata body for live records, and close the record.
//!
//! Deleted records never trigger a fetch or a validation call (validation
//! is only meaningful for records with a body); their suppression is
//! logged. An `invalid` verdict closes the record without a metadata block
//! and surfaces the outcome so the caller can suppress the record upstream.

use std::fmt::Write;

use tracing::info;

use crate::datestamp::to_utc_datestamp;
use crate::descriptor::SourceDescriptor;
use crate::error::Result;
use crate::fetch::fetch_and_validate;
use crate::query::QuerySource;
use crate::validate::{ValidationOutcome, Validator};

/// Namespace of the protocol `<record>` element.
pub const OAI_RECORD_NAMESPACE: &str = "http://www.openarchives.org/OAI/2.0/";

/// Result of one synthesis call.
///
/// `validation` is `None` for deleted records: no body is fetched, so there
/// is nothing to validate.
#[derive(Debug, Clone)]
pub struct SynthesizedRecord {
    /// Full protocol `<record>` element.
    pub xml: String,
    /// Validation outcome for the fetched body, when one was fetched.
    pub validation: Option<ValidationOutcome>,
}

/// Synthesizes protocol records from compact source descriptors.
///
/// Holds the two external collaborators and no per-call state, so one
/// instance is safely shared across concurrent synthesis calls.
#[derive(Debug)]
pub struct RecordSynthesizer<Q, V> {
    query: Q,
    validator: V,
}

impl<Q: QuerySource, V: Validator> RecordSynthesizer<Q, V> {
    /// Create a synthesizer over a query source and a validator.
    pub fn new(query: Q, validator: V) -> Self {
        RecordSynthesizer { query, validator }
    }

    /// Synthesize the record for `item_id` in the format named by
    /// `md_prefix` from its compact source descriptor.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::MalformedDescriptor`](crate::error::ProviderError)
    ///   when the descriptor has fewer than six fields or a date field
    ///   cannot be parsed.
    /// - [`ProviderError::Retrieval`](crate::error::ProviderError) /
    ///   [`ProviderError::EmptyBody`](crate::error::ProviderError) when the
    ///   query source fails for a live record.
    ///
    /// A failed call affects this record only; callers synthesizing a batch
    /// isolate failures per item.
    pub fn synthesize(
        &self,
        item_id: &str,
        md_prefix: &str,
        source_info: &str,
    ) -> Result<SynthesizedRecord> {
        let descriptor = SourceDescriptor::parse(source_info)?;

        let mut xml = String::new();
        writeln!(xml, "<record xmlns=\"{OAI_RECORD_NAMESPACE}\">").ok();
        if descriptor.deleted {
            write_header(&mut xml, item_id, true, &descriptor.date)?;
        } else {
            write_header(&mut xml, item_id, false, &descriptor.release_date)?;
        }

        let mut validation = None;
        if descriptor.deleted {
            info!(item_id, md_prefix, "record was marked deleted; metadata suppressed");
        } else {
            let (body, outcome) = fetch_and_validate(
                &self.query,
                &self.validator,
                &descriptor.resource_id,
                &descriptor.dissemination_locator,
                &descriptor.resource_type,
                md_prefix,
            )?;
            if !outcome.is_invalid() {
                xml.push_str("  <metadata>\n");
                xml.push_str(&body);
                if !body.ends_with('\n') {
                    xml.push('\n');
                }
                xml.push_str("  </metadata>\n");
            }
            validation = Some(outcome);
        }

        xml.push_str("</record>\n");
        Ok(SynthesizedRecord { xml, validation })
    }
}

fn write_header(xml: &mut String, item_id: &str, deleted: bool, date: &str) -> Result<()> {
    if deleted {
        xml.push_str("  <header status=\"deleted\">\n");
    } else {
        xml.push_str("  <header>\n");
    }
    writeln!(xml, "    <identifier>{item_id}</identifier>").ok();
    writeln!(xml, "    <datestamp>{}</datestamp>", to_utc_datestamp(date)?).ok();
    xml.push_str("  </header>\n");
    Ok(())
}
