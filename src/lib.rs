#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Architecture
//!
//! The core is two independent pipelines over a handful of leaf components:
//!
//! - **Record synthesis** — [`RecordSynthesizer`] parses the compact
//!   [`SourceDescriptor`], emits the protocol header (with deleted-record
//!   handling), and for live records delegates to
//!   [`fetch::fetch_and_validate`], which selects a [`RetrievalStrategy`],
//!   queries the external [`QuerySource`], decodes the body with the
//!   transport-declared charset, and gates it through the external
//!   [`Validator`].
//! - **Set extraction** — [`SetHierarchyExtractor`] consumes paginated
//!   hierarchy listings and accumulates [`SetDescriptor`] entries, tracking
//!   pagination completion per [`HierarchyKind`].
//!
//! [`FormatRegistry`] and [`ProviderConfig`] are built once from
//! configuration and are read-only afterwards, so they can be shared across
//! concurrent synthesis calls without locking. The extractor, by contrast,
//! is session-scoped mutable state and must not be shared between concurrent
//! traversals.

pub mod config;
pub mod datestamp;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod query;
pub mod sets;
pub mod synthesizer;
pub mod validate;

pub use config::{Properties, ProviderConfig};
pub use descriptor::SourceDescriptor;
pub use error::{ProviderError, Result};
pub use formats::{
    FormatRegistry, MetadataFormat, DC_NAMESPACE_URI, DC_SCHEMA_LOCATION, OAI_DC_PREFIX,
};
pub use query::{ConnectionHandle, QuerySource, RemoteContent, RetrievalStrategy};
pub use sets::{HierarchyKind, SetDescriptor, SetHierarchyExtractor};
pub use synthesizer::{RecordSynthesizer, SynthesizedRecord, OAI_RECORD_NAMESPACE};
pub use validate::{ValidationOutcome, ValidationResult, Validator};
