//! Retrieval-strategy selection and the query-source collaborator interface.
//!
//! A resource's dissemination locator decides which retrieval operation the
//! repository must perform; [`RetrievalStrategy::select`] encodes that
//! decision as a total function. The [`QuerySource`] trait is the seam to
//! the repository's actual search/retrieval endpoints, which live outside
//! this crate. Responses come back as [`RemoteContent`]: a body stream, the
//! charset declared by the transport layer, and a connection handle that is
//! released when the value drops, on every exit path.

use std::fmt;
use std::io::Read;

use tracing::warn;

use crate::error::Result;

/// Retrieval operation the query source must perform for a dissemination
/// locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Fetch the canonical Dublin Core view of the resource.
    CanonicalDc,
    /// Fetch a raw resource addressed by the locator.
    RawResource,
    /// Fetch a named metadata-record stream addressed by the locator.
    NamedRecord,
}

impl RetrievalStrategy {
    /// Choose the retrieval operation for a dissemination locator.
    ///
    /// Total over all inputs: the locator `DC` selects the canonical Dublin
    /// Core view, locators beginning with `resources` select raw-resource
    /// retrieval, everything else selects a named metadata-record stream.
    #[must_use]
    pub fn select(locator: &str) -> Self {
        if locator == "DC" {
            RetrievalStrategy::CanonicalDc
        } else if locator.starts_with("resources") {
            RetrievalStrategy::RawResource
        } else {
            RetrievalStrategy::NamedRecord
        }
    }
}

/// Releasable transport handle backing a [`RemoteContent`] body.
pub trait ConnectionHandle: Send {
    /// Release the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns the transport's error when the release itself fails. Callers
    /// log such failures; they never mask the original operation's outcome.
    fn release(&mut self) -> std::io::Result<()>;
}

/// Response obtained from the query source.
///
/// Exclusively owned by the fetch call that requested it. The attached
/// connection handle, if any, is released when the value drops, including
/// on error paths through the fetch pipeline. Release failures are logged,
/// not escalated.
pub struct RemoteContent {
    body: Option<Box<dyn Read + Send>>,
    charset: String,
    handle: Option<Box<dyn ConnectionHandle>>,
}

impl RemoteContent {
    /// Wrap a body stream and the transport-declared charset of the
    /// response.
    #[must_use]
    pub fn new(body: Box<dyn Read + Send>, charset: impl Into<String>) -> Self {
        RemoteContent {
            body: Some(body),
            charset: charset.into(),
            handle: None,
        }
    }

    /// A response that arrived without a body.
    #[must_use]
    pub fn empty(charset: impl Into<String>) -> Self {
        RemoteContent {
            body: None,
            charset: charset.into(),
            handle: None,
        }
    }

    /// Attach a releasable connection handle.
    #[must_use]
    pub fn with_handle(mut self, handle: Box<dyn ConnectionHandle>) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Charset declared by the transport layer of the response.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Take the body stream, if any. Subsequent calls return `None`.
    pub fn take_body(&mut self) -> Option<Box<dyn Read + Send>> {
        self.body.take()
    }
}

impl fmt::Debug for RemoteContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteContent")
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .field("charset", &self.charset)
            .field("handle", &self.handle.as_ref().map(|_| "<handle>"))
            .finish()
    }
}

impl Drop for RemoteContent {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.release() {
                warn!(error = %e, "failed to release retrieval connection");
            }
        }
    }
}

/// The repository's search/retrieval endpoints, queried per strategy.
///
/// Each method must expose the response's transport-declared charset and a
/// releasable connection handle through the returned [`RemoteContent`].
/// Timeout and cancellation, if desired, are enforced by the implementation
/// and surfaced as [`ProviderError::Retrieval`](crate::error::ProviderError).
pub trait QuerySource {
    /// Retrieve the canonical Dublin Core view of a resource.
    ///
    /// # Errors
    ///
    /// Returns a retrieval error when the repository cannot produce a
    /// response.
    fn fetch_canonical_view(&self, resource_id: &str, resource_type: &str)
        -> Result<RemoteContent>;

    /// Retrieve a raw resource addressed by `locator`.
    ///
    /// # Errors
    ///
    /// Returns a retrieval error when the repository cannot produce a
    /// response.
    fn fetch_raw_resource(
        &self,
        resource_id: &str,
        resource_type: &str,
        locator: &str,
    ) -> Result<RemoteContent>;

    /// Retrieve a named metadata-record stream addressed by `locator`.
    ///
    /// # Errors
    ///
    /// Returns a retrieval error when the repository cannot produce a
    /// response.
    fn fetch_named_record(
        &self,
        resource_id: &str,
        resource_type: &str,
        locator: &str,
    ) -> Result<RemoteContent>;
}
