//! Hierarchical set-list extraction.
//!
//! Repositories expose two resource hierarchies, organizational units and
//! contexts, as independently paginated XML listings.
//! [`SetHierarchyExtractor`] consumes listing pages incrementally and
//! accumulates one flat sequence of [`SetDescriptor`] entries in document
//! order across pages, while tracking per hierarchy kind how far pagination
//! has progressed.
//!
//! One extractor instance owns one extraction session: feed every page of
//! both kinds to the same instance. Counters and the accumulated sequence
//! persist across [`parse_page`](SetHierarchyExtractor::parse_page) calls
//! and never reset. Concurrent listing traversals each need their own
//! instance.
//!
//! # Example
//!
//! ```
//! use oaiprov::{HierarchyKind, SetHierarchyExtractor};
//!
//! let page = r#"<ou:organizational-unit-list
//!     xmlns:ou="http://www.escidoc.de/schemas/organizationalunit/0.4"
//!     xmlns:xlink="http://www.w3.org/1999/xlink"
//!     number-of-records="1">
//!   <ou:organizational-unit xlink:title="Some Institute"
//!       xlink:href="/oum/organizational-unit/escidoc:ex3"/>
//! </ou:organizational-unit-list>"#;
//!
//! let mut extractor = SetHierarchyExtractor::new();
//! extractor.parse_page(page)?;
//!
//! assert!(extractor.is_finished(HierarchyKind::OrganizationalUnit));
//! assert_eq!(extractor.sets()[0].set_spec, "ou_escidoc_ex3");
//! # Ok::<(), oaiprov::ProviderError>(())
//! ```

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// XLink namespace carrying the title/href attributes of hierarchy elements.
const XLINK_NAMESPACE_URI: &str = "http://www.w3.org/1999/xlink";

/// Namespace prefix of organizational-unit hierarchy elements.
const OU_URI_PREFIX: &str = "http://www.escidoc.de/schemas/organizationalunit";

/// Namespace prefix of context hierarchy elements.
const CONTEXT_URI_PREFIX: &str = "http://www.escidoc.de/schemas/context";

/// List-container attribute declaring the kind's total element count.
const NUMBER_OF_RECORDS_ATTR: &str = "number-of-records";

/// The two resource-hierarchy kinds a listing can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyKind {
    /// Organizational-unit hierarchy.
    OrganizationalUnit,
    /// Context hierarchy.
    Context,
}

impl HierarchyKind {
    /// Tag prepended to set specs derived from this kind.
    #[must_use]
    pub fn set_spec_prefix(self) -> &'static str {
        match self {
            HierarchyKind::OrganizationalUnit => "ou",
            HierarchyKind::Context => "context",
        }
    }

    fn from_container(local: &str) -> Option<Self> {
        match local {
            "organizational-unit-list" => Some(HierarchyKind::OrganizationalUnit),
            "context-list" => Some(HierarchyKind::Context),
            _ => None,
        }
    }

    fn from_element(local: &str, ns: Option<&str>) -> Option<Self> {
        match local {
            "organizational-unit" if ns.is_some_and(|uri| uri.starts_with(OU_URI_PREFIX)) => {
                Some(HierarchyKind::OrganizationalUnit)
            }
            "context" if ns.is_some_and(|uri| uri.starts_with(CONTEXT_URI_PREFIX)) => {
                Some(HierarchyKind::Context)
            }
            _ => None,
        }
    }
}

/// One set derived from a completed hierarchy element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDescriptor {
    /// Derived spec: the hierarchy-kind tag, `_`, and the resource id with
    /// `:` replaced by `_`.
    pub set_spec: String,
    /// Element title; empty when the listing carries none.
    pub title: String,
    /// Description text accumulated across character events, if a
    /// description element appeared.
    pub description: Option<String>,
    /// Child set specs. Hierarchies are currently flattened, so always
    /// `None`.
    pub children: Option<Vec<String>>,
}

/// Pagination progress for one hierarchy kind.
#[derive(Debug, Clone, Copy, Default)]
struct KindProgress {
    declared_total: usize,
    consumed: usize,
}

/// Buffered fields of the hierarchy element currently being read.
#[derive(Debug)]
struct ElementBuffer {
    kind: HierarchyKind,
    resource_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

/// Start-element data relevant to the extraction state machine.
#[derive(Debug, Default)]
struct StartElement {
    ns: Option<String>,
    local: String,
    number_of_records: Option<String>,
    xlink_title: Option<String>,
    xlink_href: Option<String>,
}

impl StartElement {
    fn from_event(
        reader: &NsReader<&[u8]>,
        ns: Option<String>,
        event: &BytesStart<'_>,
    ) -> Result<Self> {
        let local = String::from_utf8_lossy(event.local_name().as_ref()).into_owned();
        let mut start = StartElement {
            ns,
            local,
            ..StartElement::default()
        };

        for attr in event.attributes() {
            let attr = attr.map_err(|e| {
                ProviderError::MalformedListing(format!(
                    "bad attribute in <{}>: {e}",
                    start.local
                ))
            })?;
            let (attr_ns, attr_local) = reader.resolve_attribute(attr.key);
            let value = attr.unescape_value().map_err(ProviderError::Xml)?;

            if let ResolveResult::Bound(Namespace(uri)) = attr_ns {
                if uri == XLINK_NAMESPACE_URI.as_bytes() {
                    match attr_local.as_ref() {
                        b"title" => start.xlink_title = Some(value.into_owned()),
                        b"href" => start.xlink_href = Some(value.into_owned()),
                        _ => {}
                    }
                    continue;
                }
            }
            if attr_local.as_ref() == NUMBER_OF_RECORDS_ATTR.as_bytes() {
                start.number_of_records = Some(value.into_owned());
            }
        }
        Ok(start)
    }
}

/// Incremental extractor over paginated hierarchy listings.
///
/// Explicitly stateful and session-scoped; see the [module
/// docs](self) for the ownership rules.
#[derive(Debug, Default)]
pub struct SetHierarchyExtractor {
    progress: IndexMap<HierarchyKind, KindProgress>,
    sets: Vec<SetDescriptor>,
    current: Option<ElementBuffer>,
    in_description: bool,
}

impl SetHierarchyExtractor {
    /// Create an extractor with empty counters and no accumulated sets.
    #[must_use]
    pub fn new() -> Self {
        SetHierarchyExtractor::default()
    }

    /// Parse one listing page, appending discovered sets and advancing the
    /// pagination counters.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MalformedListing`] for a non-integer
    /// `number-of-records` attribute or a hierarchy element without a link
    /// href, and [`ProviderError::Xml`] for malformed XML. No partial
    /// recovery is attempted within a page.
    pub fn parse_page(&mut self, page: &str) -> Result<()> {
        let mut reader = NsReader::from_str(page);
        loop {
            match reader.read_resolved_event()? {
                (resolution, Event::Start(event)) => {
                    // The resolution borrows the reader; turn it into an
                    // owned URI before resolving attributes below.
                    let ns = namespace_of(resolution);
                    let start = StartElement::from_event(&reader, ns, &event)?;
                    self.element_started(&start)?;
                }
                (resolution, Event::Empty(event)) => {
                    let ns = namespace_of(resolution);
                    let start = StartElement::from_event(&reader, ns, &event)?;
                    self.element_started(&start)?;
                    self.element_ended(start.ns.as_deref(), &start.local)?;
                }
                (_, Event::Text(text)) => {
                    let text = text.unescape().map_err(ProviderError::Xml)?;
                    self.text_received(&text);
                }
                (_, Event::CData(data)) => {
                    let bytes = data.into_inner();
                    self.text_received(&String::from_utf8_lossy(&bytes));
                }
                (resolution, Event::End(event)) => {
                    let ns = namespace_of(resolution);
                    let local = String::from_utf8_lossy(event.local_name().as_ref()).into_owned();
                    self.element_ended(ns.as_deref(), &local)?;
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }
        Ok(())
    }

    /// Whether pagination for `kind` has delivered every declared element.
    ///
    /// True before any page of that kind has been seen (nothing declared,
    /// nothing outstanding); callers use this to decide whether to request
    /// another page.
    #[must_use]
    pub fn is_finished(&self, kind: HierarchyKind) -> bool {
        self.progress
            .get(&kind)
            .map_or(true, |p| p.consumed >= p.declared_total)
    }

    /// Elements of `kind` consumed so far across all pages; callers use it
    /// as the offset for the next page request.
    #[must_use]
    pub fn consumed_so_far(&self, kind: HierarchyKind) -> usize {
        self.progress.get(&kind).map_or(0, |p| p.consumed)
    }

    /// All sets accumulated so far, in document order across pages.
    #[must_use]
    pub fn sets(&self) -> &[SetDescriptor] {
        &self.sets
    }

    /// Consume the extractor, returning the accumulated sets.
    #[must_use]
    pub fn into_sets(self) -> Vec<SetDescriptor> {
        self.sets
    }

    // -----------------------------------------------------------------------
    // Transitions. Pure over (state, event); the parse loop above only
    // adapts parser events into these calls, so the machine is testable
    // without a real parser.
    // -----------------------------------------------------------------------

    fn element_started(&mut self, start: &StartElement) -> Result<()> {
        if let Some(kind) = HierarchyKind::from_container(&start.local) {
            if let Some(raw) = &start.number_of_records {
                // Each page redeclares the total for the collection it
                // returns; the latest declaration wins.
                let declared = raw.trim().parse::<usize>().map_err(|_| {
                    ProviderError::MalformedListing(format!(
                        "{NUMBER_OF_RECORDS_ATTR} is not an integer: '{raw}'"
                    ))
                })?;
                self.progress.entry(kind).or_default().declared_total = declared;
            }
        }

        if let Some(kind) = HierarchyKind::from_element(&start.local, start.ns.as_deref()) {
            self.progress.entry(kind).or_default().consumed += 1;
            let resource_id = start
                .xlink_href
                .as_deref()
                .map(|href| resource_id_from_href(href).to_string());
            // Entering an element discards anything buffered for a previous
            // one.
            self.current = Some(ElementBuffer {
                kind,
                resource_id,
                title: start.xlink_title.clone(),
                description: None,
            });
            self.in_description = false;
            return Ok(());
        }

        if self.current.is_some() && start.local == "description" {
            self.in_description = true;
        }
        Ok(())
    }

    fn text_received(&mut self, text: &str) {
        if !self.in_description {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            // Character data may arrive fragmented; append in arrival order.
            current
                .description
                .get_or_insert_with(String::new)
                .push_str(text);
        }
    }

    fn element_ended(&mut self, ns: Option<&str>, local: &str) -> Result<()> {
        if self.in_description && local == "description" {
            self.in_description = false;
            return Ok(());
        }

        if HierarchyKind::from_element(local, ns).is_none() {
            return Ok(());
        }
        let Some(buffer) = self.current.take() else {
            return Ok(());
        };
        self.in_description = false;

        let resource_id = buffer.resource_id.ok_or_else(|| {
            ProviderError::MalformedListing(format!(
                "<{local}> element carries no link href to derive a set spec from"
            ))
        })?;
        let set_spec = format!(
            "{}_{}",
            buffer.kind.set_spec_prefix(),
            resource_id.replace(':', "_")
        );
        self.sets.push(SetDescriptor {
            set_spec,
            title: buffer.title.unwrap_or_default(),
            description: buffer.description,
            children: None,
        });
        Ok(())
    }
}

/// The id is the path segment after the last `/` of the link href.
fn resource_id_from_href(href: &str) -> &str {
    match href.rfind('/') {
        Some(index) => &href[index + 1..],
        None => href,
    }
}

fn namespace_of(resolution: ResolveResult<'_>) -> Option<String> {
    match resolution {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ou_start(title: Option<&str>, href: Option<&str>) -> StartElement {
        StartElement {
            ns: Some("http://www.escidoc.de/schemas/organizationalunit/0.4".to_string()),
            local: "organizational-unit".to_string(),
            number_of_records: None,
            xlink_title: title.map(str::to_string),
            xlink_href: href.map(str::to_string),
        }
    }

    fn plain_start(local: &str) -> StartElement {
        StartElement {
            local: local.to_string(),
            ..StartElement::default()
        }
    }

    #[test]
    fn test_unseen_kind_reports_finished() {
        let extractor = SetHierarchyExtractor::new();
        assert!(extractor.is_finished(HierarchyKind::OrganizationalUnit));
        assert!(extractor.is_finished(HierarchyKind::Context));
        assert_eq!(extractor.consumed_so_far(HierarchyKind::Context), 0);
    }

    #[test]
    fn test_description_fragments_concatenate_in_arrival_order() {
        let mut extractor = SetHierarchyExtractor::new();
        extractor
            .element_started(&ou_start(Some("Inst"), Some("/oum/ou/escidoc:1")))
            .unwrap();
        extractor.element_started(&plain_start("description")).unwrap();
        extractor.text_received("Foo ");
        extractor.text_received("Bar");
        let ns = Some("http://www.escidoc.de/schemas/organizationalunit/0.4");
        extractor.element_ended(None, "description").unwrap();
        extractor.element_ended(ns, "organizational-unit").unwrap();

        assert_eq!(extractor.sets()[0].description.as_deref(), Some("Foo Bar"));
    }

    #[test]
    fn test_text_outside_description_is_ignored() {
        let mut extractor = SetHierarchyExtractor::new();
        extractor
            .element_started(&ou_start(Some("Inst"), Some("/oum/ou/escidoc:1")))
            .unwrap();
        extractor.text_received("stray");
        let ns = Some("http://www.escidoc.de/schemas/organizationalunit/0.4");
        extractor.element_ended(ns, "organizational-unit").unwrap();

        assert_eq!(extractor.sets()[0].description, None);
    }

    #[test]
    fn test_buffers_reset_between_elements() {
        let mut extractor = SetHierarchyExtractor::new();
        let ns = Some("http://www.escidoc.de/schemas/organizationalunit/0.4");

        extractor
            .element_started(&ou_start(Some("First"), Some("/oum/ou/escidoc:1")))
            .unwrap();
        extractor.element_started(&plain_start("description")).unwrap();
        extractor.text_received("described");
        extractor.element_ended(None, "description").unwrap();
        extractor.element_ended(ns, "organizational-unit").unwrap();

        extractor
            .element_started(&ou_start(None, Some("/oum/ou/escidoc:2")))
            .unwrap();
        extractor.element_ended(ns, "organizational-unit").unwrap();

        let second = &extractor.sets()[1];
        assert_eq!(second.title, "");
        assert_eq!(second.description, None);
    }

    #[test]
    fn test_set_spec_replaces_colons() {
        let mut extractor = SetHierarchyExtractor::new();
        let ns = Some("http://www.escidoc.de/schemas/organizationalunit/0.4");
        extractor
            .element_started(&ou_start(Some("Inst"), Some("/oum/ou/escidoc:ex:3")))
            .unwrap();
        extractor.element_ended(ns, "organizational-unit").unwrap();

        assert_eq!(extractor.sets()[0].set_spec, "ou_escidoc_ex_3");
    }

    #[test]
    fn test_missing_href_fails_the_page() {
        let mut extractor = SetHierarchyExtractor::new();
        let ns = Some("http://www.escidoc.de/schemas/organizationalunit/0.4");
        extractor.element_started(&ou_start(Some("Inst"), None)).unwrap();
        let err = extractor.element_ended(ns, "organizational-unit").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedListing(_)));
    }

    #[test]
    fn test_element_outside_hierarchy_namespace_is_ignored() {
        let mut extractor = SetHierarchyExtractor::new();
        let start = StartElement {
            ns: Some("http://example.org/other".to_string()),
            local: "organizational-unit".to_string(),
            ..StartElement::default()
        };
        extractor.element_started(&start).unwrap();
        assert_eq!(extractor.consumed_so_far(HierarchyKind::OrganizationalUnit), 0);
        assert!(extractor.sets().is_empty());
    }

    #[test]
    fn test_malformed_number_of_records() {
        let mut extractor = SetHierarchyExtractor::new();
        let page = r#"<ou-list:organizational-unit-list
            xmlns:ou-list="http://www.escidoc.de/schemas/organizationalunitlist/0.4"
            number-of-records="many"/>"#;
        let err = extractor.parse_page(page).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedListing(_)));
    }

    #[test]
    fn test_resource_id_from_href() {
        assert_eq!(resource_id_from_href("/oum/ou/escidoc:1"), "escidoc:1");
        assert_eq!(resource_id_from_href("escidoc:1"), "escidoc:1");
        assert_eq!(resource_id_from_href("/trailing/"), "");
    }

    #[test]
    fn test_parse_page_counts_and_finishes() {
        let mut extractor = SetHierarchyExtractor::new();
        let page = r#"<ou-list:organizational-unit-list
            xmlns:ou-list="http://www.escidoc.de/schemas/organizationalunitlist/0.4"
            xmlns:ou="http://www.escidoc.de/schemas/organizationalunit/0.4"
            xmlns:xlink="http://www.w3.org/1999/xlink"
            number-of-records="2">
          <ou:organizational-unit xlink:title="One" xlink:href="/oum/ou/escidoc:1"/>
        </ou-list:organizational-unit-list>"#;
        extractor.parse_page(page).unwrap();

        assert!(!extractor.is_finished(HierarchyKind::OrganizationalUnit));
        assert_eq!(extractor.consumed_so_far(HierarchyKind::OrganizationalUnit), 1);
        assert_eq!(extractor.sets().len(), 1);
        assert_eq!(extractor.sets()[0].title, "One");
    }
}
