//! HTML parsing for links and structured data
//!
//! This module provides the default extractors:
//! - [`HtmlLinkExtractor`]: outbound `<a href>` links, resolved and normalized
//! - [`JsonLdPayloadExtractor`]: the first JSON-LD block of a page

use crate::config::ScopeConfig;
use crate::crawler::collaborators::{ExtractError, LinkExtractor, PayloadExtractor};
use crate::url::{normalize_address, AddressScheme};
use crate::Address;
use scraper::{Html, Selector};
use url::Url;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Extracts outbound links from HTML pages
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Schemes outside the configured address scheme
/// - Links outside `link_prefix`, when set
/// - Namespaced links (`Talk:Foo`) when `skip_namespaced` is set
///
/// Links are returned in document order, duplicates included.
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor {
    scheme: AddressScheme,
    link_prefix: Option<String>,
    skip_namespaced: bool,
}

impl HtmlLinkExtractor {
    pub fn new(scheme: AddressScheme) -> Self {
        Self {
            scheme,
            link_prefix: None,
            skip_namespaced: false,
        }
    }

    /// Builds an extractor from the `[scope]` configuration section
    pub fn from_scope(scope: &ScopeConfig) -> Self {
        Self {
            scheme: AddressScheme::from_scope(scope),
            link_prefix: scope.link_prefix.clone(),
            skip_namespaced: scope.skip_namespaced,
        }
    }

    /// Only follow links starting with `prefix`
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = Some(prefix.into());
        self
    }

    /// Drop links whose last path segment contains `:`
    pub fn skip_namespaced(mut self, skip: bool) -> Self {
        self.skip_namespaced = skip;
        self
    }

    fn in_scope(&self, url: &Url) -> bool {
        if !self.scheme.allows(url.scheme()) {
            return false;
        }

        if let Some(prefix) = &self.link_prefix {
            if !url.as_str().starts_with(prefix.as_str()) {
                return false;
            }
        }

        if self.skip_namespaced && is_namespaced(url) {
            return false;
        }

        true
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, content: &str, base: &str) -> Vec<Address> {
        let base_url = match Url::parse(base) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Cannot resolve links against {}: {}", base, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(content);
        let mut links = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                // Skip if it has the download attribute
                if element.value().attr("download").is_some() {
                    continue;
                }

                if let Some(url) = element
                    .value()
                    .attr("href")
                    .and_then(|href| resolve_link(href, &base_url))
                {
                    if self.in_scope(&url) {
                        links.push(url.to_string());
                    }
                }
            }
        }

        links
    }
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only and empty hrefs
/// - Invalid URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    normalize_address(href, Some(base_url)).ok()
}

fn is_namespaced(url: &Url) -> bool {
    url.path_segments()
        .and_then(Iterator::last)
        .map_or(false, |last| last.contains(':'))
}

/// Extracts the first `<script type="application/ld+json">` block
///
/// The block must hold valid JSON; its trimmed text is the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdPayloadExtractor;

impl PayloadExtractor for JsonLdPayloadExtractor {
    fn extract_payload(&self, content: &str) -> Result<Vec<u8>, ExtractError> {
        let selector = Selector::parse(JSON_LD_SELECTOR)
            .map_err(|e| ExtractError::Malformed(format!("selector: {:?}", e)))?;

        let document = Html::parse_document(content);
        let block = document
            .select(&selector)
            .next()
            .ok_or(ExtractError::MissingBlock)?;

        let text = block.text().collect::<String>();
        let text = text.trim();

        serde_json::from_str::<serde_json::Value>(text)
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        Ok(text.as_bytes().to_vec())
    }
}
