//! Publication URL discovery on documentation pages.
//!
//! Dataset documentation pages announce their paper with a line like
//! `Publication URL: https://doi.org/10.1234/abcd`. The raw page text is
//! scanned first; when that fails and the page is HTML, the rendered text and
//! then the first link following the label are tried.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};
use tracing::{debug, info, instrument, warn};

use pubtrace_fetch::{PageFetcher, is_http_url};

use crate::lookup::Lookup;

/// Lower-cased label that introduces the publication link.
const LABEL: &str = "publication url:";

/// Matches `Publication URL:` (any case) followed by an http(s) token.
static PUBLICATION_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Publication URL:\s*(https?://[^\s<>"'`]+)"#).expect("publication URL regex")
});

/// Fetch `doc_url` and look for its publication URL.
///
/// Anything other than an http/https URL is rejected without a request.
#[instrument(skip_all, fields(doc_url = %doc_url))]
pub async fn locate_publication<F: PageFetcher>(fetcher: &F, doc_url: &str) -> Lookup<String> {
    if doc_url.is_empty() || !is_http_url(doc_url) {
        warn!("skipping invalid documentation URL");
        return Lookup::NotFound;
    }

    debug!("fetching documentation page");
    let page = match fetcher.fetch(doc_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "documentation page fetch failed");
            return Lookup::FetchFailed(e.to_string());
        }
    };

    match find_publication_url(&page.body) {
        Some(url) => {
            info!(publication_url = %url, "found publication URL");
            Lookup::Found(url)
        }
        None => {
            debug!("'Publication URL:' not found on page");
            Lookup::NotFound
        }
    }
}

/// Scan page content for the first publication URL in document order.
pub fn find_publication_url(content: &str) -> Option<String> {
    if let Some(url) = scan_text(content) {
        return Some(url);
    }

    if content.contains('<') {
        let doc = Html::parse_document(content);
        return scan_rendered_text(&doc).or_else(|| link_after_label(&doc));
    }

    None
}

fn scan_text(text: &str) -> Option<String> {
    PUBLICATION_URL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Same grammar over the document's text nodes, with entities decoded.
fn scan_rendered_text(doc: &Html) -> Option<String> {
    let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
    scan_text(&text)
}

/// First http(s) `<a href>` after a text node ending in the label.
///
/// Wrapper elements such as `<strong>` may sit between the label and the
/// link, but any other visible text in between cancels the match.
fn link_after_label(doc: &Html) -> Option<String> {
    let mut armed = false;

    for node in doc.tree.root().descendants() {
        match node.value() {
            Node::Text(text) => {
                let lower = text.to_ascii_lowercase();
                if let Some(pos) = lower.rfind(LABEL) {
                    armed = lower[pos + LABEL.len()..].trim().is_empty();
                } else if armed && !text.trim().is_empty() {
                    armed = false;
                }
            }
            Node::Element(el) if armed && el.name() == "a" => {
                match el.attr("href").map(str::trim) {
                    Some(href) if is_http_url(href) => return Some(href.to_string()),
                    _ => armed = false,
                }
            }
            _ => {}
        }
    }

    None
}
