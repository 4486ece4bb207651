//! DOI resolution for publication URLs.
//!
//! Strategies run in strict precedence and the first hit wins:
//! 1. a DOI embedded in the publication URL itself (no request made)
//! 2. a labelled DOI (`doi:` or `https://doi.org/`) in the fetched page body
//!
//! A failed fetch in step 2 ends the lookup; there is nothing to fall back to.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use pubtrace_fetch::PageFetcher;

use crate::lookup::Lookup;

/// DOI grammar: `10.` + 4-9 digit registrant + `/` + suffix.
const DOI_PATTERN: &str = r"10\.[0-9]{4,9}/[-._;()/:A-Za-z0-9]+";

/// A bare DOI anywhere in a string.
static DOI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DOI_PATTERN).expect("DOI regex"));

/// A DOI introduced by a `doi` label or a doi.org resolver prefix.
static LABELLED_DOI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i:doi:?\s*|https?://doi\.org/){DOI_PATTERN}"))
        .expect("labelled DOI regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which strategy produced a DOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoiSource {
    /// Embedded in the publication URL.
    Url,
    /// Found on the fetched publication page.
    PageBody,
}

impl DoiSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::PageBody => "page_body",
        }
    }
}

/// A resolved DOI and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doi {
    /// The DOI, starting at `10.`.
    pub value: String,
    pub source: DoiSource,
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a DOI for `publication_url`.
///
/// `None` resolves to [`Lookup::NotFound`] without touching the network.
#[instrument(skip_all, fields(publication_url = publication_url.unwrap_or("")))]
pub async fn resolve_doi<F: PageFetcher>(fetcher: &F, publication_url: Option<&str>) -> Lookup<Doi> {
    let Some(url) = publication_url else {
        return Lookup::NotFound;
    };

    if let Some(value) = doi_in_url(url) {
        info!(doi = %value, "found DOI in publication URL");
        return Lookup::Found(Doi {
            value,
            source: DoiSource::Url,
        });
    }

    debug!("fetching publication page");
    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "publication page fetch failed");
            return Lookup::FetchFailed(e.to_string());
        }
    };

    match doi_in_page(&page.body) {
        Some(value) => {
            info!(doi = %value, "found DOI on publication page");
            Lookup::Found(Doi {
                value,
                source: DoiSource::PageBody,
            })
        }
        None => {
            debug!("no DOI found for publication");
            Lookup::NotFound
        }
    }
}

/// First DOI embedded in `url`, verbatim.
pub fn doi_in_url(url: &str) -> Option<String> {
    DOI_RE.find(url).map(|m| m.as_str().to_string())
}

/// First labelled DOI in a page body, with the label stripped.
pub fn doi_in_page(body: &str) -> Option<String> {
    LABELLED_DOI_RE
        .find(body)
        .and_then(|m| strip_to_prefix(m.as_str()))
        .map(str::to_string)
}

/// Cut a matched span down to its first `10.`.
fn strip_to_prefix(span: &str) -> Option<&str> {
    span.find("10.").map(|pos| &span[pos..])
}
