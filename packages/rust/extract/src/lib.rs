//! Publication and DOI extraction.
//!
//! This crate provides the two lookup stages of an enrichment run:
//! - [`locator`]: finds the `Publication URL:` reference on a documentation page
//! - [`doi`]: resolves a DOI from a publication URL, falling back to its page body
//!
//! Both report a three-way [`Lookup`] so callers can tell "nothing there"
//! apart from "could not fetch".

pub mod doi;
pub mod locator;
mod lookup;

pub use doi::{Doi, DoiSource, doi_in_page, doi_in_url, resolve_doi};
pub use locator::{find_publication_url, locate_publication};
pub use lookup::Lookup;
