//! Inline eco-score indicators for search-result listings.
//!
//! Strictly a cache-read path: bulk listing pages never trigger remote
//! analysis. The cache fills up as the user opens product pages.

use crate::display::round_score;
use crate::dom::ListingIndicator;
use crate::dom::PageDom;
use crate::dom::SearchListing;
use el_cache::CacheStore;
use el_page::PageKind;
use el_page::PageUrl;
use el_score::AnalysisResult;
use std::sync::Arc;

pub struct SearchResultAnnotator {
    cache: Arc<dyn CacheStore>,
}

impl SearchResultAnnotator {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Annotates every listing on a search-results page from the cache.
    /// Cache failures hide the indicators entirely rather than rendering
    /// broken UI; any other page kind is a no-op.
    pub fn annotate(&self, dom: &mut dyn PageDom) {
        let current = dom.current_url();
        let Ok(page) = PageUrl::parse(&current) else {
            tracing::debug!(url = current.as_str(), "skipping unparseable page URL");
            return;
        };
        if PageKind::classify(&page) != PageKind::SearchResults {
            return;
        }

        let mut resolved: Vec<(SearchListing, String)> = Vec::new();
        for listing in dom.search_listings() {
            match page.resolve(&listing.href) {
                Ok(absolute) => resolved.push((listing, absolute.as_str().to_owned())),
                Err(error) => {
                    tracing::debug!(href = listing.href.as_str(), %error, "skipping listing");
                }
            }
        }

        let keys: Vec<String> = resolved.iter().map(|(_, url)| url.clone()).collect();
        let entries = match self.cache.get_many(&keys) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(%error, "cache unavailable, hiding listing indicators");
                return;
            }
        };

        for (listing, url) in resolved {
            match entries.get(&url) {
                Some(raw_body) => match AnalysisResult::from_json(raw_body) {
                    Ok(result) => {
                        let score = round_score(result.environmental_score.overall_eco_score);
                        dom.annotate_listing(&listing.element_id, ListingIndicator::Scored(score));
                    }
                    Err(error) => {
                        tracing::debug!(url = url.as_str(), %error, "unreadable cached entry");
                    }
                },
                None => dom.annotate_listing(&listing.element_id, ListingIndicator::Placeholder),
            }
        }
    }
}
