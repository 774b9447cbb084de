//! Page URL parsing and page-kind classification.

use el_core::EngineError;
use el_core::EngineResult;
use url::Url;

/// Canonical page URL used by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    parsed: Url,
}

impl PageUrl {
    pub fn parse(input: &str) -> EngineResult<Self> {
        let mut parsed = Url::parse(input).map_err(|error| {
            EngineError::new(
                "page.url_invalid",
                format!("failed to parse URL `{input}`: {error}"),
            )
        })?;

        if parsed.cannot_be_a_base() {
            return Err(EngineError::new(
                "page.url_not_hierarchical",
                "URL cannot describe a navigable page",
            ));
        }

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EngineError::new(
                "page.scheme_unsupported",
                format!("unsupported scheme `{}`", parsed.scheme()),
            ));
        }

        if parsed.host_str().is_none() {
            return Err(EngineError::new(
                "page.host_missing",
                "page URL must include a host",
            ));
        }

        // Fragments never change page identity.
        parsed.set_fragment(None);

        Ok(Self { parsed })
    }

    pub fn as_str(&self) -> &str {
        self.parsed.as_str()
    }

    pub fn host(&self) -> &str {
        self.parsed.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.parsed.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.parsed.query()
    }

    /// Resolves a listing's anchor href against this page into an absolute URL.
    pub fn resolve(&self, href: &str) -> EngineResult<PageUrl> {
        let joined = self.parsed.join(href).map_err(|error| {
            EngineError::new(
                "page.href_invalid",
                format!("failed to resolve href `{href}`: {error}"),
            )
        })?;
        PageUrl::parse(joined.as_str())
    }

    fn path_segments(&self) -> Vec<&str> {
        self.parsed
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default()
    }

    fn has_query_param(&self, name: &str) -> bool {
        self.parsed
            .query_pairs()
            .any(|(key, value)| key == name && !value.is_empty())
    }
}

/// What kind of page a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Product,
    SearchResults,
    Other,
}

impl PageKind {
    /// Classifies a parsed page URL. Pure and total.
    pub fn classify(url: &PageUrl) -> Self {
        let segments = url.path_segments();

        let has_product_marker = segments
            .windows(2)
            .any(|window| window[0] == "dp" || (window[0] == "gp" && window[1] == "product"));
        if has_product_marker {
            return Self::Product;
        }

        let is_search_listing =
            segments.first().is_some_and(|first| *first == "s") || url.has_query_param("k");
        if is_search_listing {
            return Self::SearchResults;
        }

        Self::Other
    }

    /// Classifies a raw URL string; anything unparseable is `Other`.
    pub fn classify_str(input: &str) -> Self {
        match PageUrl::parse(input) {
            Ok(url) => Self::classify(&url),
            Err(_) => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::SearchResults => "search-results",
            Self::Other => "other",
        }
    }
}
