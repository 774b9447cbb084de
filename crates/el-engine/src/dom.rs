//! Document boundary the engine drives.

use crate::widget::WidgetState;

/// One listing element on a search-results page, identified by the host
/// document however it likes, with the raw href of its product anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchListing {
    pub element_id: String,
    pub href: String,
}

impl SearchListing {
    pub fn new(element_id: &str, href: &str) -> Self {
        Self {
            element_id: element_id.to_owned(),
            href: href.to_owned(),
        }
    }
}

/// Inline indicator rendered next to a search listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingIndicator {
    /// Cached overall eco score, already rounded.
    Scored(u8),
    /// No cached data; invites the user to open the product page.
    Placeholder,
}

impl ListingIndicator {
    pub fn label(self) -> String {
        match self {
            Self::Scored(score) => format!("{score}/100"),
            Self::Placeholder => "Eco score: open product to analyze".to_owned(),
        }
    }
}

/// Everything the engine needs from the host document.
///
/// Widget markup, the meaning of anchor selectors, and interaction wiring
/// (find-alternatives, view-details) all live on the implementor's side of
/// this trait.
pub trait PageDom {
    /// URL the document shows right now.
    fn current_url(&self) -> String;

    /// Whether one of the known anchor candidates exists in this layout.
    fn anchor_exists(&self, selector: &str) -> bool;

    /// Atomically swaps the single widget instance to `widget`. Implementors
    /// must never let two widgets be observable at once.
    fn replace_widget(&mut self, widget: WidgetState);

    fn widget_present(&self) -> bool;

    fn search_listings(&self) -> Vec<SearchListing>;

    fn annotate_listing(&mut self, element_id: &str, indicator: ListingIndicator);
}
