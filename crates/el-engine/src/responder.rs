//! Out-of-band queries from the rest of the extension.

use crate::dom::PageDom;
use serde::Deserialize;
use serde::Serialize;

const ACTION_GET_PRODUCT_DATA: &str = "getProductData";

#[derive(Debug, Deserialize)]
struct InboundMessage {
    action: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct ProductDataStatus {
    #[serde(rename = "hasData")]
    has_data: bool,
}

/// Answers the single supported query: does the current page have eco data
/// loaded? Unrecognized actions and malformed messages get no response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalMessageResponder;

impl ExternalMessageResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, dom: &dyn PageDom, raw: &str) -> Option<String> {
        let message: InboundMessage = serde_json::from_str(raw).ok()?;
        if message.action != ACTION_GET_PRODUCT_DATA {
            return None;
        }

        let status = ProductDataStatus {
            has_data: dom.widget_present(),
        };
        serde_json::to_string(&status).ok()
    }
}
