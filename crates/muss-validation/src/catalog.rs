//! Finding code catalog.
//!
//! Maps finding codes (like "M-2-1") to a subsystem and a short title, for
//! tools that group or label findings.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FindingCodeInfo {
    /// Validator phase, e.g. "frontmatter" or "budget"
    pub subsystem: String,
    pub title: String,
}

/// Loaded from `finding_catalog.json`, embedded at compile time.
///
/// # Panics
///
/// Panics on first use if the embedded JSON is invalid.
pub static FINDING_CATALOG: Lazy<HashMap<String, FindingCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../finding_catalog.json");
    serde_json::from_str(json_data).expect("Invalid finding catalog JSON - this is a bug")
});

pub fn get_code_info(code: &str) -> Option<&'static FindingCodeInfo> {
    FINDING_CATALOG.get(code)
}

pub fn get_title(code: &str) -> Option<&'static str> {
    get_code_info(code).map(|info| info.title.as_str())
}
