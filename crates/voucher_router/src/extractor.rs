//! Parameter extractor.
//!
//! For each parameter spec the first matching pattern supplies the raw
//! capture. If that capture does not normalize, the parameter is omitted;
//! later patterns are not consulted. This keeps addresses, ages, family
//! sizes and phone numbers from leaking into the search.

use tracing::debug;

use crate::catalog::PatternCatalog;
use crate::params::SearchParams;

/// Extract with the standard catalog.
pub fn extract_parameters(message: &str) -> SearchParams {
    extract_with(PatternCatalog::standard(), message)
}

pub fn extract_with(catalog: &PatternCatalog, message: &str) -> SearchParams {
    let text = message.to_lowercase();
    let mut params = SearchParams::new();

    for spec in catalog.parameters() {
        let Some(raw) = spec.first_capture(&text) else {
            continue;
        };
        match (spec.normalize)(raw) {
            Some(value) => params.set(value),
            None => debug!(key = %spec.key, raw, "capture did not normalize, omitted"),
        }
    }

    params
}
