//! Primary (pattern) classifier.
//!
//! Walks the catalog's groups in priority order; the first group with any
//! matching pattern wins. Never fails: no match is `Intent::Unclassified`.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{PatternCatalog, PatternMatch};
use crate::context::SearchContext;
use crate::intent::Intent;

/// Confidence when exactly one group matched.
pub const CONFIDENCE_UNAMBIGUOUS: f64 = 1.0;
/// Confidence when the winning group had lower-priority competitors.
pub const CONFIDENCE_AMBIGUOUS: f64 = 0.8;
/// Confidence for shorthand routed to FOLLOW_UP with no pattern support.
pub const CONFIDENCE_SHORTHAND: f64 = 0.6;

const SHORTHAND_MAX_WORDS: usize = 3;
const SHORTHAND_TOKENS: &[&str] = &["which", "what", "how", "where", "lines", "train", "subway"];
const SHORTHAND_PHRASES: &[&str] = &[
    "which line",
    "which lines",
    "what line",
    "what lines",
    "how far",
    "how close",
    "more info",
    "tell me more",
];

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    #[serde(skip)]
    pub matched_patterns: Vec<PatternMatch>,
    /// Winning group needs conversation context
    pub requires_context: bool,
    /// Message was treated as context-dependent shorthand
    pub shorthand: bool,
}

impl ClassificationResult {
    fn unclassified() -> Self {
        Self {
            intent: Intent::Unclassified,
            confidence: 0.0,
            matched_patterns: Vec::new(),
            requires_context: false,
            shorthand: false,
        }
    }
}

/// Short messages like "which lines?" or "how far" that only make sense
/// against a listing or search already on screen.
pub fn is_context_shorthand(message: &str) -> bool {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() || words.len() > SHORTHAND_MAX_WORDS {
        return false;
    }

    let joined = words.join(" ");
    words.iter().any(|w| SHORTHAND_TOKENS.contains(w))
        || SHORTHAND_PHRASES.iter().any(|p| joined.contains(p))
}

/// Classify with the standard catalog.
pub fn classify(message: &str, context: Option<&SearchContext>) -> Intent {
    classify_with(PatternCatalog::standard(), message, context).intent
}

pub fn classify_detailed(message: &str, context: Option<&SearchContext>) -> ClassificationResult {
    classify_with(PatternCatalog::standard(), message, context)
}

pub fn classify_with(
    catalog: &PatternCatalog,
    message: &str,
    context: Option<&SearchContext>,
) -> ClassificationResult {
    let text = message.to_lowercase();
    let has_context = context.is_some_and(SearchContext::is_established);

    if has_context && is_context_shorthand(&text) {
        // Context-requiring groups get first look, in priority order
        for group in catalog.groups().iter().filter(|g| g.requires_context) {
            let hits = group.matches(&text);
            if !hits.is_empty() {
                debug!(intent = %group.intent, "shorthand matched context group");
                return ClassificationResult {
                    intent: group.intent,
                    confidence: CONFIDENCE_UNAMBIGUOUS,
                    matched_patterns: hits,
                    requires_context: true,
                    shorthand: true,
                };
            }
        }

        let mut result = scan(catalog, &text, true);
        if result.intent == Intent::Unclassified {
            result = ClassificationResult {
                intent: Intent::FollowUp,
                confidence: CONFIDENCE_SHORTHAND,
                matched_patterns: Vec::new(),
                requires_context: true,
                shorthand: true,
            };
        } else {
            result.shorthand = true;
        }
        return result;
    }

    let result = scan(catalog, &text, has_context);
    if result.intent == Intent::Unclassified && context.is_some() && !has_context {
        // Session with no search yet: context groups only when nothing else matched
        debug!("no established search, retrying with context groups");
        return scan(catalog, &text, true);
    }
    result
}

fn scan(catalog: &PatternCatalog, text: &str, has_context: bool) -> ClassificationResult {
    let mut winner: Option<ClassificationResult> = None;
    let mut matched_groups = 0usize;

    for group in catalog.groups() {
        if group.requires_context && !has_context {
            continue;
        }
        if let Some(found) = &winner {
            // Only counted for the ambiguity score
            if group.intent != found.intent && group.is_match(text) {
                matched_groups += 1;
            }
            continue;
        }

        let hits = group.matches(text);
        if !hits.is_empty() {
            debug!(
                intent = %group.intent,
                priority = group.priority,
                patterns = hits.len(),
                "pattern group matched"
            );
            matched_groups += 1;
            winner = Some(ClassificationResult {
                intent: group.intent,
                confidence: CONFIDENCE_UNAMBIGUOUS,
                matched_patterns: hits,
                requires_context: group.requires_context,
                shorthand: false,
            });
        }
    }

    match winner {
        Some(mut result) => {
            if matched_groups > 1 {
                result.confidence = CONFIDENCE_AMBIGUOUS;
            }
            result
        }
        None => ClassificationResult::unclassified(),
    }
}
