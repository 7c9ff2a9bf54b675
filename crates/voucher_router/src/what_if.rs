//! What-if / refinement flow.
//!
//! Decides whether a refinement message can be applied to the current
//! search. Fails closed: no prior search means asking for one, and a message
//! that changes nothing says so instead of silently re-running the search.

use serde::Serialize;
use tracing::{debug, info};

use crate::context::{ParameterChange, SearchContext};
use crate::intent::Intent;
use crate::narration;
use crate::params::SearchParams;

pub const NEEDS_INITIAL_SEARCH_MESSAGE: &str = "I'd be happy to help you explore different options, \
but I don't see a previous search to modify. Start with a search first (for example, \
\"Find Section 8 apartments in Brooklyn\") and then tell me what to change.";

pub const NOTHING_TO_CHANGE_MESSAGE: &str = "I couldn't tell what you'd like to change about your \
search. For example:\n\
- \"What if I looked in Manhattan instead?\"\n\
- \"How about a $3000 budget?\"\n\
- \"Try 2 bedrooms instead\"";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefinementOutcome {
    /// No prior search to refine
    NeedsInitialSearch { message: String },
    /// Prior search exists but the message carried no parameters
    NothingToChange { message: String },
    /// Every parameter repeats the current search
    AlreadyApplied {
        changes: Vec<ParameterChange>,
        message: String,
    },
    Apply {
        changes: Vec<ParameterChange>,
        merged: SearchParams,
        confirmation: String,
    },
}

impl RefinementOutcome {
    pub fn is_apply(&self) -> bool {
        matches!(self, Self::Apply { .. })
    }

    /// Text to show the user.
    pub fn message(&self) -> &str {
        match self {
            Self::NeedsInitialSearch { message }
            | Self::NothingToChange { message }
            | Self::AlreadyApplied { message, .. } => message,
            Self::Apply { confirmation, .. } => confirmation,
        }
    }
}

/// Plan a refinement. Returns `None` when `intent` is not a refinement intent.
pub fn plan_refinement(
    intent: Intent,
    params: &SearchParams,
    context: Option<&SearchContext>,
) -> Option<RefinementOutcome> {
    if !intent.is_refinement() {
        return None;
    }

    let context = match context {
        Some(ctx) if ctx.is_established() => ctx,
        _ => {
            info!(intent = %intent, "refinement without a prior search");
            return Some(RefinementOutcome::NeedsInitialSearch {
                message: NEEDS_INITIAL_SEARCH_MESSAGE.to_string(),
            });
        }
    };

    if params.is_empty() {
        return Some(RefinementOutcome::NothingToChange {
            message: NOTHING_TO_CHANGE_MESSAGE.to_string(),
        });
    }

    let changes = context.analyze(params);
    let found_nothing = context.last_result_count() == Some(0);
    debug!(changes = changes.len(), found_nothing, "refinement analyzed");

    match narration::confirmation_text(&changes, found_nothing) {
        Some(confirmation) => Some(RefinementOutcome::Apply {
            merged: context.current_params().merged(params),
            changes,
            confirmation,
        }),
        None => {
            let message = format!(
                "You're already searching with {}. Did you mean something different?",
                narration::redundant_text(&changes)
            );
            Some(RefinementOutcome::AlreadyApplied { changes, message })
        }
    }
}
