//! One conversation: owns its `SearchContext` and drives turns through a
//! shared router.

use serde::Serialize;
use tracing::debug;

use crate::context::{ParameterChange, SearchContext};
use crate::intent::Intent;
use crate::language::Language;
use crate::narration::describe_intent;
use crate::router::{RouterResponse, TwoTierRouter};
use crate::what_if::{plan_refinement, RefinementOutcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub response: RouterResponse,
    /// Change analysis of the routed parameters against the search before this turn
    pub changes: Vec<ParameterChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementOutcome>,
    /// Text for the user
    pub reply: String,
    /// Parameters were merged into the context
    pub committed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    context: SearchContext,
    language: Language,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self::with_context(SearchContext::new(), language)
    }

    pub fn with_context(context: SearchContext, language: Language) -> Self {
        Self { context, language }
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Feedback from the listing search for the current parameters.
    pub fn record_result_count(&mut self, count: u32) {
        self.context.record_result_count(count);
    }

    pub fn reset(&mut self) {
        self.context.clear();
    }

    /// Route `message` against this session's context. Parameters are
    /// committed only when routing succeeded and, for refinements, when the
    /// refinement applies.
    pub fn turn(&mut self, router: &TwoTierRouter, message: &str) -> TurnOutcome {
        let response = router.route(message, Some(&self.context), self.language);

        if !response.succeeded() {
            return TurnOutcome {
                reply: describe_intent(Intent::Unclassified, self.context.current_params()),
                response,
                changes: Vec::new(),
                refinement: None,
                committed: false,
            };
        }

        let changes = self.context.analyze(&response.parameters);
        let refinement = plan_refinement(response.intent, &response.parameters, Some(&self.context));

        let (reply, committed) = match &refinement {
            Some(outcome) => {
                let apply = outcome.is_apply();
                if apply {
                    self.context.commit(&response.parameters);
                }
                (outcome.message().to_string(), apply)
            }
            None => {
                let commit = response.intent == Intent::SearchListings
                    && !response.parameters.is_empty();
                if commit {
                    self.context.commit(&response.parameters);
                }
                let params = if commit {
                    self.context.current_params().clone()
                } else {
                    response.parameters.clone()
                };
                (describe_intent(response.intent, &params), commit)
            }
        };

        debug!(
            intent = %response.intent,
            router = %response.router_used,
            committed,
            "turn complete"
        );

        TurnOutcome {
            response,
            changes,
            refinement,
            reply,
            committed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackRouter;
    use crate::llm_client::{FakeTextGenerator, LlmError};
    use crate::params::Borough;
    use crate::router::RouterUsed;
    use std::sync::Arc;

    fn offline_router() -> TwoTierRouter {
        TwoTierRouter::new(FallbackRouter::new(Arc::new(FakeTextGenerator::always_error(
            LlmError::Disabled,
        ))))
    }

    #[test]
    fn test_search_then_what_if() {
        let router = offline_router();
        let mut session = Session::new(Language::En);

        let first = session.turn(&router, "find me a 2 bedroom in Brooklyn");
        assert!(first.committed);
        assert_eq!(session.context().current_params().borough, Some(Borough::Brooklyn));

        let second = session.turn(&router, "try Queens instead");
        assert_eq!(second.response.intent, Intent::WhatIf);
        assert!(second.committed);
        assert_eq!(second.reply, "I'll search Queens instead of Brooklyn.");
        assert_eq!(session.context().current_params().borough, Some(Borough::Queens));
        assert_eq!(session.context().current_params().bedrooms, Some(2));
        assert_eq!(session.context().history_len(), 1);
    }

    #[test]
    fn test_first_search_in_fresh_session_commits() {
        let router = offline_router();
        let mut session = Session::new(Language::En);

        let outcome = session.turn(&router, "Could you check apartments in Brooklyn under 2000?");
        assert_eq!(outcome.response.intent, Intent::SearchListings);
        assert_eq!(outcome.response.router_used, RouterUsed::Regex);
        assert!(outcome.committed);
        assert!(outcome.refinement.is_none());
        assert_eq!(session.context().current_params().borough, Some(Borough::Brooklyn));
        assert_eq!(session.context().current_params().max_rent, Some(2000));

        let mut fresh = Session::new(Language::En);
        let outcome = fresh.turn(&router, "Show me apartments in Brooklyn instead of Queens");
        assert_eq!(outcome.response.intent, Intent::SearchListings);
        assert!(outcome.committed);
    }

    #[test]
    fn test_what_if_on_empty_context_commits_nothing() {
        let router = offline_router();
        let mut session = Session::new(Language::En);

        let outcome = session.turn(&router, "what if I tried Manhattan?");
        assert_eq!(outcome.response.intent, Intent::WhatIf);
        assert!(matches!(
            outcome.refinement,
            Some(RefinementOutcome::NeedsInitialSearch { .. })
        ));
        assert!(!outcome.committed);
        assert!(!session.context().is_established());
    }

    #[test]
    fn test_failed_routing_commits_nothing() {
        let router = offline_router();
        let mut session = Session::new(Language::En);

        let outcome = session.turn(&router, "hmm");
        assert_eq!(outcome.response.router_used, RouterUsed::None);
        assert!(!outcome.committed);
        assert!(!outcome.reply.is_empty());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let router = offline_router();
        let mut a = Session::new(Language::En);
        let mut b = Session::new(Language::En);

        a.turn(&router, "find apartments in the Bronx");
        b.turn(&router, "find apartments in Queens");

        assert_eq!(a.context().current_params().borough, Some(Borough::Bronx));
        assert_eq!(b.context().current_params().borough, Some(Borough::Queens));
    }
}
