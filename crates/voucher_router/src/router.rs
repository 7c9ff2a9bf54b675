//! Two-tier router: pattern tier first, generative fallback second.
//!
//! Always returns a `RouterResponse`. Fallback errors are folded into an
//! UNCLASSIFIED response with `router_used = none`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::PatternCatalog;
use crate::classifier::{classify_with, ClassificationResult};
use crate::config::RouterConfig;
use crate::context::SearchContext;
use crate::error::RouterError;
use crate::extractor::extract_with;
use crate::fallback::FallbackRouter;
use crate::intent::Intent;
use crate::language::Language;
use crate::llm_client::{HttpTextGenerator, TextGenerator};
use crate::params::SearchParams;

pub const REGEX_CONFIDENCE: f64 = 0.95;
pub const LLM_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterUsed {
    Regex,
    Llm,
    None,
}

impl std::fmt::Display for RouterUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Regex => "regex",
            Self::Llm => "llm",
            Self::None => "none",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterResponse {
    pub intent: Intent,
    pub parameters: SearchParams,
    /// Never empty
    pub reasoning: String,
    pub confidence: f64,
    pub router_used: RouterUsed,
}

impl RouterResponse {
    fn failed(error: &RouterError) -> Self {
        Self {
            intent: Intent::Unclassified,
            parameters: SearchParams::new(),
            reasoning: format!("Both regex and LLM routers failed: {}", error),
            confidence: 0.0,
            router_used: RouterUsed::None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.router_used != RouterUsed::None
    }
}

/// The pattern tier is conclusive when it found an intent that it can act on.
pub fn regex_succeeded(intent: Intent, params: &SearchParams) -> bool {
    intent != Intent::Unclassified && (!params.is_empty() || intent.is_standalone())
}

fn regex_reasoning(classification: &ClassificationResult, params: &SearchParams) -> String {
    let mut reasoning = match classification.matched_patterns.first() {
        Some(hit) => format!(
            "Matched {} pattern '{}'",
            classification.intent, hit.matched_text
        ),
        None => format!(
            "Short context-dependent message treated as {}",
            classification.intent
        ),
    };
    if !params.is_empty() {
        let keys: Vec<&str> = params.iter().map(|v| v.key().as_str()).collect();
        reasoning.push_str(&format!(" and extracted {}", keys.join(", ")));
    }
    reasoning
}

/// Holds only immutable configuration; conversation state is passed in.
pub struct TwoTierRouter {
    catalog: &'static PatternCatalog,
    fallback: FallbackRouter,
}

impl TwoTierRouter {
    pub fn new(fallback: FallbackRouter) -> Self {
        Self::with_catalog(PatternCatalog::standard(), fallback)
    }

    pub fn with_catalog(catalog: &'static PatternCatalog, fallback: FallbackRouter) -> Self {
        Self { catalog, fallback }
    }

    /// Router backed by the configured HTTP model.
    pub fn from_config(config: &RouterConfig) -> anyhow::Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(HttpTextGenerator::new(config.llm.clone())?);
        Ok(Self::new(FallbackRouter::with_config(generator, config.fallback.clone())))
    }

    pub fn fallback(&self) -> &FallbackRouter {
        &self.fallback
    }

    pub fn route(
        &self,
        message: &str,
        context: Option<&SearchContext>,
        language: Language,
    ) -> RouterResponse {
        let classification = classify_with(self.catalog, message, context);
        let params = extract_with(self.catalog, message);

        if regex_succeeded(classification.intent, &params) {
            info!(
                intent = %classification.intent,
                params = params.len(),
                "routed by pattern tier"
            );
            return RouterResponse {
                intent: classification.intent,
                reasoning: regex_reasoning(&classification, &params),
                parameters: params,
                confidence: REGEX_CONFIDENCE,
                router_used: RouterUsed::Regex,
            };
        }

        warn!(
            intent = %classification.intent,
            params = params.len(),
            "pattern tier inconclusive, using fallback"
        );

        let prompt_context = context.and_then(|c| c.to_prompt_context());
        match self.fallback.route(message, prompt_context.as_deref(), language) {
            Ok(decision) => RouterResponse {
                intent: decision.intent,
                parameters: decision.parameters,
                reasoning: decision.reasoning,
                confidence: LLM_CONFIDENCE,
                router_used: RouterUsed::Llm,
            },
            Err(e) => {
                warn!(error = %e, code = e.code(), "both routing tiers failed");
                RouterResponse::failed(&e)
            }
        }
    }
}
