//! Generative fallback router.
//!
//! Used only when the pattern tier is inconclusive. Transport failures are
//! retried up to `max_attempts`; a reply that arrives but breaks the
//! response contract is returned as an error immediately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::RouterError;
use crate::intent::Intent;
use crate::language::Language;
use crate::llm_client::{LlmError, TextGenerator};
use crate::params::{ParamKey, SearchParams};
use crate::prompts::build_prompt;

/// `[fallback]` section of the router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_message_chars() -> usize {
    1000
}

fn default_max_context_chars() -> usize {
    2000
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_message_chars: default_max_message_chars(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

/// A validated, normalized reply from the generative tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackDecision {
    pub intent: Intent,
    pub parameters: SearchParams,
    pub reasoning: String,
}

pub struct FallbackRouter {
    generator: Arc<dyn TextGenerator>,
    config: FallbackConfig,
}

impl FallbackRouter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_config(generator, FallbackConfig::default())
    }

    pub fn with_config(generator: Arc<dyn TextGenerator>, config: FallbackConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn validate_input(&self, message: &str, context: Option<&str>) -> Result<(), RouterError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(RouterError::InvalidInput(
                "Message cannot be empty or whitespace-only".to_string(),
            ));
        }
        if trimmed.chars().count() > self.config.max_message_chars {
            return Err(RouterError::InvalidInput(format!(
                "Message exceeds maximum length of {} characters",
                self.config.max_message_chars
            )));
        }
        if let Some(ctx) = context {
            if ctx.chars().count() > self.config.max_context_chars {
                return Err(RouterError::InvalidInput(format!(
                    "Context exceeds maximum length of {} characters",
                    self.config.max_context_chars
                )));
            }
        }
        Ok(())
    }

    pub fn route(
        &self,
        message: &str,
        context: Option<&str>,
        language: Language,
    ) -> Result<FallbackDecision, RouterError> {
        self.validate_input(message, context)?;

        let prompt = build_prompt(message, context, language);
        debug!(
            backend = self.generator.name(),
            prompt_chars = prompt.len(),
            language = %language,
            "fallback prompt built"
        );

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=max_attempts {
            match self.generator.generate(&prompt) {
                Ok(reply) => {
                    let decision = parse_reply(&reply)?;
                    info!(
                        intent = %decision.intent,
                        attempt,
                        params = decision.parameters.len(),
                        "fallback classified message"
                    );
                    return Ok(decision);
                }
                Err(e) if !e.is_transient() => {
                    error!(attempt, error = %e, "fallback backend unavailable");
                    return Err(RouterError::exhausted(attempt, Some(&e)));
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "fallback attempt failed");
                    last_error = Some(e);
                }
            }
        }

        error!(attempts = max_attempts, "fallback retry budget exhausted");
        Err(RouterError::exhausted(max_attempts, last_error.as_ref()))
    }
}

/// The first balanced `{...}` object in `text`, ignoring braces inside
/// JSON strings. Tolerates prose or markdown fences around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and validate a raw reply.
pub fn parse_reply(reply: &str) -> Result<FallbackDecision, RouterError> {
    let json_text = extract_json_object(reply).ok_or_else(|| {
        RouterError::InvalidLlmResponse("No JSON object found in response".to_string())
    })?;

    let value: serde_json::Value = serde_json::from_str(json_text)
        .map_err(|e| RouterError::InvalidLlmResponse(format!("Invalid JSON in response: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| RouterError::InvalidLlmResponse("Response is not a JSON object".to_string()))?;

    for field in ["intent", "parameters", "reasoning"] {
        if !object.contains_key(field) {
            return Err(RouterError::InvalidLlmResponse(format!(
                "Missing required field: {}",
                field
            )));
        }
    }

    let intent_tag = object["intent"]
        .as_str()
        .ok_or_else(|| RouterError::InvalidLlmResponse("Intent must be a string".to_string()))?;
    let intent = Intent::from_tag(intent_tag).ok_or_else(|| {
        RouterError::InvalidLlmResponse(format!("Invalid intent: {}", intent_tag))
    })?;

    let parameters = object["parameters"].as_object().ok_or_else(|| {
        RouterError::InvalidLlmResponse("Parameters must be a JSON object".to_string())
    })?;

    let reasoning = object["reasoning"]
        .as_str()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            RouterError::InvalidLlmResponse("Reasoning must be a non-empty string".to_string())
        })?;

    Ok(FallbackDecision {
        intent,
        parameters: normalize_parameters(parameters),
        reasoning: reasoning.to_string(),
    })
}

/// Run reply parameters through the shared alias tables. Values outside the
/// canonical domain are dropped.
pub fn normalize_parameters(raw: &serde_json::Map<String, serde_json::Value>) -> SearchParams {
    let mut params = SearchParams::new();

    for key in ParamKey::ALL {
        let raw_text = match raw.get(key.as_str()) {
            None | Some(serde_json::Value::Null) => continue,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => continue,
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => format!("{}", f as i64),
                _ => n.to_string(),
            },
            Some(other) => other.to_string(),
        };

        match key.normalize(&raw_text) {
            Some(value) => params.set(value),
            None => warn!(key = %key, value = %raw_text, "dropping out-of-domain parameter"),
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::FakeTextGenerator;
    use crate::params::{Borough, VoucherType};

    const VALID: &str = r#"{"intent": "SEARCH_LISTINGS", "parameters": {"borough": "BK", "bedrooms": 2, "max_rent": null, "voucher_type": "section eight"}, "reasoning": "User wants listings"}"#;

    fn router(responses: Vec<Result<String, LlmError>>) -> (FallbackRouter, Arc<FakeTextGenerator>) {
        let generator = Arc::new(FakeTextGenerator::new(responses));
        (FallbackRouter::new(generator.clone()), generator)
    }

    #[test]
    fn test_extract_json_object_with_prose_and_fences() {
        let text = "Sure! Here you go:\n```json\n{\"a\": {\"b\": 1}}\n```\nAnything else?";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = r#"{"reasoning": "uses } and { \" inside"} trailing {"x":1}"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"reasoning": "uses } and { \" inside"}"#)
        );
    }

    #[test]
    fn test_extract_json_object_unbalanced() {
        assert_eq!(extract_json_object("{\"a\": 1"), None);
        assert_eq!(extract_json_object("no json"), None);
    }

    #[test]
    fn test_parse_reply_normalizes() {
        let decision = parse_reply(VALID).unwrap();
        assert_eq!(decision.intent, Intent::SearchListings);
        assert_eq!(decision.parameters.borough, Some(Borough::Brooklyn));
        assert_eq!(decision.parameters.bedrooms, Some(2));
        assert_eq!(decision.parameters.max_rent, None);
        assert_eq!(decision.parameters.voucher_type, Some(VoucherType::Section8));
    }

    #[test]
    fn test_parse_reply_maps_legacy_intent() {
        let reply = r#"{"intent": "HELP_REQUEST", "parameters": {}, "reasoning": "asks for help"}"#;
        assert_eq!(parse_reply(reply).unwrap().intent, Intent::ShowHelp);
    }

    #[test]
    fn test_parse_reply_drops_out_of_domain_values() {
        let reply = r#"{"intent": "SEARCH_LISTINGS", "parameters": {"borough": "Jersey City", "bedrooms": 25, "max_rent": "3000"}, "reasoning": "r"}"#;
        let decision = parse_reply(reply).unwrap();
        assert_eq!(decision.parameters.borough, None);
        assert_eq!(decision.parameters.bedrooms, None);
        assert_eq!(decision.parameters.max_rent, Some(3000));
    }

    #[test]
    fn test_parse_reply_contract_violations() {
        let cases = [
            r#"{"parameters": {}, "reasoning": "r"}"#,
            r#"{"intent": "BOOK_TOUR", "parameters": {}, "reasoning": "r"}"#,
            r#"{"intent": "SHOW_HELP", "parameters": [], "reasoning": "r"}"#,
            r#"{"intent": "SHOW_HELP", "parameters": {}, "reasoning": "   "}"#,
            "not json at all",
        ];
        for reply in cases {
            let err = parse_reply(reply).unwrap_err();
            assert!(matches!(err, RouterError::InvalidLlmResponse(_)), "{}", reply);
        }
    }

    #[test]
    fn test_invalid_input() {
        let (router, generator) = router(vec![Ok(VALID.to_string())]);
        assert!(matches!(
            router.route("", None, Language::En),
            Err(RouterError::InvalidInput(_))
        ));
        assert!(matches!(
            router.route("   ", None, Language::En),
            Err(RouterError::InvalidInput(_))
        ));
        let long = "a".repeat(1001);
        assert!(matches!(
            router.route(&long, None, Language::En),
            Err(RouterError::InvalidInput(_))
        ));
        let long_ctx = "c".repeat(2001);
        assert!(matches!(
            router.route("hi", Some(&long_ctx), Language::En),
            Err(RouterError::InvalidInput(_))
        ));
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn test_retries_transient_failures() {
        let (router, generator) = router(vec![
            Err(LlmError::Timeout(30)),
            Err(LlmError::Http("HTTP 503".into())),
            Ok(VALID.to_string()),
        ]);
        let decision = router.route("somewhere in bk", None, Language::En).unwrap();
        assert_eq!(decision.intent, Intent::SearchListings);
        assert_eq!(generator.call_count(), 3);
    }

    #[test]
    fn test_exhausts_retry_budget() {
        let (router, generator) = router(vec![Err(LlmError::Timeout(30))]);
        let err = router.route("hello", None, Language::En).unwrap_err();
        assert_eq!(
            err,
            RouterError::LlmProcessing {
                attempts: 3,
                last_error: "Request timeout after 30 seconds".to_string()
            }
        );
        assert_eq!(generator.call_count(), 3);
    }

    #[test]
    fn test_invalid_reply_is_not_retried() {
        let (router, generator) = router(vec![
            Ok(r#"{"intent": "NOPE", "parameters": {}, "reasoning": "r"}"#.to_string()),
            Ok(VALID.to_string()),
        ]);
        let err = router.route("hello", None, Language::En).unwrap_err();
        assert!(matches!(err, RouterError::InvalidLlmResponse(_)));
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_disabled_backend_stops_immediately() {
        let (router, generator) = router(vec![Err(LlmError::Disabled)]);
        let err = router.route("hello", None, Language::En).unwrap_err();
        assert!(matches!(err, RouterError::LlmProcessing { attempts: 1, .. }));
        assert_eq!(generator.call_count(), 1);
    }
}
