//! Generative fallback: input validation, retry budget and reply contract.

use std::sync::Arc;

use voucher_router::{
    Borough, FakeTextGenerator, FallbackConfig, FallbackRouter, Intent, Language, LlmError,
    RouterError,
};

const GOOD_REPLY: &str = r#"Here is the classification:
```json
{"intent": "WHAT_IF", "parameters": {"borough": "queens", "bedrooms": null, "max_rent": null, "voucher_type": null}, "reasoning": "User wants to look in Queens instead"}
```"#;

fn fallback(responses: Vec<Result<String, LlmError>>) -> (FallbackRouter, Arc<FakeTextGenerator>) {
    let generator = Arc::new(FakeTextGenerator::new(responses));
    (FallbackRouter::new(generator.clone()), generator)
}

#[test]
fn scenario_d_empty_message_is_rejected_without_a_call() {
    let (router, generator) = fallback(vec![Ok(GOOD_REPLY.to_string())]);

    for message in ["", "  \n\t "] {
        let err = router.route(message, None, Language::En).unwrap_err();
        assert!(matches!(err, RouterError::InvalidInput(_)), "{:?}", message);
        assert_eq!(err.code(), "invalid_input");
    }
    assert_eq!(generator.call_count(), 0);
}

#[test]
fn message_length_counts_characters() {
    let (router, _) = fallback(vec![Ok(GOOD_REPLY.to_string())]);

    let at_limit = "房".repeat(1000);
    assert!(router.route(&at_limit, None, Language::Zh).is_ok());

    let over_limit = "房".repeat(1001);
    assert!(matches!(
        router.route(&over_limit, None, Language::Zh),
        Err(RouterError::InvalidInput(_))
    ));
}

#[test]
fn reply_with_prose_is_accepted() {
    let (router, _) = fallback(vec![Ok(GOOD_REPLY.to_string())]);
    let decision = router
        .route("what about the other one, queens", Some("Previous search: {}"), Language::En)
        .unwrap();

    assert_eq!(decision.intent, Intent::WhatIf);
    assert_eq!(decision.parameters.borough, Some(Borough::Queens));
    assert_eq!(decision.parameters.len(), 1);
    assert_eq!(decision.reasoning, "User wants to look in Queens instead");
}

#[test]
fn two_failures_then_success_uses_three_attempts() {
    let (router, generator) = fallback(vec![
        Err(LlmError::Http("HTTP 502: bad gateway".to_string())),
        Err(LlmError::EmptyResponse),
        Ok(GOOD_REPLY.to_string()),
    ]);

    let decision = router.route("eh, queens maybe", None, Language::En).unwrap();
    assert_eq!(decision.intent, Intent::WhatIf);
    assert_eq!(generator.call_count(), 3);
}

#[test]
fn configured_attempt_budget_is_respected() {
    let generator = Arc::new(FakeTextGenerator::always_error(LlmError::Timeout(5)));
    let config = FallbackConfig {
        max_attempts: 5,
        ..FallbackConfig::default()
    };
    let router = FallbackRouter::with_config(generator.clone(), config);

    let err = router.route("anything", None, Language::En).unwrap_err();
    assert!(matches!(err, RouterError::LlmProcessing { attempts: 5, .. }));
    assert!(err.is_retryable());
    assert_eq!(generator.call_count(), 5);
}

#[test]
fn zero_attempts_still_tries_once() {
    let generator = Arc::new(FakeTextGenerator::always(GOOD_REPLY));
    let config = FallbackConfig {
        max_attempts: 0,
        ..FallbackConfig::default()
    };
    let router = FallbackRouter::with_config(generator.clone(), config);

    assert!(router.route("queens?", None, Language::En).is_ok());
    assert_eq!(generator.call_count(), 1);
}

#[test]
fn contract_violation_fails_on_first_reply() {
    let (router, generator) = fallback(vec![
        Ok(r#"{"intent": "SEARCH_LISTINGS", "parameters": {}}"#.to_string()),
        Ok(GOOD_REPLY.to_string()),
    ]);

    let err = router.route("anything", None, Language::En).unwrap_err();
    assert_eq!(
        err,
        RouterError::InvalidLlmResponse("Missing required field: reasoning".to_string())
    );
    assert!(!err.is_retryable());
    assert_eq!(generator.call_count(), 1);
}

#[test]
fn prompt_carries_language_examples_and_escaped_input() {
    let generator = Arc::new(FakeTextGenerator::always(GOOD_REPLY));
    let router = FallbackRouter::new(generator.clone());

    router
        .route("busco en \"queens\" 皇后区", Some("Previous search: {}"), Language::Es)
        .unwrap();

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("La interfaz de usuario está en español"));
    assert!(prompt.contains("Busco apartamento en Brooklyn"));
    assert!(prompt.contains("在布鲁克林找两居室"));
    assert!(prompt.contains(r#"- Message: "busco en \"queens\" 皇后区""#));
    assert!(prompt.contains(r#"- Context: "Previous search: {}""#));
    for intent in Intent::ALL {
        assert!(prompt.contains(&format!("\"{}\"", intent)), "{}", intent);
    }
}
