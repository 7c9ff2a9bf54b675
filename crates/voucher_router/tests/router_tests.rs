//! End-to-end routing through both tiers.
//!
//! The model is always a scripted fake; nothing touches the network.

use std::sync::Arc;

use voucher_router::{
    classify, Borough, ChangeType, FakeTextGenerator, FallbackRouter, Intent, Language, LlmError,
    ParamValue, RefinementOutcome, RouterUsed, SearchContext, SearchParams, Session, TwoTierRouter,
    VoucherType,
};

fn router_with(responses: Vec<Result<String, LlmError>>) -> (TwoTierRouter, Arc<FakeTextGenerator>) {
    let generator = Arc::new(FakeTextGenerator::new(responses));
    (TwoTierRouter::new(FallbackRouter::new(generator.clone())), generator)
}

fn offline() -> TwoTierRouter {
    router_with(vec![Err(LlmError::Disabled)]).0
}

#[test]
fn scenario_a_full_search_sentence() {
    let response = offline().route(
        "find me a 2 bedroom in Brooklyn under $2500 with Section 8",
        None,
        Language::En,
    );

    assert_eq!(response.intent, Intent::SearchListings);
    assert_eq!(response.router_used, RouterUsed::Regex);
    assert_eq!(response.confidence, 0.95);
    assert_eq!(
        response.parameters,
        SearchParams {
            borough: Some(Borough::Brooklyn),
            bedrooms: Some(2),
            max_rent: Some(2500),
            voucher_type: Some(VoucherType::Section8),
        }
    );
}

#[test]
fn scenario_b_borough_what_if() {
    let mut context = SearchContext::new();
    context.commit(
        &SearchParams::new()
            .with(ParamValue::Borough(Borough::Brooklyn))
            .with(ParamValue::Bedrooms(2)),
    );

    let response = offline().route("try Queens instead", Some(&context), Language::En);
    assert_eq!(response.intent, Intent::WhatIf);

    let changes = context.analyze(&response.parameters);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Refinement);
    assert_eq!(changes[0].old_value, Some(ParamValue::Borough(Borough::Brooklyn)));
    assert_eq!(changes[0].new_value, ParamValue::Borough(Borough::Queens));
}

#[test]
fn scenario_c_what_if_without_prior_search() {
    let router = offline();
    let mut session = Session::new(Language::En);

    let outcome = session.turn(&router, "what if I tried Manhattan?");
    assert!(matches!(
        outcome.refinement,
        Some(RefinementOutcome::NeedsInitialSearch { .. })
    ));
    assert!(!outcome.committed);
    assert!(session.context().current_params().is_empty());
}

#[test]
fn fallback_used_when_pattern_tier_is_inconclusive() {
    let reply = r#"{"intent": "SEARCH_LISTINGS", "parameters": {"borough": "Brooklyn", "bedrooms": null, "max_rent": null, "voucher_type": null}, "reasoning": "Wants a place near Prospect Park"}"#;
    let (router, generator) = router_with(vec![
        Err(LlmError::Timeout(30)),
        Err(LlmError::Http("connection reset".to_string())),
        Ok(reply.to_string()),
    ]);

    let message = "somewhere near prospect park would be lovely";
    assert_eq!(classify(message, None), Intent::Unclassified);

    let response = router.route(message, None, Language::En);
    assert_eq!(response.router_used, RouterUsed::Llm);
    assert_eq!(response.confidence, 0.8);
    assert_eq!(response.intent, Intent::SearchListings);
    assert_eq!(response.parameters.borough, Some(Borough::Brooklyn));
    assert_eq!(generator.call_count(), 3);
}

#[test]
fn intent_without_parameters_falls_back() {
    let reply = r#"{"intent": "SEARCH_LISTINGS", "parameters": {}, "reasoning": "generic apartment search"}"#;
    let (router, generator) = router_with(vec![Ok(reply.to_string())]);

    let response = router.route("show me apartments", None, Language::En);
    assert_eq!(response.router_used, RouterUsed::Llm);
    assert_eq!(generator.call_count(), 1);
}

#[test]
fn standalone_intents_need_no_parameters() {
    let (router, generator) = router_with(vec![Err(LlmError::Disabled)]);

    let help = router.route("what can you do?", None, Language::En);
    assert_eq!(help.intent, Intent::ShowHelp);
    assert_eq!(help.router_used, RouterUsed::Regex);

    let violations = router.route("check violations for 350 Grand St", None, Language::En);
    assert_eq!(violations.intent, Intent::CheckViolations);
    assert_eq!(violations.router_used, RouterUsed::Regex);

    assert_eq!(generator.call_count(), 0);
}

#[test]
fn routing_never_panics_or_errors() {
    let (router, _) = router_with(vec![Ok("I am not JSON".to_string())]);
    let long = "x".repeat(5000);
    for message in ["", "   ", "???", long.as_str(), "🙂", "hola"] {
        let response = router.route(message, None, Language::En);
        assert!(!response.reasoning.is_empty());
        assert!((0.0..=1.0).contains(&response.confidence));
        if response.router_used == RouterUsed::None {
            assert_eq!(response.intent, Intent::Unclassified);
            assert!(response.parameters.is_empty());
        }
    }
}

#[test]
fn classification_is_deterministic() {
    let mut context = SearchContext::new();
    context.commit(&SearchParams::new().with(ParamValue::Borough(Borough::Bronx)));

    let messages = [
        "find me a 2 bedroom in Brooklyn",
        "try Queens instead",
        "which lines?",
        "under $1800",
        "what is CityFHEPS?",
        "no idea",
    ];
    for message in messages {
        for ctx in [None, Some(&context)] {
            let first = classify(message, ctx);
            for _ in 0..5 {
                assert_eq!(classify(message, ctx), first, "{}", message);
            }
        }
    }
}

#[test]
fn spanish_and_chinese_searches_route_by_pattern() {
    let router = offline();

    let es = router.route("Busco apartamento en el Bronx con sección 8", None, Language::Es);
    assert_eq!(es.intent, Intent::SearchListings);
    assert_eq!(es.router_used, RouterUsed::Regex);
    assert_eq!(es.parameters.borough, Some(Borough::Bronx));
    assert_eq!(es.parameters.voucher_type, Some(VoucherType::Section8));

    let zh = router.route("在布鲁克林找两居室", None, Language::Zh);
    assert_eq!(zh.intent, Intent::SearchListings);
    assert_eq!(zh.parameters.borough, Some(Borough::Brooklyn));
    assert_eq!(zh.parameters.bedrooms, Some(2));
}

#[test]
fn conversation_flow_with_result_feedback() {
    let router = offline();
    let mut session = Session::new(Language::En);

    let first = session.turn(&router, "find a 2 bedroom in Brooklyn under $2500");
    assert!(first.committed);
    session.record_result_count(0);

    let retry = session.turn(&router, "try Brooklyn again");
    assert_eq!(retry.response.intent, Intent::WhatIf);
    assert_eq!(retry.changes[0].change_type, ChangeType::RetryAllowed);
    assert!(retry.reply.contains("again, since the previous search found no listings"));
    assert!(retry.committed);

    session.record_result_count(3);
    let redundant = session.turn(&router, "what about 2 bedrooms?");
    assert!(matches!(
        redundant.refinement,
        Some(RefinementOutcome::AlreadyApplied { .. })
    ));
    assert!(!redundant.committed);
}
