//! Prompt construction for the generative tier.

use crate::intent::Intent;
use crate::language::{detect_languages, Language};

struct Example {
    message: &'static str,
    intent: Intent,
}

fn examples(language: Language) -> &'static [Example] {
    match language {
        Language::En => &[
            Example { message: "I need help using this", intent: Intent::ShowHelp },
            Example { message: "Show me listings in Brooklyn", intent: Intent::SearchListings },
            Example { message: "What vouchers do you accept?", intent: Intent::VoucherInfo },
            Example { message: "How about Queens instead?", intent: Intent::WhatIf },
        ],
        Language::Es => &[
            Example { message: "Necesito ayuda para usar esto", intent: Intent::ShowHelp },
            Example { message: "Busco apartamento en Brooklyn", intent: Intent::SearchListings },
            Example { message: "¿Qué tipos de voucher aceptan?", intent: Intent::VoucherInfo },
            Example { message: "¿Y si busco en Queens?", intent: Intent::WhatIf },
        ],
        Language::Zh => &[
            Example { message: "我需要帮助", intent: Intent::ShowHelp },
            Example { message: "在布鲁克林找两居室", intent: Intent::SearchListings },
            Example { message: "你们接受什么类型的住房券?", intent: Intent::VoucherInfo },
            Example { message: "换成皇后区呢?", intent: Intent::WhatIf },
        ],
        Language::Bn => &[
            Example { message: "আমার সাহায্য দরকার", intent: Intent::ShowHelp },
            Example { message: "ব্রুকলিনে অ্যাপার্টমেন্ট খুঁজছি", intent: Intent::SearchListings },
            Example { message: "কি ধরনের ভাউচার গ্রহণ করেন?", intent: Intent::VoucherInfo },
            Example { message: "কুইন্সে দেখলে কেমন হয়?", intent: Intent::WhatIf },
        ],
    }
}

fn instruction(language: Language) -> &'static str {
    match language {
        Language::En => "The user interface is in English. Respond appropriately to English queries.",
        Language::Es => "La interfaz de usuario está en español. El usuario puede escribir en español, responde apropiadamente.",
        Language::Zh => "用户界面是中文的。用户可能会用中文写消息，请适当回应。",
        Language::Bn => "ব্যবহারকারী ইন্টারফেস বাংলায়। ব্যবহারকারী বাংলায় বার্তা লিখতে পারেন, উপযুক্তভাবে সাড়া দিন।",
    }
}

/// Build the classification prompt.
///
/// Examples come from the UI language plus any other language detected in
/// the message. The message and context are JSON-escaped.
pub fn build_prompt(message: &str, context: Option<&str>, language: Language) -> String {
    let detected = detect_languages(message);

    let mut note = instruction(language).to_string();
    if detected.len() > 1 {
        let codes: Vec<&str> = detected.iter().map(|l| l.code()).collect();
        note.push_str(&format!(
            " Note: this message mixes languages ({}). Handle each part accordingly.",
            codes.join(", ")
        ));
    }

    let mut example_languages = vec![language];
    for lang in detected {
        if !example_languages.contains(&lang) {
            example_languages.push(lang);
        }
    }
    let example_lines: Vec<String> = example_languages
        .iter()
        .flat_map(|lang| examples(*lang).iter())
        .map(|ex| format!("- \"{}\" -> {}", ex.message, ex.intent))
        .collect();

    let intents: Vec<String> = Intent::ALL.iter().map(|i| format!("\"{}\"", i)).collect();

    let message_json = serde_json::Value::String(message.to_string()).to_string();
    let context_json = match context {
        Some(ctx) => serde_json::Value::String(ctx.to_string()).to_string(),
        None => "null".to_string(),
    };

    format!(
        r#"You are a semantic router and parameter extraction engine for a housing assistant that helps users find voucher-friendly listings in New York City.

LANGUAGE CONTEXT: {note}

EXAMPLES:
{examples}

Your job is to:
1. Classify the intent of the user's message.
2. Extract relevant search parameters, if any.
3. Give a short explanation of your reasoning.

Respond with a single JSON object and nothing else, using exactly this schema:

{{
  "intent": one of [{intents}],
  "parameters": {{
    "borough": "manhattan" | "brooklyn" | "queens" | "bronx" | "staten_island" | null,
    "bedrooms": integer 0-10 (0 = studio) | null,
    "max_rent": integer monthly USD 500-15000 | null,
    "voucher_type": "section_8" | "cityfheps" | "hasa" | "dss" | "hra" | "housing_voucher" | null
  }},
  "reasoning": non-empty string
}}

Guidelines:
- Normalize borough names and abbreviations in any language: "BK" -> "brooklyn", "布鲁克林" -> "brooklyn", "ব্রুকলিন" -> "brooklyn".
- Normalize voucher names: "section eight" -> "section_8", "sección 8" -> "section_8".
- If the message is vague, return "UNCLASSIFIED" and explain why.

Input:
- Message: {message}
- Context: {context}

Response:"#,
        note = note,
        examples = example_lines.join("\n"),
        intents = intents.join(", "),
        message = message_json,
        context = context_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_canonical_intents() {
        let prompt = build_prompt("hello", None, Language::En);
        for intent in Intent::ALL {
            assert!(prompt.contains(&format!("\"{}\"", intent)), "{}", intent);
        }
        assert!(!prompt.contains("HELP_REQUEST"));
    }

    #[test]
    fn test_prompt_escapes_message() {
        let prompt = build_prompt("say \"hi\"\nplease", None, Language::En);
        assert!(prompt.contains(r#"Message: "say \"hi\"\nplease""#));
        assert!(prompt.contains("Context: null"));
    }

    #[test]
    fn test_prompt_includes_context() {
        let prompt = build_prompt(
            "cheaper",
            Some(r#"Previous search: {"borough":"brooklyn"}"#),
            Language::En,
        );
        assert!(prompt.contains(r#"Context: "Previous search: {\"borough\":\"brooklyn\"}""#));
    }

    #[test]
    fn test_language_examples() {
        let prompt = build_prompt("Busco apartamento", None, Language::Es);
        assert!(prompt.contains("La interfaz de usuario está en español"));
        assert!(prompt.contains("Busco apartamento en Brooklyn"));
    }

    #[test]
    fn test_mixed_language_adds_examples_and_note() {
        let prompt = build_prompt("find 公寓 in Brooklyn", None, Language::En);
        assert!(prompt.contains("mixes languages (en, zh)"));
        assert!(prompt.contains("在布鲁克林找两居室"));
        assert!(prompt.contains("Show me listings in Brooklyn"));
    }
}
