//! Terminal output for routing results.
//!
//! ASCII labels, colour only on the label. `--json` bypasses all of it.

use owo_colors::OwoColorize;
use serde::Serialize;
use voucher_router::narration::summarize_changes;
use voucher_router::{
    ClassificationResult, RouterResponse, RouterUsed, SearchContext, SearchParams, TurnOutcome,
};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn router_label(used: RouterUsed) -> String {
    match used {
        RouterUsed::Regex => "[REGEX]".bright_green().to_string(),
        RouterUsed::Llm => "[LLM]".yellow().to_string(),
        RouterUsed::None => "[FAILED]".bright_red().to_string(),
    }
}

/// "borough=brooklyn bedrooms=2", or "-" when empty.
pub fn params_line(params: &SearchParams) -> String {
    if params.is_empty() {
        return "-".to_string();
    }
    params
        .iter()
        .map(|v| format!("{}={}", v.key(), v))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_response(response: &RouterResponse) {
    println!(
        "{}  {}  confidence {:.2}",
        router_label(response.router_used),
        response.intent.to_string().bold(),
        response.confidence
    );
    println!("  parameters: {}", params_line(&response.parameters));
    println!("  reasoning:  {}", response.reasoning.dimmed());
}

pub fn print_classification(result: &ClassificationResult) {
    println!(
        "{}  confidence {:.2}",
        result.intent.to_string().bold(),
        result.confidence
    );
    if result.shorthand {
        println!("  {}", "[SHORTHAND] treated as context-dependent".yellow());
    }
    for hit in &result.matched_patterns {
        println!("  * '{}'  {}", hit.matched_text, hit.pattern.dimmed());
    }
}

pub fn print_params(params: &SearchParams) {
    if params.is_empty() {
        println!("{}", "No parameters found".dimmed());
        return;
    }
    for value in params.iter() {
        println!("  {:<13} {}", value.key().label().cyan(), value);
    }
}

/// `found_nothing` is whether the search before this turn came back empty.
pub fn print_turn(outcome: &TurnOutcome, context: &SearchContext, found_nothing: bool) {
    print_response(&outcome.response);
    if !outcome.changes.is_empty() {
        println!(
            "  changes:    {}",
            summarize_changes(&outcome.changes, found_nothing).dimmed()
        );
    }
    println!();
    println!("{}", outcome.reply);
    if outcome.committed {
        println!(
            "{} {}",
            "[SEARCH]".bright_green(),
            params_line(context.current_params())
        );
    }
}

pub fn print_context(context: &SearchContext) {
    println!("{} {}", "[CURRENT]".cyan(), params_line(context.current_params()));
    match context.last_result_count() {
        Some(n) => println!("  last result count: {}", n),
        None => println!("  last result count: not reported"),
    }
    for (i, record) in context.history().enumerate() {
        let count = record
            .result_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}. {}  {}  results {}",
            i + 1,
            record.recorded_at.format("%H:%M:%S"),
            params_line(&record.params),
            count
        );
    }
}
