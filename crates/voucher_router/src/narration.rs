//! User-facing text for routing results and parameter changes.

use crate::context::{ChangeType, ParameterChange};
use crate::intent::Intent;
use crate::params::{ParamKey, ParamValue, SearchParams};

/// "2 bedrooms", "1 bedroom", "studios"
fn bedrooms_phrase(n: u8) -> String {
    match n {
        0 => "studios".to_string(),
        1 => "1 bedroom".to_string(),
        n => format!("{} bedrooms", n),
    }
}

/// Value as it reads inside a sentence.
pub fn value_phrase(value: &ParamValue) -> String {
    match value {
        ParamValue::Bedrooms(n) => bedrooms_phrase(*n),
        other => other.to_string(),
    }
}

/// "a", "a and b", "a, b, and c"
pub fn join_list(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// Short description of a search: "2-bedroom listings in Brooklyn under $2,500 accepting Section 8".
pub fn describe_search(params: &SearchParams) -> String {
    let mut text = match params.bedrooms {
        Some(0) => "studios".to_string(),
        Some(n) => format!("{}-bedroom listings", n),
        None => "listings".to_string(),
    };
    if let Some(borough) = params.borough {
        text.push_str(&format!(" in {}", borough));
    }
    if let Some(rent) = params.max_rent {
        text.push_str(&format!(" under {}", ParamValue::MaxRent(rent)));
    }
    if let Some(voucher) = params.voucher_type {
        text.push_str(&format!(" accepting {}", voucher));
    }
    text
}

/// One-line reply describing what the assistant will do for `intent`.
pub fn describe_intent(intent: Intent, params: &SearchParams) -> String {
    match intent {
        Intent::SearchListings => format!("Searching for {}.", describe_search(params)),
        Intent::CheckViolations => "Looking up building violations.".to_string(),
        Intent::VoucherInfo => match params.voucher_type {
            Some(voucher) => format!("Here is how {} works.", voucher),
            None => "Here is an overview of the housing voucher programs.".to_string(),
        },
        Intent::ShowHelp => "I can search voucher-friendly listings and check buildings for violations. \
             Try: \"Find a 2 bedroom in Brooklyn under $2500 with Section 8\"."
            .to_string(),
        Intent::WhatIf | Intent::ParameterRefinement => {
            format!("Updating your search to {}.", describe_search(params))
        }
        Intent::FollowUp => "Looking into the listing you asked about.".to_string(),
        Intent::Unclassified => "I'm not sure what you mean. You can ask me to find apartments, \
             check a building for violations, or explain a voucher program."
            .to_string(),
    }
}

fn change_phrase(change: &ParameterChange, found_nothing: bool) -> Option<String> {
    let new = value_phrase(&change.new_value);
    let old = change.old_value.as_ref().map(value_phrase);

    let phrase = match (change.key, change.change_type, old) {
        (_, ChangeType::Redundant, _) => return None,
        (ParamKey::Borough, ChangeType::RetryAllowed, _) if found_nothing => {
            format!("{} again, since the previous search found no listings", new)
        }
        (ParamKey::Borough, ChangeType::RetryAllowed, _) => {
            format!("{} again with your updated criteria", new)
        }
        (ParamKey::Borough, _, Some(old)) => format!("{} instead of {}", new, old),
        (ParamKey::Borough, _, None) => format!("in {}", new),
        (ParamKey::Bedrooms, _, Some(old)) => format!("with {} instead of {}", new, old),
        (ParamKey::Bedrooms, _, None) => format!("with {}", new),
        (ParamKey::MaxRent, _, Some(old)) => format!("with a max rent of {} instead of {}", new, old),
        (ParamKey::MaxRent, _, None) => format!("with a max rent of {}", new),
        (ParamKey::VoucherType, _, Some(old)) => format!("accepting {} instead of {}", new, old),
        (ParamKey::VoucherType, _, None) => format!("accepting {}", new),
    };
    Some(phrase)
}

/// Confirmation for the effective changes, or `None` when every change is
/// redundant. `found_nothing` selects the retry phrasing.
pub fn confirmation_text(changes: &[ParameterChange], found_nothing: bool) -> Option<String> {
    let parts: Vec<String> = changes
        .iter()
        .filter_map(|c| change_phrase(c, found_nothing))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("I'll search {}.", join_list(&parts)))
}

/// "borough set to Brooklyn and bedrooms set to 2 bedrooms"
pub fn redundant_text(changes: &[ParameterChange]) -> String {
    let parts: Vec<String> = changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Redundant)
        .map(|c| format!("{} set to {}", c.key.label(), value_phrase(&c.new_value)))
        .collect();
    join_list(&parts)
}

/// Summary of a change list for logs and the CLI.
pub fn summarize_changes(changes: &[ParameterChange], found_nothing: bool) -> String {
    if changes.is_empty() {
        return "No search criteria found in the message.".to_string();
    }
    match confirmation_text(changes, found_nothing) {
        Some(text) => text,
        None => format!(
            "We're already searching with those criteria ({}).",
            redundant_text(changes)
        ),
    }
}
