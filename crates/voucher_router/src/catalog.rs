//! Pattern catalog: intent pattern groups and parameter extraction specs.
//!
//! The catalog is data, not control flow. Each intent owns one or more
//! groups (patterns + priority + context flag) and each parameter owns an
//! ordered list of capture patterns plus a normalizer. Built once, shared
//! read-only by every session.
//!
//! All patterns run against the lower-cased message.

use regex::Regex;
use std::sync::LazyLock;

use crate::intent::Intent;
use crate::params::{self, ParamKey, ParamValue};

/// A set of patterns that votes for one intent.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    pub intent: Intent,
    /// Higher wins
    pub priority: u8,
    /// Skipped entirely when the caller supplies no context
    pub requires_context: bool,
    pub description: &'static str,
    pub patterns: Vec<Regex>,
}

/// One pattern hit inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: String,
    pub matched_text: String,
}

impl PatternGroup {
    pub fn new(
        intent: Intent,
        priority: u8,
        requires_context: bool,
        description: &'static str,
        patterns: &[&str],
    ) -> Self {
        Self {
            intent,
            priority,
            requires_context,
            description,
            patterns: compile(patterns),
        }
    }

    /// Every pattern in this group that matches `text`.
    pub fn matches(&self, text: &str) -> Vec<PatternMatch> {
        self.patterns
            .iter()
            .filter_map(|re| {
                re.find(text).map(|m| PatternMatch {
                    pattern: re.as_str().to_string(),
                    matched_text: m.as_str().to_string(),
                })
            })
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// Ordered capture patterns for one parameter. Capture group 1 (or the whole
/// match when a pattern has no group) is handed to `normalize`.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub key: ParamKey,
    pub patterns: Vec<Regex>,
    pub normalize: fn(&str) -> Option<ParamValue>,
}

impl ParameterSpec {
    pub fn new(key: ParamKey, patterns: &[&str], normalize: fn(&str) -> Option<ParamValue>) -> Self {
        Self {
            key,
            patterns: compile(patterns),
            normalize,
        }
    }

    /// Raw capture of the first pattern that matches, if any.
    pub fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns.iter().find_map(|re| {
            re.captures(text)
                .map(|caps| caps.get(1).or_else(|| caps.get(0)).map_or("", |m| m.as_str()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct PatternCatalog {
    groups: Vec<PatternGroup>,
    parameters: Vec<ParameterSpec>,
}

impl PatternCatalog {
    /// Groups are stably sorted by descending priority, so declaration order
    /// breaks ties.
    pub fn new(mut groups: Vec<PatternGroup>, parameters: Vec<ParameterSpec>) -> Self {
        groups.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { groups, parameters }
    }

    /// The built-in catalog.
    pub fn standard() -> &'static PatternCatalog {
        &STANDARD
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn parameter(&self, key: ParamKey) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|s| s.key == key)
    }

    pub fn groups_for(&self, intent: Intent) -> impl Iterator<Item = &PatternGroup> {
        self.groups.iter().filter(move |g| g.intent == intent)
    }
}

// Catalog patterns are literals; a compile failure is a programming error
// caught by the tests below.
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

const BOROUGH_WORDS: &str =
    r"manhattan|brooklyn|queens|(?:the\s+)?bronx|staten(?:\s+island)?|bk|bklyn|bx|mnh|qns|si|the\s+city";
const LISTING_NOUNS: &str =
    r"apartments?|listings?|places?|homes?|units?|rooms?|studios?|housing|bedrooms?|br";
const VOUCHER_WORDS: &str = r"section\s*-?\s*8|hasa|city\s*fheps|housing\s+vouchers?|vouchers?";

static STANDARD: LazyLock<PatternCatalog> = LazyLock::new(|| {
    PatternCatalog::new(standard_groups(), standard_parameters())
});

fn standard_groups() -> Vec<PatternGroup> {
    vec![
        PatternGroup::new(
            Intent::CheckViolations,
            5,
            false,
            "building violation lookups",
            &[
                r"\b(?:check|verify|look\s+up)\s+(?:the\s+|for\s+)?(?:building\s+)?violations?\b",
                r"\bviolations?\s+(?:for|at|on|in)\b",
                r"\b(?:any|building|hpd)\s+violations?\b",
                r"\bis\s+(?:this|that|the)\s+building\s+safe\b",
                r"\bviolaciones\b",
            ],
        ),
        PatternGroup::new(
            Intent::VoucherInfo,
            5,
            false,
            "questions about voucher programs",
            &[
                &format!(r"\b(?:what\s+is|what's|tell\s+me\s+about|explain)\s+(?:a\s+|the\s+)?(?:{})\b", VOUCHER_WORDS),
                r"\b(?:vouchers?|section\s*8|hasa|city\s*fheps)\s+(?:info|information|details|requirements)\b",
                r"\bhow\s+(?:does|do)\s+(?:vouchers?|section\s*8|hasa|city\s*fheps|housing\s+vouchers?)\s+work\b",
                r"\b(?:what\s+are|what's)\s+(?:the\s+)?(?:requirements|eligibility|criteria)\s+for\b",
                r"\bhow\s+(?:do\s+i|can\s+i)\s+(?:apply|qualify)\s+for\b",
                r"\bdifferences?\s+between\s+(?:section\s*8|hasa|city\s*fheps)",
                r"\b(?:what|which)\s+(?:kinds?\s+of\s+|types?\s+of\s+)?vouchers?\b.*\b(?:accept|take|support)",
                r"\b(?:what|which)\s+voucher\s+(?:types|programs|options)\b",
                r"\bqu[eé]\s+(?:es|son)\s+(?:la\s+|el\s+|los\s+)?(?:secci[oó]n\s*8|section\s*8|vales?|vouchers?)\b",
            ],
        ),
        PatternGroup::new(
            Intent::FollowUp,
            4,
            true,
            "questions about the listing currently shown",
            &[
                r"\b(?:this|that)\s+(?:one|listing|apartment|place|unit|building)\b",
                r"\b(?:the\s+)?(?:first|second|third|last)\s+(?:one|listing|apartment)\b",
                r"^\s*(?:which|what)\s+(?:subway\s+|train\s+)?(?:lines?|trains?)\b",
                r"^\s*how\s+(?:far|close)\b",
                r"\b(?:more\s+info(?:rmation)?|tell\s+me\s+more|more\s+details)\b",
                r"\b(?:nearest|closest)\s+(?:subway|train|station|school)s?\b",
                r"^\s*is\s+(?:it|this|that)\s+(?:near|close)\b",
            ],
        ),
        PatternGroup::new(
            Intent::WhatIf,
            3,
            true,
            "changes to an executed search",
            &[
                r"\b(?:what\s+if|how\s+about|what\s+about)\b",
                &format!(
                    r"\b(?:try|check|look|search|find)\s+(?:in\s+|around\s+|near\s+)?(?:{})\b",
                    BOROUGH_WORDS
                ),
                r"\b(?:try|check)\s+(?:a\s+|an\s+|with\s+|for\s+)?(?:\d|\$|one\b|two\b|three\b|four\b|five\b|studio)",
                r"\binstead\b",
                r"\b(?:switch|change)\s+(?:it\s+|that\s+)?to\b",
                r"\b(?:let'?s|lets)\s+(?:try|check|look)\b",
                r"\bsame\s+(?:search|thing)\s+but\b",
                r"\b(?:can\s+you|could\s+you|maybe)\s+(?:try|check)\b",
                r"\b(?:y\s+si|qu[eé]\s+tal)\b",
            ],
        ),
        PatternGroup::new(
            Intent::SearchListings,
            2,
            false,
            "new listing searches",
            &[
                &format!(
                    r"\b(?:find|search|show|get|display|browse)\s+(?:me\s+)?(?:for\s+)?(?:\S+\s+){{0,3}}?(?:{})\b",
                    LISTING_NOUNS
                ),
                &format!(
                    r"\b(?:looking\s+for|look\s+for|i\s+want|i\s+need|need)\s+(?:\S+\s+){{0,3}}?(?:{})\b",
                    LISTING_NOUNS
                ),
                r"\b(?:available|open)\s+(?:units?|apartments?|places?|listings?)\b",
                r"\b(?:\d+\s*-?\s*(?:br|bd|beds?|bedrooms?)|studios?|apartments?)\s+(?:in|near|around)\b",
                r"\b(?:apartments?|listings?|places?)\s+(?:that\s+)?(?:accepts?|takes?|for)\s+(?:section|vouchers?|hasa|city)",
                r"\b(?:busco|estoy\s+buscando|quiero|necesito|buscar)\s+(?:un\s+|una\s+)?(?:apartamento|departamento|vivienda|casa|lugar|alojamiento|habitaci[oó]n|habitaciones)\b",
                r"(?:找|寻找|搜索).*(?:房|公寓|居室)",
                r"(?:অ্যাপার্টমেন্ট|বাড়ি).*খুঁজ",
            ],
        ),
        PatternGroup::new(
            Intent::ParameterRefinement,
            2,
            true,
            "narrowing an executed search",
            &[
                r"\b(?:under|below|max|maximum|up\s+to|less\s+than|no\s+more\s+than)\s+\$?\d",
                r"\bbudget\s+(?:of\s+|is\s+)?\$?\d",
                r"^\s*\$?\d[\d,]*(?:\.\d+)?k?\s*(?:max|maximum|or\s+less)?\s*$",
                r"\bonly\s+(?:studios?|\d+\s*(?:br|bd|beds?|bedrooms?))\b",
                r"\b(?:also|just)\s+(?:look|search)\s+(?:for|in)\b",
                r"\b(?:\d+|one|two|three|four|five|six)\s*-?\s*(?:br|bd|beds?|bedrooms?)\b",
                r"\bstudios?\b",
                &format!(r"\b(?:with|accepts?|takes?)\s+(?:{})\b", VOUCHER_WORDS),
            ],
        ),
        PatternGroup::new(
            Intent::ShowHelp,
            1,
            false,
            "help requests",
            &[
                r"\b(?:help|assistance|support)\b",
                r"\b(?:what\s+can\s+you\s+do|how\s+do\s+i\s+use|how\s+does\s+this\s+work)\b",
                r"\b(?:commands|options|features)\b",
                r"\bayuda\b",
                r"帮助",
                r"সাহায্য",
            ],
        ),
    ]
}

const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+|\d+";
// Bare numbers after a rent word need three digits ("about 3 bedrooms").
const RENT_AMOUNT: &str = r"\d{1,3}(?:,\d{3})+|\d{3,}";
// "2k" is only rent next to a `$` or a rent word ("a 5k run" is not).
const THOUSANDS: &str = r"\d+(?:\.\d+)?\s?k";
const RENT_WORDS: &str = r"under|below|max(?:imum)?|up\s+to|budget(?:\s+(?:of|is))?|less\s+than|no\s+more\s+than|around|about|roughly";
const RENT_SUFFIXES: &str = r"a\s+month|per\s+month|/\s*mo(?:nth)?|monthly|max(?:imum)?|or\s+less|rent";

fn standard_parameters() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new(
            ParamKey::Borough,
            &[
                r"\b(?:in|around|near|at|from|en|del|de)\s+(?:the\s+)?(isla\s+staten|staten\s+island|staten|manhattan|brooklyn|queens|bronx|bklyn|bk|bx|mnh|qns)\b",
                r"\b(isla\s+staten|staten\s+island|staten|manhattan|brooklyn|queens|bronx)\b",
                r"\b(the\s+city)\b",
                r"\b(bklyn|bk|bx|mnh|qns)\b",
                r"\b(?:try|check|search|look|about|in|around|near|at)\s+(si)\b",
                r"(曼哈顿|布鲁克林|皇后区|皇后|布朗克斯|布朗士|史泰登岛)",
                r"(ম্যানহাটান|ব্রুকলিন|কুইন্স|ব্রংক্স|ব্রনক্স|ব্রঙ্কস|স্ট্যাটেন আইল্যান্ড)",
            ],
            params::parse_borough,
        ),
        ParameterSpec::new(
            ParamKey::Bedrooms,
            &[
                r"\b(\d+)\s*-?\s*(?:br|bd|beds?|bedrooms?)\b",
                r"\b(one|two|three|four|five|six)[\s-]+(?:beds?|bedrooms?|br)\b",
                r"\b(\d+|uno|una|un|dos|tres|cuatro|cinco|seis)\s+(?:habitaci[oó]n|habitaciones|dormitorios?|cuartos?|rec[aá]maras?)\b",
                r"([1-9一二两三四五六])\s*(?:居室|室|房)",
                r"([০-৯0-9]+)\s*(?:বেডরুম|বেড)",
                r"\b(studios?|estudio)\b",
            ],
            params::parse_bedrooms,
        ),
        ParameterSpec::new(
            ParamKey::MaxRent,
            &[
                r"\bbetween\s+\$?\d[\d,]*(?:\.\d+)?k?\s*(?:and|-|to)\s*\$?(\d[\d,]*(?:\.\d+)?k?)",
                &format!(r"\$({})\b", THOUSANDS),
                &format!(r"\b(?:{})\s+\$?({})\b", RENT_WORDS, THOUSANDS),
                &format!(r"\b({})\s*(?:{})\b", THOUSANDS, RENT_SUFFIXES),
                &format!(r"\$({})(?:\.\d{{2}})?", AMOUNT),
                &format!(r"\b(?:{})\s+\$?({})\b", RENT_WORDS, RENT_AMOUNT),
                &format!(r"\b({})\s*(?:dollars?|usd|bucks)\b", RENT_AMOUNT),
                &format!(
                    r"\b(?:menos\s+de|hasta|m[aá]ximo(?:\s+de)?|presupuesto\s+de)\s+\$?({}|{})",
                    THOUSANDS, RENT_AMOUNT
                ),
            ],
            params::parse_max_rent,
        ),
        ParameterSpec::new(
            ParamKey::VoucherType,
            &[
                r"\b(section\s*-?\s*8|section\s+eight|sec\s*8|s8|secci[oó]n\s*8)\b",
                r"\b(city\s*fheps|cityfeps|fheps)\b",
                r"\b(hasa|dss|hra)\b",
                r"(第八条|সেকশন ৮)",
                r"\b(housing\s+vouchers?|vouchers?|vale\s+de\s+vivienda|voucher\s+de\s+vivienda|cup[oó]n\s+de\s+vivienda|vales?)\b",
                r"(住房券|住房补助|租房券|হাউজিং ভাউচার|আবাসন ভাউচার|ভাউচার)",
            ],
            params::parse_voucher,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_compiles() {
        let catalog = PatternCatalog::standard();
        assert_eq!(catalog.parameters().len(), 4);
        assert!(catalog.groups().iter().all(|g| !g.patterns.is_empty()));
    }

    #[test]
    fn test_groups_sorted_by_descending_priority() {
        let priorities: Vec<u8> = PatternCatalog::standard()
            .groups()
            .iter()
            .map(|g| g.priority)
            .collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let groups = PatternCatalog::standard().groups();
        let search = groups.iter().position(|g| g.intent == Intent::SearchListings);
        let refine = groups.iter().position(|g| g.intent == Intent::ParameterRefinement);
        assert!(search < refine);
    }

    #[test]
    fn test_every_intent_but_unclassified_has_a_group() {
        let catalog = PatternCatalog::standard();
        for intent in Intent::ALL {
            let has_group = catalog.groups_for(intent).next().is_some();
            assert_eq!(has_group, intent != Intent::Unclassified, "{}", intent);
        }
    }

    #[test]
    fn test_context_flags() {
        let catalog = PatternCatalog::standard();
        for group in catalog.groups() {
            let expected = matches!(
                group.intent,
                Intent::FollowUp | Intent::WhatIf | Intent::ParameterRefinement
            );
            assert_eq!(group.requires_context, expected, "{}", group.intent);
        }
    }

    #[test]
    fn test_first_capture_uses_group_one() {
        let spec = PatternCatalog::standard().parameter(ParamKey::Borough).unwrap();
        assert_eq!(spec.first_capture("apartments in brooklyn"), Some("brooklyn"));
        assert_eq!(spec.first_capture("nothing here"), None);
    }

    #[test]
    fn test_group_matches_report_text() {
        let catalog = PatternCatalog::standard();
        let what_if = catalog.groups_for(Intent::WhatIf).next().unwrap();
        let hits = what_if.matches("try queens instead");
        assert!(hits.iter().any(|m| m.matched_text == "instead"));
        assert!(hits.iter().any(|m| m.matched_text == "try queens"));
    }
}
