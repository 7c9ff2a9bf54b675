//! Canonical intent enumeration shared by both routing tiers.
//!
//! The generative tier historically used a different tag set; those tags are
//! accepted on input and mapped onto this enumeration by [`Intent::from_tag`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Start a new listing search
    SearchListings,
    /// Building violation lookup for an address or listing
    CheckViolations,
    /// Questions about voucher programs themselves
    VoucherInfo,
    /// What can the assistant do
    ShowHelp,
    /// Change one parameter of an executed search ("try Queens instead")
    WhatIf,
    /// Narrow an executed search ("under $2000", "only studios")
    ParameterRefinement,
    /// Question about the listing currently shown ("which lines", "this one")
    FollowUp,
    Unclassified,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::SearchListings,
        Intent::CheckViolations,
        Intent::VoucherInfo,
        Intent::ShowHelp,
        Intent::WhatIf,
        Intent::ParameterRefinement,
        Intent::FollowUp,
        Intent::Unclassified,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::SearchListings => "SEARCH_LISTINGS",
            Self::CheckViolations => "CHECK_VIOLATIONS",
            Self::VoucherInfo => "VOUCHER_INFO",
            Self::ShowHelp => "SHOW_HELP",
            Self::WhatIf => "WHAT_IF",
            Self::ParameterRefinement => "PARAMETER_REFINEMENT",
            Self::FollowUp => "FOLLOW_UP",
            Self::Unclassified => "UNCLASSIFIED",
        }
    }

    /// Parse a tag, accepting the legacy generative-tier spellings.
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SEARCH_LISTINGS" => Some(Self::SearchListings),
            "CHECK_VIOLATIONS" => Some(Self::CheckViolations),
            "VOUCHER_INFO" | "ASK_VOUCHER_SUPPORT" => Some(Self::VoucherInfo),
            "SHOW_HELP" | "HELP_REQUEST" => Some(Self::ShowHelp),
            "WHAT_IF" | "REFINE_SEARCH" => Some(Self::WhatIf),
            "PARAMETER_REFINEMENT" => Some(Self::ParameterRefinement),
            "FOLLOW_UP" => Some(Self::FollowUp),
            "UNCLASSIFIED" | "UNKNOWN" => Some(Self::Unclassified),
            _ => None,
        }
    }

    /// Intents that modify an already executed search.
    pub fn is_refinement(&self) -> bool {
        matches!(self, Self::WhatIf | Self::ParameterRefinement)
    }

    /// Actionable without any extracted parameters.
    pub fn is_standalone(&self) -> bool {
        matches!(self, Self::ShowHelp | Self::CheckViolations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip_for_every_intent() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_tag(intent.tag()), Some(intent));
            assert_eq!(intent.to_string(), intent.tag());
        }
    }

    #[test]
    fn test_legacy_tags_map_to_canonical() {
        assert_eq!(Intent::from_tag("HELP_REQUEST"), Some(Intent::ShowHelp));
        assert_eq!(Intent::from_tag("refine_search"), Some(Intent::WhatIf));
        assert_eq!(Intent::from_tag("ASK_VOUCHER_SUPPORT"), Some(Intent::VoucherInfo));
        assert_eq!(Intent::from_tag("UNKNOWN"), Some(Intent::Unclassified));
        assert_eq!(Intent::from_tag("BOOK_VIEWING"), None);
    }

    #[test]
    fn test_serde_uses_screaming_tags() {
        let json = serde_json::to_string(&Intent::WhatIf).unwrap();
        assert_eq!(json, "\"WHAT_IF\"");
        let back: Intent = serde_json::from_str("\"FOLLOW_UP\"").unwrap();
        assert_eq!(back, Intent::FollowUp);
    }

    #[test]
    fn test_refinement_and_standalone_sets() {
        assert!(Intent::WhatIf.is_refinement());
        assert!(Intent::ParameterRefinement.is_refinement());
        assert!(!Intent::SearchListings.is_refinement());
        assert!(Intent::ShowHelp.is_standalone());
        assert!(Intent::CheckViolations.is_standalone());
        assert!(!Intent::VoucherInfo.is_standalone());
    }
}
