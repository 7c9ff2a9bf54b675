//! Two-tier intent router for a housing-voucher search assistant.
//!
//! Pattern tier (catalog, classifier, extractor) first, generative fallback
//! second. Conversation state lives in a caller-owned `SearchContext`.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod intent;
pub mod language;
pub mod llm_client;
pub mod narration;
pub mod params;
pub mod prompts;
pub mod router;
pub mod session;
pub mod what_if;

pub use catalog::{ParameterSpec, PatternCatalog, PatternGroup, PatternMatch};
pub use classifier::{classify, classify_detailed, is_context_shorthand, ClassificationResult};
pub use config::{ConfigSource, RouterConfig};
pub use context::{ChangeType, ParameterChange, SearchContext, SearchRecord};
pub use error::RouterError;
pub use extractor::extract_parameters;
pub use fallback::{FallbackConfig, FallbackDecision, FallbackRouter};
pub use intent::Intent;
pub use language::{detect_languages, detect_ui_language, Language};
pub use llm_client::{FakeTextGenerator, HttpTextGenerator, LlmConfig, LlmError, TextGenerator};
pub use params::{Borough, ParamKey, ParamValue, SearchParams, VoucherType};
pub use router::{RouterResponse, RouterUsed, TwoTierRouter};
pub use session::{Session, TurnOutcome};
pub use what_if::{plan_refinement, RefinementOutcome};
