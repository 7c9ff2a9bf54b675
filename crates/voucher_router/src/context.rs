//! Conversation search context and the change analyzer.
//!
//! A `SearchContext` belongs to one conversation. The caller creates it,
//! passes it into every routing call and drops it when the conversation
//! ends. Routers never hold one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::params::{ParamKey, ParamValue, SearchParams};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Key was not in the current search
    New,
    /// Same value as the current search
    Redundant,
    /// Different value from the current search
    Refinement,
    /// Same borough, but searching it again is legitimate
    RetryAllowed,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Redundant => "redundant",
            Self::Refinement => "refinement",
            Self::RetryAllowed => "retry_allowed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterChange {
    pub key: ParamKey,
    pub old_value: Option<ParamValue>,
    pub new_value: ParamValue,
    pub change_type: ChangeType,
}

impl ParameterChange {
    /// Changes that alter what a re-run search would return.
    pub fn is_effective(&self) -> bool {
        self.change_type != ChangeType::Redundant
    }
}

/// A search that was replaced by a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub params: SearchParams,
    pub result_count: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    current_params: SearchParams,
    history: VecDeque<SearchRecord>,
    /// Result count of the search run with `current_params`; `None` until
    /// the listing collaborator reports it
    last_result_count: Option<u32>,
    history_limit: usize,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchContext {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            current_params: SearchParams::new(),
            history: VecDeque::new(),
            last_result_count: None,
            history_limit: limit.max(1),
        }
    }

    pub fn current_params(&self) -> &SearchParams {
        &self.current_params
    }

    pub fn history(&self) -> impl Iterator<Item = &SearchRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_result_count(&self) -> Option<u32> {
        self.last_result_count
    }

    /// At least one search parameter has been accepted.
    pub fn is_established(&self) -> bool {
        !self.current_params.is_empty()
    }

    /// Classify every key of `new_params` against the current search.
    pub fn analyze(&self, new_params: &SearchParams) -> Vec<ParameterChange> {
        new_params
            .iter()
            .map(|new_value| {
                let key = new_value.key();
                let old_value = self.current_params.get(key);
                let change_type = match old_value {
                    None => ChangeType::New,
                    Some(old) if old != new_value => ChangeType::Refinement,
                    Some(_) if key == ParamKey::Borough && self.allows_borough_retry() => {
                        ChangeType::RetryAllowed
                    }
                    Some(_) => ChangeType::Redundant,
                };
                ParameterChange {
                    key,
                    old_value,
                    new_value,
                    change_type,
                }
            })
            .collect()
    }

    /// The same borough may be searched again when the last search found
    /// nothing, or when the other criteria moved since the previous search.
    pub fn allows_borough_retry(&self) -> bool {
        if self.last_result_count == Some(0) {
            return true;
        }
        match self.history.back() {
            Some(previous) => {
                previous.params.without(ParamKey::Borough)
                    != self.current_params.without(ParamKey::Borough)
            }
            None => false,
        }
    }

    /// Archive the current search and merge `new_params` into it.
    pub fn commit(&mut self, new_params: &SearchParams) {
        if new_params.is_empty() {
            return;
        }
        if self.is_established() {
            self.history.push_back(SearchRecord {
                params: self.current_params.clone(),
                result_count: self.last_result_count,
                recorded_at: Utc::now(),
            });
            while self.history.len() > self.history_limit {
                self.history.pop_front();
            }
        }
        self.current_params.merge(new_params);
        self.last_result_count = None;
        debug!(
            params = self.current_params.len(),
            history = self.history.len(),
            "search context updated"
        );
    }

    /// Called by the listing search once results for `current_params` are in.
    pub fn record_result_count(&mut self, count: u32) {
        self.last_result_count = Some(count);
    }

    /// Context string handed to the generative tier.
    pub fn to_prompt_context(&self) -> Option<String> {
        if !self.is_established() {
            return None;
        }
        serde_json::to_string(&self.current_params)
            .ok()
            .map(|json| format!("Previous search: {}", json))
    }

    pub fn clear(&mut self) {
        self.current_params = SearchParams::new();
        self.history.clear();
        self.last_result_count = None;
    }
}
