use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{Result, VoicemailError};
use crate::types::{MenuAction, MenuState};

/// A pattern rule: when the whole buffer matches `pattern`, resolve to `action`.
///
/// Patterns are always compiled anchored (`^(?:pattern)$`), so a buffer that
/// merely contains a match does not resolve.
#[derive(Debug, Clone)]
pub struct PatternRule {
    source: String,
    regex: Regex,
    pub action: MenuAction,
}

impl PatternRule {
    pub fn new(pattern: &str, action: MenuAction) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| VoicemailError::grammar(format!("invalid pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            action,
        })
    }

    /// The pattern as written in the grammar, without anchors.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, buffer: &str) -> bool {
        self.regex.is_match(buffer)
    }
}

/// Grammar for a single state: an optional pattern rule plus literal mappings.
#[derive(Debug, Clone, Default)]
pub struct StateGrammar {
    pub pattern: Option<PatternRule>,
    pub literals: HashMap<String, MenuAction>,
}

impl StateGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: &str, action: MenuAction) -> Result<Self> {
        self.pattern = Some(PatternRule::new(pattern, action)?);
        Ok(self)
    }

    pub fn with_literal(mut self, input: impl Into<String>, action: MenuAction) -> Self {
        self.literals.insert(input.into(), action);
        self
    }

    /// Resolve the buffered input. The pattern rule wins over literal mappings.
    pub fn resolve(&self, buffer: &str) -> Option<MenuAction> {
        if let Some(rule) = &self.pattern {
            if rule.matches(buffer) {
                return Some(rule.action);
            }
        }
        self.literals.get(buffer).copied()
    }
}

/// Per-state input grammar. States without an entry drop keypad input.
#[derive(Debug, Clone, Default)]
pub struct InputGrammar {
    states: HashMap<MenuState, StateGrammar>,
}

impl InputGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: MenuState, grammar: StateGrammar) -> Self {
        self.states.insert(state, grammar);
        self
    }

    pub fn insert(&mut self, state: MenuState, grammar: StateGrammar) {
        self.states.insert(state, grammar);
    }

    pub fn for_state(&self, state: MenuState) -> Option<&StateGrammar> {
        self.states.get(&state)
    }

    pub fn states(&self) -> impl Iterator<Item = &MenuState> {
        self.states.keys()
    }
}

// ===== On-disk representation =====

/// Grammar file as deserialized from YAML, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarFile {
    #[serde(default)]
    pub states: HashMap<String, RawStateGrammar>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStateGrammar {
    #[serde(default)]
    pub pattern: Option<RawPatternRule>,
    #[serde(default)]
    pub literals: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPatternRule {
    #[serde(rename = "match")]
    pub matches: String,
    pub action: String,
}
