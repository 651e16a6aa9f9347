//! YAML grammar loader
//!
//! Parses the on-disk grammar format and validates every state and action name
//! against the enums the state machine knows about.

use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::types::{GrammarFile, InputGrammar, RawStateGrammar, StateGrammar};
use crate::errors::{Result, VoicemailError};
use crate::types::{MenuAction, MenuState};

/// Grammar compiled into the crate.
pub const DEFAULT_GRAMMAR_YAML: &str = include_str!("default_grammar.yaml");

pub struct YamlGrammarLoader;

impl YamlGrammarLoader {
    pub fn load_from_str(yaml: &str) -> Result<InputGrammar> {
        let file: GrammarFile = serde_yaml::from_str(yaml)?;
        Self::compile(file)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<InputGrammar> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            VoicemailError::grammar(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::load_from_str(&yaml)
    }

    pub fn load_embedded_default() -> Result<InputGrammar> {
        Self::load_from_str(DEFAULT_GRAMMAR_YAML)
    }

    fn compile(file: GrammarFile) -> Result<InputGrammar> {
        let mut grammar = InputGrammar::new();
        for (state_name, raw) in file.states {
            let state = MenuState::from_str(&state_name)
                .map_err(|_| VoicemailError::grammar(format!("unknown state '{}'", state_name)))?;
            let compiled = Self::compile_state(&state_name, raw)?;
            debug!(
                "Compiled grammar for {}: pattern={:?}, {} literal(s)",
                state,
                compiled.pattern.as_ref().map(|p| p.source()),
                compiled.literals.len()
            );
            grammar.insert(state, compiled);
        }
        Ok(grammar)
    }

    fn compile_state(state_name: &str, raw: RawStateGrammar) -> Result<StateGrammar> {
        let mut compiled = StateGrammar::new();
        if let Some(rule) = raw.pattern {
            let action = parse_action(state_name, &rule.action)?;
            compiled = compiled.with_pattern(&rule.matches, action)?;
        }
        for (input, action_name) in raw.literals {
            if input.is_empty() {
                return Err(VoicemailError::grammar(format!(
                    "empty literal in state '{}'",
                    state_name
                )));
            }
            let action = parse_action(state_name, &action_name)?;
            compiled = compiled.with_literal(input, action);
        }
        Ok(compiled)
    }
}

fn parse_action(state_name: &str, name: &str) -> Result<MenuAction> {
    MenuAction::from_str(name).map_err(|_| {
        VoicemailError::grammar(format!(
            "unknown action '{}' in state '{}'",
            name, state_name
        ))
    })
}
