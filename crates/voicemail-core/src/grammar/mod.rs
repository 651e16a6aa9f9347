pub mod types;
pub mod yaml_loader;

pub use types::{InputGrammar, PatternRule, StateGrammar};
pub use yaml_loader::{YamlGrammarLoader, DEFAULT_GRAMMAR_YAML};

use lazy_static::lazy_static;
use std::path::Path;
use std::sync::Arc;

use crate::config::VoicemailConfig;
use crate::errors::Result;

lazy_static! {
    /// Grammar built from the embedded default YAML
    pub static ref DEFAULT_GRAMMAR: Arc<InputGrammar> = Arc::new(
        YamlGrammarLoader::load_embedded_default()
            .expect("Embedded default grammar must be valid")
    );
}

/// Supplies the per-state input grammar to new sessions.
pub trait GrammarSource: Send + Sync {
    fn input_grammar(&self) -> Result<Arc<InputGrammar>>;
}

/// Always hands out the embedded default grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGrammarSource;

impl GrammarSource for DefaultGrammarSource {
    fn input_grammar(&self) -> Result<Arc<InputGrammar>> {
        Ok(DEFAULT_GRAMMAR.clone())
    }
}

/// Hands out a grammar fixed at construction time.
#[derive(Debug, Clone)]
pub struct FixedGrammarSource {
    grammar: Arc<InputGrammar>,
}

impl FixedGrammarSource {
    pub fn new(grammar: InputGrammar) -> Self {
        Self {
            grammar: Arc::new(grammar),
        }
    }

    pub fn from_shared(grammar: Arc<InputGrammar>) -> Self {
        Self { grammar }
    }

    /// Use the grammar file named by `config`, or the embedded default.
    pub fn from_config(config: &VoicemailConfig) -> Self {
        Self::from_shared(load_grammar_or_default(config.grammar_path.as_deref()))
    }
}

impl GrammarSource for FixedGrammarSource {
    fn input_grammar(&self) -> Result<Arc<InputGrammar>> {
        Ok(self.grammar.clone())
    }
}

/// Load a grammar file, falling back to the embedded default when no path is
/// given or the file cannot be loaded.
pub fn load_grammar_or_default(path: Option<&Path>) -> Arc<InputGrammar> {
    let Some(path) = path else {
        tracing::debug!("Using embedded default grammar");
        return DEFAULT_GRAMMAR.clone();
    };

    tracing::info!("Loading custom grammar from: {}", path.display());
    match YamlGrammarLoader::load_from_file(path) {
        Ok(grammar) => Arc::new(grammar),
        Err(e) => {
            tracing::warn!(
                "Failed to load custom grammar from {}, falling back to default: {}",
                path.display(),
                e
            );
            DEFAULT_GRAMMAR.clone()
        }
    }
}
