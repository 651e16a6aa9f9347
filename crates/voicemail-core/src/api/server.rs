use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{create_session_with_config, SessionDependencies};
use crate::adapters::CallChannel;
use crate::config::VoicemailConfig;
use crate::errors::Result;
use crate::grammar::FixedGrammarSource;
use crate::session::SessionHandle;
use crate::types::{SessionId, StartEvent};

/// Runs voicemail sessions for many call legs.
///
/// Sessions are dropped from the registry once they reach `done`.
#[derive(Debug, Clone)]
pub struct VoicemailServer {
    deps: SessionDependencies,
    config: VoicemailConfig,
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
}

impl VoicemailServer {
    pub fn new(deps: SessionDependencies, config: VoicemailConfig) -> Self {
        Self {
            deps,
            config,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Like [`VoicemailServer::new`], but the grammar comes from
    /// `config.grammar_path`, falling back to the embedded default.
    pub fn from_config(deps: SessionDependencies, config: VoicemailConfig) -> Self {
        let grammar = Arc::new(FixedGrammarSource::from_config(&config));
        Self::new(deps.with_grammar(grammar), config)
    }

    pub fn config(&self) -> &VoicemailConfig {
        &self.config
    }

    /// Start a session for a new call leg.
    pub fn start_call(
        &self,
        start: StartEvent,
        channel: Arc<dyn CallChannel>,
    ) -> Result<SessionHandle> {
        let handle = create_session_with_config(start, channel, &self.deps, &self.config)?;
        let id = handle.id().clone();
        self.sessions.insert(id.clone(), handle.clone());
        info!("Started voicemail session {} ({} active)", id, self.sessions.len());

        let sessions = self.sessions.clone();
        let mut status = handle.status_receiver();
        tokio::spawn(async move {
            let _ = status.wait_for(|s| s.state.is_terminal()).await;
            sessions.remove(&id);
            debug!("Removed finished voicemail session {}", id);
        });

        Ok(handle)
    }

    pub fn session(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}
