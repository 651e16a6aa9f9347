//! Entry points for starting voicemail sessions
//!
//! [`create_session`] starts one session for one call leg. [`VoicemailServer`]
//! does the same for many legs and keeps track of the ones still running.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rvoip_voicemail_core::api::*;
//! # use rvoip_voicemail_core::adapters::*;
//! # use rvoip_voicemail_core::types::StartEvent;
//! # async fn example(
//! #     auth: Arc<dyn AuthService>,
//! #     readers: Arc<dyn ReaderFactory>,
//! #     channel: Arc<dyn CallChannel>,
//! # ) -> rvoip_voicemail_core::errors::Result<()> {
//! let deps = SessionDependencies::new(auth, readers);
//! let session = create_session(StartEvent::new("example.com", "1001"), channel, &deps)?;
//! session.wait_until_done().await?;
//! # Ok(())
//! # }
//! ```

pub mod server;

pub use server::VoicemailServer;

use std::sync::Arc;

use crate::adapters::{AuthService, CallChannel, ReaderFactory};
use crate::config::VoicemailConfig;
use crate::errors::Result;
use crate::grammar::{DefaultGrammarSource, GrammarSource};
use crate::session::machine::VoicemailSession;
use crate::session::SessionHandle;
use crate::types::StartEvent;

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionDependencies {
    pub auth: Arc<dyn AuthService>,
    pub readers: Arc<dyn ReaderFactory>,
    pub grammar: Arc<dyn GrammarSource>,
}

impl SessionDependencies {
    /// Dependencies using the embedded default grammar.
    pub fn new(auth: Arc<dyn AuthService>, readers: Arc<dyn ReaderFactory>) -> Self {
        Self {
            auth,
            readers,
            grammar: Arc::new(DefaultGrammarSource),
        }
    }

    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarSource>) -> Self {
        self.grammar = grammar;
        self
    }
}

impl std::fmt::Debug for SessionDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDependencies").finish_non_exhaustive()
    }
}

/// Start a session for one call leg with default settings.
///
/// The session answers the call right away. Must be called from within a
/// tokio runtime.
pub fn create_session(
    start: StartEvent,
    channel: Arc<dyn CallChannel>,
    deps: &SessionDependencies,
) -> Result<SessionHandle> {
    create_session_with_config(start, channel, deps, &VoicemailConfig::default())
}

pub fn create_session_with_config(
    start: StartEvent,
    channel: Arc<dyn CallChannel>,
    deps: &SessionDependencies,
    config: &VoicemailConfig,
) -> Result<SessionHandle> {
    let grammar = deps.grammar.input_grammar()?;
    Ok(VoicemailSession::spawn(
        start,
        channel,
        deps.auth.clone(),
        deps.readers.clone(),
        grammar,
        config,
    ))
}
