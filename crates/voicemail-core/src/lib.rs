//! # Voicemail-Core - DTMF Voicemail Menu Sessions for RVoIP
//!
//! Drives the voice menu for a single call leg: answer the call, authenticate
//! the caller against a mailbox, then let the caller browse and manage messages
//! with keypad input until the call ends.
//!
//! Every session is a state machine running on its own task:
//!
//! ```text
//! init --answer--> auth --mailbox found--> waitingForAuth --password ok--> ready
//!                                                                          |   ^
//!                                                     changeFolder (2) ----+   |
//!                                                                          v   |
//!                                                changingFolder --submit/#-----+
//! any state --hangup--> done
//! ```
//!
//! Keypad symbols are buffered per state and resolved against a per-state
//! grammar (see [`grammar`]). The transport, auth service, and mailbox reader
//! are collaborators behind the traits in [`adapters`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use rvoip_voicemail_core::{
//!     AuthService, CallChannel, ReaderFactory, SessionDependencies, StartEvent,
//!     VoicemailConfig, VoicemailServer,
//! };
//!
//! # async fn host(
//! #     auth: Arc<dyn AuthService>,
//! #     readers: Arc<dyn ReaderFactory>,
//! #     channel: Arc<dyn CallChannel>,
//! # ) -> rvoip_voicemail_core::Result<()> {
//! let config = VoicemailConfig::from_file("/etc/voicemail/voicemail.toml")?.with_env_overrides();
//! config.init_logging()?;
//!
//! let server = VoicemailServer::from_config(SessionDependencies::new(auth, readers), config);
//! let session = server.start_call(StartEvent::new("example.com", "1001"), channel)?;
//! session.wait_until_done().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod api;
pub mod channel;
pub mod config;
pub mod dtmf;
pub mod errors;
pub mod grammar;
pub mod logging;
pub mod session;
pub mod state_table;
pub mod types;

pub use adapters::{
    AuthContext, AuthService, CallChannel, ChannelEvent, ChannelListener, ListenerId,
    MailboxReader, ReaderFactory,
};
pub use api::{create_session, create_session_with_config, SessionDependencies, VoicemailServer};
pub use channel::ChannelEventHub;
pub use config::VoicemailConfig;
pub use dtmf::DtmfTone;
pub use errors::{Result, VoicemailError};
pub use session::{SessionEvent, SessionHandle, SessionSnapshot, TransitionRecord};
pub use types::{MailboxIdentity, MenuAction, MenuState, SessionId, StartEvent};
