//! Error types for voicemail sessions
//!
//! Collaborators (transport, auth service, mailbox reader) report failures with
//! this type too; the session classifies them into fatal and recoverable kinds.
//! No fatal error ever escapes a running session: fatal kinds request a hangup
//! and wait for the transport to confirm it.

use thiserror::Error;

/// Main result type for voicemail operations
pub type Result<T> = std::result::Result<T, VoicemailError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoicemailError {
    /// Answer or hangup request rejected by the transport
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Auth context could not be initialized for the mailbox
    #[error("Auth init failure: {0}")]
    AuthInitFailure(String),

    /// Caller entered the wrong password
    #[error("Invalid credential")]
    InvalidCredential,

    /// Verification failed for any reason other than a wrong password
    #[error("Auth failure: {0}")]
    AuthOtherFailure(String),

    /// Mailbox reader could not commit the folder option
    #[error("Folder submit failure: {0}")]
    FolderSubmitFailure(String),

    /// Input grammar could not be loaded or validated
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session task is gone
    #[error("Session closed")]
    SessionClosed,
}

impl VoicemailError {
    pub fn transport(msg: impl Into<String>) -> Self {
        VoicemailError::TransportFailure(msg.into())
    }

    pub fn auth_init(msg: impl Into<String>) -> Self {
        VoicemailError::AuthInitFailure(msg.into())
    }

    pub fn auth_other(msg: impl Into<String>) -> Self {
        VoicemailError::AuthOtherFailure(msg.into())
    }

    pub fn folder_submit(msg: impl Into<String>) -> Self {
        VoicemailError::FolderSubmitFailure(msg.into())
    }

    pub fn grammar(msg: impl Into<String>) -> Self {
        VoicemailError::Grammar(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        VoicemailError::Config(msg.into())
    }

    /// Fatal kinds end the call: the session requests a hangup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VoicemailError::AuthInitFailure(_)
                | VoicemailError::AuthOtherFailure(_)
                | VoicemailError::FolderSubmitFailure(_)
        )
    }

    /// Only a wrong password lets the caller try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VoicemailError::InvalidCredential)
    }
}

impl From<serde_yaml::Error> for VoicemailError {
    fn from(err: serde_yaml::Error) -> Self {
        VoicemailError::Grammar(err.to_string())
    }
}

impl From<toml::de::Error> for VoicemailError {
    fn from(err: toml::de::Error) -> Self {
        VoicemailError::Config(err.to_string())
    }
}

impl From<std::io::Error> for VoicemailError {
    fn from(err: std::io::Error) -> Self {
        VoicemailError::Config(err.to_string())
    }
}
