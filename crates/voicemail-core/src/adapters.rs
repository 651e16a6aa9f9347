//! Contracts for the collaborators a voicemail session drives
//!
//! The session never looks inside these services: the transport answers and
//! hangs up the call leg and delivers call events, the auth service resolves and
//! verifies the mailbox, and the mailbox reader plays, moves between, and
//! deletes messages.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dtmf::DtmfTone;
use crate::errors::Result;
use crate::types::MailboxIdentity;

/// Handle identifying one registered listener on a call channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Call-level events delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The far end hung up, or a requested hangup completed
    Hangup,
    /// A keypad tone was received
    Dtmf(DtmfTone),
}

/// Where a channel delivers events for one listener.
pub type ChannelListener = mpsc::UnboundedSender<ChannelEvent>;

/// Transport for a single call leg.
///
/// Hangup listeners fire at most once and are removed by the transport after
/// firing. DTMF listeners stay registered until removed.
#[async_trait]
pub trait CallChannel: Send + Sync {
    async fn answer(&self) -> Result<()>;

    async fn hangup(&self) -> Result<()>;

    fn add_hangup_listener(&self, listener: ChannelListener) -> ListenerId;

    fn add_dtmf_listener(&self, listener: ChannelListener) -> ListenerId;

    /// Removing an unknown or already-removed listener is a no-op.
    fn remove_listener(&self, id: ListenerId);
}

/// Creates per-call auth contexts.
pub trait AuthService: Send + Sync {
    fn create_context(&self, channel: &Arc<dyn CallChannel>) -> Arc<dyn AuthContext>;
}

/// Authentication state for one call.
#[async_trait]
pub trait AuthContext: Send + Sync {
    /// Look up the mailbox. Any error is fatal to the session.
    async fn init(&self, domain: &str, mailbox_id: &str) -> Result<MailboxIdentity>;

    /// Check the password. `VoicemailError::InvalidCredential` lets the caller
    /// retry; any other error is fatal.
    async fn verify(&self, password: &str) -> Result<()>;
}

/// Creates the mailbox reader once the caller is authenticated.
pub trait ReaderFactory: Send + Sync {
    fn create_reader(
        &self,
        identity: &MailboxIdentity,
        channel: &Arc<dyn CallChannel>,
    ) -> Arc<dyn MailboxReader>;
}

/// Mailbox browsing operations.
#[async_trait]
pub trait MailboxReader: Send + Sync {
    fn first(&self);

    fn replay(&self);

    fn next(&self);

    fn prev(&self);

    fn delete(&self);

    fn change_folder(&self);

    fn previous_menu(&self);

    fn repeat_menu(&self);

    /// Commit a folder choice made in the folder menu.
    async fn submit_folder(&self, option: &str) -> Result<()>;
}
