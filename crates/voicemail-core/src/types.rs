//! Core types for voicemail-core
//!
//! Identifiers, the menu state enumeration, the action vocabulary shared by the
//! grammar and the state table, and the start event that opens a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Session ID type
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("vm-{}", uuid::Uuid::new_v4()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Menu states of a voicemail session.
///
/// `Init -> Auth -> WaitingForAuth -> Ready <-> ChangingFolder`, with `Done`
/// reachable from every other state. `Done` is terminal.
///
/// The string form (used as grammar keys and in logs) is camelCase, e.g.
/// `waitingForAuth`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MenuState {
    /// Attaching listeners and answering the call
    Init,
    /// Initializing the auth context for the caller's mailbox
    Auth,
    /// Collecting the caller's password
    WaitingForAuth,
    /// Browsing messages
    Ready,
    /// Selecting a folder
    ChangingFolder,
    /// Call ended
    Done,
}

impl MenuState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MenuState::Done)
    }
}

/// Named actions a grammar can resolve to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MenuAction {
    Authenticate,
    First,
    Replay,
    Next,
    Prev,
    Delete,
    ChangeFolder,
    Submit,
    PreviousMenu,
    RepeatMenu,
}

/// Opaque mailbox identity returned by the auth service once the mailbox is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MailboxIdentity(pub String);

impl MailboxIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MailboxIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The call-start event that opens a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    /// Voicemail domain (context) the mailbox lives in
    pub domain: String,
    /// Mailbox number the caller is trying to reach
    pub mailbox_id: String,
}

impl StartEvent {
    pub fn new(domain: impl Into<String>, mailbox_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            mailbox_id: mailbox_id.into(),
        }
    }
}
