//! Session events, snapshots, and transition history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::{MenuAction, MenuState, SessionId};

/// Events published on a session's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    StateChanged {
        session_id: SessionId,
        old_state: MenuState,
        new_state: MenuState,
    },

    /// A handler ran for `action` in `state`
    ActionDispatched {
        session_id: SessionId,
        state: MenuState,
        action: MenuAction,
        argument: String,
    },

    /// `action` was parked until `until` is entered
    ActionDeferred {
        session_id: SessionId,
        action: MenuAction,
        until: MenuState,
    },

    /// `action` has no handler in `state`, or the session is done
    ActionIgnored {
        session_id: SessionId,
        state: MenuState,
        action: MenuAction,
    },

    /// Wrong password; the caller may try again
    CredentialRejected { session_id: SessionId },

    /// A fatal error asked the transport to hang up
    HangupRequested { session_id: SessionId, reason: String },

    /// The session reached `done`
    Terminated { session_id: SessionId, hung_up: bool },
}

/// Point-in-time view of a session, refreshed after every processed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: MenuState,
    pub buffered_digits: String,
    pub hung_up: bool,
    pub authenticated: bool,
    pub deferred: Option<MenuAction>,
}

impl SessionSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            state: MenuState::Init,
            buffered_digits: String::new(),
            hung_up: false,
            authenticated: false,
            deferred: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub sequence: u64,
    pub from: MenuState,
    pub to: MenuState,
    /// What caused the transition, e.g. `answer`, `authenticate`, `hangup`
    pub trigger: String,
    pub at: DateTime<Utc>,
}

/// Bounded ring of the most recent transitions.
#[derive(Debug, Clone)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
    total: u64,
}

impl TransitionHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(64)),
            limit,
            total: 0,
        }
    }

    pub fn record(&mut self, from: MenuState, to: MenuState, trigger: impl Into<String>) {
        if self.limit == 0 {
            self.total += 1;
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            sequence: self.total,
            from,
            to,
            trigger: trigger.into(),
            at: Utc::now(),
        });
        self.total += 1;
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn total_transitions(&self) -> u64 {
        self.total
    }

    /// States visited in order, starting from the first recorded `from`.
    pub fn path(&self) -> Vec<MenuState> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from);
        }
        path.extend(self.records.iter().map(|r| r.to));
        path
    }
}
