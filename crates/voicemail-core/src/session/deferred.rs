use tracing::debug;

use crate::types::{MenuAction, MenuState};

/// An action waiting for its target state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub until: MenuState,
    pub action: MenuAction,
    pub argument: String,
}

/// Single-slot holder for one deferred action.
///
/// A newer deferral replaces the held one: only the latest input the caller
/// typed before the target state is replayed.
#[derive(Debug, Default)]
pub struct DeferredAction {
    slot: Option<PendingAction>,
}

impl DeferredAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `action` until `until` is entered. Returns the action it displaced.
    pub fn defer(
        &mut self,
        until: MenuState,
        action: MenuAction,
        argument: String,
    ) -> Option<PendingAction> {
        let displaced = self.slot.replace(PendingAction {
            until,
            action,
            argument,
        });
        if let Some(old) = &displaced {
            debug!("Deferred {} replaces pending {}", action, old.action);
        }
        displaced
    }

    /// Take the held action if it was waiting for `state`.
    pub fn take_for(&mut self, state: MenuState) -> Option<PendingAction> {
        match &self.slot {
            Some(pending) if pending.until == state => self.slot.take(),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_idle(&self) -> bool {
        self.slot.is_none()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.slot.as_ref()
    }
}
