use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

use super::events::{SessionEvent, SessionSnapshot, TransitionHistory, TransitionRecord};
use super::machine::SessionInput;
use crate::errors::{Result, VoicemailError};
use crate::types::{MenuAction, MenuState, SessionId};

/// Cloneable handle to a running voicemail session.
///
/// The session task stays alive while any handle exists, so actions dispatched
/// after the call ended are still accepted (and ignored by the session).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    input_tx: mpsc::UnboundedSender<SessionInput>,
    status_rx: watch::Receiver<SessionSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
    history: Arc<Mutex<TransitionHistory>>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        input_tx: mpsc::UnboundedSender<SessionInput>,
        status_rx: watch::Receiver<SessionSnapshot>,
        events_tx: broadcast::Sender<SessionEvent>,
        history: Arc<Mutex<TransitionHistory>>,
    ) -> Self {
        Self {
            id,
            input_tx,
            status_rx,
            events_tx,
            history,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// State as of the last fully processed input.
    pub fn state(&self) -> MenuState {
        self.status_rx.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.status_rx.borrow().clone()
    }

    pub(crate) fn status_receiver(&self) -> watch::Receiver<SessionSnapshot> {
        self.status_rx.clone()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Hand `action` to the session as if the resolver had produced it.
    pub fn dispatch(&self, action: MenuAction, argument: impl Into<String>) -> Result<()> {
        self.input_tx
            .send(SessionInput::Dispatch {
                action,
                argument: argument.into(),
            })
            .map_err(|_| VoicemailError::SessionClosed)
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.lock().records()
    }

    /// States visited so far, in order.
    pub fn path(&self) -> Vec<MenuState> {
        self.history.lock().path()
    }

    /// Wait until the session rests in `state`.
    pub async fn wait_for_state(&self, state: MenuState) -> Result<()> {
        let mut rx = self.status_rx.clone();
        rx.wait_for(|snapshot| snapshot.state == state)
            .await
            .map(|_| ())
            .map_err(|_| VoicemailError::SessionClosed)
    }

    pub async fn wait_until_done(&self) -> Result<()> {
        self.wait_for_state(MenuState::Done).await
    }
}
