//! The voicemail menu state machine
//!
//! One `VoicemailSession` runs per call leg as its own task. Its event loop
//! takes one input at a time: channel events (hangup, keypad) and completions
//! of the operations it suspended on (answer, auth init, verify, folder submit).
//! Suspending operations run on spawned tasks and report back through the input
//! queue, so keypad input keeps flowing while they are outstanding.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn, Instrument};

use super::deferred::DeferredAction;
use super::events::{SessionEvent, SessionSnapshot, TransitionHistory};
use super::handle::SessionHandle;
use super::hangup::HangupCoordinator;
use super::listeners::ListenerManager;
use crate::adapters::{
    AuthContext, AuthService, CallChannel, ChannelEvent, ChannelListener, MailboxReader,
    ReaderFactory,
};
use crate::config::VoicemailConfig;
use crate::dtmf::{DigitBuffer, DtmfTone, KeypadOutcome};
use crate::errors::{Result, VoicemailError};
use crate::grammar::InputGrammar;
use crate::state_table::{self, Effect, ReaderOp};
use crate::types::{MailboxIdentity, MenuAction, MenuState, SessionId, StartEvent};

/// Inputs queued to a running session besides channel events.
#[derive(Debug)]
pub(crate) enum SessionInput {
    /// An action injected through a [`SessionHandle`]
    Dispatch { action: MenuAction, argument: String },
    /// A suspended operation finished
    Completed(Completion),
}

/// Result of a suspended operation. Action-driven operations carry the state
/// the handler table names for their success continuation.
#[derive(Debug)]
pub(crate) enum Completion {
    Answer(Result<()>),
    AuthInit(Result<MailboxIdentity>),
    Verify {
        result: Result<()>,
        next_state: Option<MenuState>,
    },
    FolderSubmit {
        option: String,
        result: Result<()>,
        next_state: Option<MenuState>,
    },
}

impl Completion {
    /// The state the operation was started from.
    fn issued_in(&self) -> MenuState {
        match self {
            Completion::Answer(_) => MenuState::Init,
            Completion::AuthInit(_) => MenuState::Auth,
            Completion::Verify { .. } => MenuState::WaitingForAuth,
            Completion::FolderSubmit { .. } => MenuState::ChangingFolder,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Completion::Answer(_) => "answer",
            Completion::AuthInit(_) => "auth-init",
            Completion::Verify { .. } => "verify",
            Completion::FolderSubmit { .. } => "folder-submit",
        }
    }
}

pub(crate) struct VoicemailSession {
    id: SessionId,
    start: StartEvent,
    state: MenuState,
    digits: DigitBuffer,
    mailbox_identity: Option<MailboxIdentity>,
    reader: Option<Arc<dyn MailboxReader>>,
    auth_context: Option<Arc<dyn AuthContext>>,
    authenticated: bool,
    hung_up: bool,

    listeners: ListenerManager,
    deferred: DeferredAction,
    hangup: HangupCoordinator,

    channel: Arc<dyn CallChannel>,
    auth_service: Arc<dyn AuthService>,
    reader_factory: Arc<dyn ReaderFactory>,
    grammar: Arc<InputGrammar>,

    /// Handed to the channel on attach, then dropped
    channel_tx: Option<ChannelListener>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    /// Cleared on `done` so nothing new can be suspended
    input_tx: Option<mpsc::UnboundedSender<SessionInput>>,
    input_rx: mpsc::UnboundedReceiver<SessionInput>,
    status_tx: watch::Sender<SessionSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
    history: Arc<Mutex<TransitionHistory>>,
}

impl VoicemailSession {
    /// Build a session for one call leg and start its task.
    pub(crate) fn spawn(
        start: StartEvent,
        channel: Arc<dyn CallChannel>,
        auth_service: Arc<dyn AuthService>,
        reader_factory: Arc<dyn ReaderFactory>,
        grammar: Arc<InputGrammar>,
        config: &VoicemailConfig,
    ) -> SessionHandle {
        let id = SessionId::new();
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionSnapshot::initial());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let history = Arc::new(Mutex::new(TransitionHistory::new(config.history_limit)));

        let handle = SessionHandle::new(
            id.clone(),
            input_tx.clone(),
            status_rx,
            events_tx.clone(),
            history.clone(),
        );

        let span = tracing::info_span!(
            "voicemail_session",
            session_id = %id,
            domain = %start.domain,
            mailbox = %start.mailbox_id,
        );

        let session = VoicemailSession {
            hangup: HangupCoordinator::new(id.clone(), channel.clone()),
            id,
            start,
            state: MenuState::Init,
            digits: DigitBuffer::new(),
            mailbox_identity: None,
            reader: None,
            auth_context: None,
            authenticated: false,
            hung_up: false,
            listeners: ListenerManager::new(),
            deferred: DeferredAction::new(),
            channel,
            auth_service,
            reader_factory,
            grammar,
            channel_tx: Some(channel_tx),
            channel_rx,
            input_tx: Some(input_tx),
            input_rx,
            status_tx,
            events_tx,
            history,
        };

        tokio::spawn(session.run().instrument(span));
        handle
    }

    async fn run(mut self) {
        info!("Starting voicemail session {}", self.id);
        self.enter_init();
        self.publish_snapshot();

        loop {
            tokio::select! {
                // Channel events take priority over completions
                biased;
                Some(event) = self.channel_rx.recv() => self.handle_channel_event(event),
                Some(input) = self.input_rx.recv() => self.handle_input(input),
                else => break,
            }
            self.publish_snapshot();
        }

        debug!("Voicemail session {} event loop ended", self.id);
    }

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Hangup => self.on_hangup(),
            ChannelEvent::Dtmf(tone) => self.on_keypad(tone),
        }
    }

    fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::Dispatch { action, argument } => self.dispatch(action, argument),
            SessionInput::Completed(completion) => self.on_completion(completion),
        }
    }

    // ===== Channel events =====

    fn on_hangup(&mut self) {
        self.listeners.hangup_fired();
        if self.state.is_terminal() {
            debug!("Hangup notification after session ended; ignoring");
            return;
        }
        self.hung_up = true;
        info!("Call hung up in state {}", self.state);
        self.transition_to(MenuState::Done, "hangup");
    }

    fn on_keypad(&mut self, tone: DtmfTone) {
        if self.state.is_terminal() {
            debug!("DTMF '{}' after session ended; ignoring", tone);
            return;
        }

        let grammar = self.grammar.for_state(self.state);
        match self.digits.push(tone, grammar) {
            KeypadOutcome::Dropped => {
                debug!("No grammar for state {}; dropped DTMF '{}'", self.state, tone);
            }
            KeypadOutcome::Buffered => {
                debug!("Buffered DTMF '{}' in state {}", tone, self.state);
            }
            KeypadOutcome::Resolved(resolved) => {
                debug!(
                    "Resolved {} in state {} from {} digit(s)",
                    resolved.action,
                    self.state,
                    resolved.argument.len()
                );
                self.dispatch(resolved.action, resolved.argument);
            }
        }
    }

    // ===== Actions =====

    fn dispatch(&mut self, action: MenuAction, argument: String) {
        if self.state.is_terminal() {
            warn!("Action {} dispatched after session ended; ignoring", action);
            self.emit(SessionEvent::ActionIgnored {
                session_id: self.id.clone(),
                state: self.state,
                action,
            });
            return;
        }

        let Some(transition) = state_table::lookup(self.state, action) else {
            debug!("Action {} is not handled in state {}; ignoring", action, self.state);
            self.emit(SessionEvent::ActionIgnored {
                session_id: self.id.clone(),
                state: self.state,
                action,
            });
            return;
        };

        let next_state = transition.next_state;
        match transition.effect {
            Effect::Defer { until } => {
                info!("Deferring {} until {}", action, until);
                self.deferred.defer(until, action, argument);
                self.emit(SessionEvent::ActionDeferred {
                    session_id: self.id.clone(),
                    action,
                    until,
                });
            }
            Effect::Verify => {
                self.emit_dispatched(action, &argument);
                self.start_verify(argument, next_state);
            }
            Effect::SubmitFolder => {
                self.emit_dispatched(action, &argument);
                self.start_folder_submit(argument, next_state);
            }
            Effect::Reader(op) => {
                self.emit_dispatched(action, &argument);
                let Some(reader) = self.reader.clone() else {
                    error!("No mailbox reader in state {} for {}", self.state, action);
                    return;
                };
                run_reader_op(reader.as_ref(), op);
                if let Some(next) = next_state {
                    self.transition_to(next, &action.to_string());
                }
            }
        }
    }

    fn emit_dispatched(&self, action: MenuAction, argument: &str) {
        self.emit(SessionEvent::ActionDispatched {
            session_id: self.id.clone(),
            state: self.state,
            action,
            argument: argument.to_string(),
        });
    }

    fn start_verify(&mut self, password: String, next_state: Option<MenuState>) {
        let Some(context) = self.auth_context.clone() else {
            self.request_hangup("no auth context to verify against".to_string());
            return;
        };
        self.suspend(async move {
            Completion::Verify {
                result: context.verify(&password).await,
                next_state,
            }
        });
    }

    fn start_folder_submit(&mut self, option: String, next_state: Option<MenuState>) {
        let Some(reader) = self.reader.clone() else {
            self.request_hangup("no mailbox reader to submit folder to".to_string());
            return;
        };
        self.suspend(async move {
            let result = reader.submit_folder(&option).await;
            Completion::FolderSubmit {
                option,
                result,
                next_state,
            }
        });
    }

    // ===== Suspended operation results =====

    fn on_completion(&mut self, completion: Completion) {
        if self.state.is_terminal() {
            info!("{} completed after session ended; ignoring", completion.name());
            return;
        }

        // Fatal failures hang up even when the session has moved on since the
        // operation was issued.
        if let Some(err) = fatal_error(&completion) {
            self.request_hangup(err.to_string());
            return;
        }

        if self.state != completion.issued_in() {
            warn!(
                "Stale {} completion in state {}; ignoring",
                completion.name(),
                self.state
            );
            return;
        }

        match completion {
            Completion::Answer(Ok(())) => {
                info!("Call answered");
                self.transition_to(MenuState::Auth, "answer");
            }
            Completion::Answer(Err(e)) => {
                // The leg was never answered, so there is nothing to hang up.
                error!("Failed to answer call: {}", e);
                self.transition_to(MenuState::Done, "answer-failed");
            }
            Completion::AuthInit(Ok(identity)) => {
                info!("Mailbox resolved to {}", identity);
                self.mailbox_identity = Some(identity);
                self.transition_to(MenuState::WaitingForAuth, "auth-init");
            }
            Completion::Verify {
                result: Ok(()),
                next_state,
            } => self.on_authenticated(next_state),
            Completion::Verify {
                result: Err(_), ..
            } => {
                warn!("Invalid password for mailbox {}", self.start.mailbox_id);
                self.emit(SessionEvent::CredentialRejected {
                    session_id: self.id.clone(),
                });
            }
            Completion::FolderSubmit {
                option,
                result: Ok(()),
                next_state,
            } => {
                info!("Folder option {} committed", option);
                if let Some(next) = next_state {
                    self.transition_to(next, "submit");
                }
            }
            Completion::AuthInit(Err(_)) | Completion::FolderSubmit { .. } => {}
        }
    }

    fn on_authenticated(&mut self, next_state: Option<MenuState>) {
        if self.reader.is_none() {
            let Some(identity) = self.mailbox_identity.as_ref() else {
                self.request_hangup("authenticated without a mailbox identity".to_string());
                return;
            };
            self.reader = Some(self.reader_factory.create_reader(identity, &self.channel));
        }
        self.authenticated = true;
        // Authentication phase is over
        self.auth_context = None;
        info!("Caller authenticated for mailbox {}", self.start.mailbox_id);
        if let Some(next) = next_state {
            self.transition_to(next, "authenticate");
        }
    }

    // ===== Transitions =====

    fn transition_to(&mut self, next: MenuState, trigger: &str) {
        if self.state.is_terminal() {
            warn!("Ignoring transition to {} after session ended", next);
            return;
        }

        let from = self.state;
        self.digits.clear();
        self.state = next;
        self.history.lock().record(from, next, trigger);
        info!("State {} -> {} ({})", from, next, trigger);
        self.emit(SessionEvent::StateChanged {
            session_id: self.id.clone(),
            old_state: from,
            new_state: next,
        });

        self.on_enter(next);

        // Entry may itself have ended the session
        if self.state == next {
            if let Some(pending) = self.deferred.take_for(next) {
                info!("Replaying deferred {} in {}", pending.action, next);
                self.dispatch(pending.action, pending.argument);
            }
        }
    }

    fn on_enter(&mut self, state: MenuState) {
        match state {
            MenuState::Init => self.enter_init(),
            MenuState::Auth => self.enter_auth(),
            MenuState::Done => self.enter_done(),
            MenuState::WaitingForAuth | MenuState::Ready | MenuState::ChangingFolder => {}
        }
    }

    fn enter_init(&mut self) {
        if let Some(sink) = self.channel_tx.take() {
            self.listeners.attach(&self.channel, &sink);
        }
        let channel = self.channel.clone();
        self.suspend(async move { Completion::Answer(channel.answer().await) });
    }

    fn enter_auth(&mut self) {
        let context = self.auth_service.create_context(&self.channel);
        self.auth_context = Some(context.clone());
        let domain = self.start.domain.clone();
        let mailbox_id = self.start.mailbox_id.clone();
        self.suspend(async move { Completion::AuthInit(context.init(&domain, &mailbox_id).await) });
    }

    fn enter_done(&mut self) {
        self.listeners.detach_all(&self.channel);
        self.deferred.clear();
        self.reader = None;
        self.auth_context = None;
        self.input_tx = None;
        info!("Voicemail session {} terminated (hung_up={})", self.id, self.hung_up);
        self.emit(SessionEvent::Terminated {
            session_id: self.id.clone(),
            hung_up: self.hung_up,
        });
    }

    // ===== Helpers =====

    fn request_hangup(&mut self, reason: String) {
        error!("Fatal error in state {}: {}; requesting hangup", self.state, reason);
        self.emit(SessionEvent::HangupRequested {
            session_id: self.id.clone(),
            reason,
        });
        self.hangup.request();
    }

    /// Run `operation` off the event loop and feed its result back as an input.
    fn suspend<F>(&self, operation: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let Some(tx) = self.input_tx.clone() else {
            return;
        };
        tokio::spawn(
            async move {
                let completion = operation.await;
                let _ = tx.send(SessionInput::Completed(completion));
            }
            .in_current_span(),
        );
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn publish_snapshot(&self) {
        self.status_tx.send_replace(SessionSnapshot {
            state: self.state,
            buffered_digits: self.digits.as_str().to_string(),
            hung_up: self.hung_up,
            authenticated: self.authenticated,
            deferred: self.deferred.pending().map(|p| p.action),
        });
    }
}

/// The fatal error carried by `completion`, if any. Wrong passwords and answer
/// failures are not fatal in this sense.
fn fatal_error(completion: &Completion) -> Option<VoicemailError> {
    match completion {
        Completion::AuthInit(Err(e)) => Some(match e {
            VoicemailError::AuthInitFailure(_) => e.clone(),
            other => VoicemailError::auth_init(other.to_string()),
        }),
        Completion::Verify {
            result: Err(VoicemailError::InvalidCredential),
            ..
        } => None,
        Completion::Verify { result: Err(e), .. } => Some(match e {
            VoicemailError::AuthOtherFailure(_) => e.clone(),
            other => VoicemailError::auth_other(other.to_string()),
        }),
        Completion::FolderSubmit {
            option,
            result: Err(e),
            ..
        } => Some(match e {
            VoicemailError::FolderSubmitFailure(msg) => {
                VoicemailError::folder_submit(format!("option {}: {}", option, msg))
            }
            other => VoicemailError::folder_submit(format!("option {}: {}", option, other)),
        }),
        _ => None,
    }
}

fn run_reader_op(reader: &dyn MailboxReader, op: ReaderOp) {
    match op {
        ReaderOp::First => reader.first(),
        ReaderOp::Replay => reader.replay(),
        ReaderOp::Next => reader.next(),
        ReaderOp::Prev => reader.prev(),
        ReaderOp::Delete => reader.delete(),
        ReaderOp::ChangeFolder => reader.change_folder(),
        ReaderOp::PreviousMenu => reader.previous_menu(),
        ReaderOp::RepeatMenu => reader.repeat_menu(),
    }
}
