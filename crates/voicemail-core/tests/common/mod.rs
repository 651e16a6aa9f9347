//! Mock collaborators for driving full voicemail sessions
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use rvoip_voicemail_core::adapters::{
    AuthContext, AuthService, CallChannel, ChannelListener, ListenerId, MailboxReader,
    ReaderFactory,
};
use rvoip_voicemail_core::api::SessionDependencies;
use rvoip_voicemail_core::channel::ChannelEventHub;
use rvoip_voicemail_core::dtmf::DtmfTone;
use rvoip_voicemail_core::errors::{Result, VoicemailError};
use rvoip_voicemail_core::session::SessionHandle;
use rvoip_voicemail_core::types::{MailboxIdentity, MenuState};

pub const DOMAIN: &str = "example.com";
pub const MAILBOX: &str = "1001";
pub const PASSWORD: &str = "1234";

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `future`, panicking after two seconds.
pub async fn within<T>(what: &str, future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
}

pub async fn reach(handle: &SessionHandle, state: MenuState) {
    within(&format!("state {}", state), handle.wait_for_state(state))
        .await
        .expect("session closed");
}

/// Let spawned tasks and the session loop run for a moment.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Gate for holding a suspended operation until the test releases it.
#[derive(Debug, Clone, Default)]
pub struct Gate(Arc<Notify>);

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        self.0.notify_one();
    }

    async fn pass(&self) {
        self.0.notified().await;
    }
}

// ===== Transport =====

pub struct MockChannel {
    pub hub: ChannelEventHub,
    answer_result: Mutex<Result<()>>,
    answer_gate: Option<Gate>,
    hangup_result: Mutex<Result<()>>,
    /// Whether a hangup request makes the transport report the hangup
    notify_on_hangup: bool,
    answers: AtomicUsize,
    hangups: AtomicUsize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            hub: ChannelEventHub::new(),
            answer_result: Mutex::new(Ok(())),
            answer_gate: None,
            hangup_result: Mutex::new(Ok(())),
            notify_on_hangup: true,
            answers: AtomicUsize::new(0),
            hangups: AtomicUsize::new(0),
        }
    }

    pub fn with_answer_gate(mut self, gate: Gate) -> Self {
        self.answer_gate = Some(gate);
        self
    }

    pub fn failing_answer(self) -> Self {
        *self.answer_result.lock() = Err(VoicemailError::transport("no route to callee"));
        self
    }

    pub fn failing_hangup(self) -> Self {
        *self.hangup_result.lock() = Err(VoicemailError::transport("leg already gone"));
        self
    }

    pub fn silent_hangup(mut self) -> Self {
        self.notify_on_hangup = false;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Caller presses `digits` on the keypad.
    pub fn press(&self, digits: &str) {
        for tone in DtmfTone::sequence(digits) {
            self.hub.emit_dtmf(tone);
        }
    }

    /// Far end hangs up.
    pub fn remote_hangup(&self) {
        self.hub.emit_hangup();
    }

    pub fn answer_count(&self) -> usize {
        self.answers.load(Ordering::SeqCst)
    }

    pub fn hangup_count(&self) -> usize {
        self.hangups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallChannel for MockChannel {
    async fn answer(&self) -> Result<()> {
        if let Some(gate) = &self.answer_gate {
            gate.pass().await;
        }
        self.answers.fetch_add(1, Ordering::SeqCst);
        self.answer_result.lock().clone()
    }

    async fn hangup(&self) -> Result<()> {
        self.hangups.fetch_add(1, Ordering::SeqCst);
        let result = self.hangup_result.lock().clone();
        if self.notify_on_hangup {
            self.hub.emit_hangup();
        }
        result
    }

    fn add_hangup_listener(&self, listener: ChannelListener) -> ListenerId {
        self.hub.add_hangup_listener(listener)
    }

    fn add_dtmf_listener(&self, listener: ChannelListener) -> ListenerId {
        self.hub.add_dtmf_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.hub.remove_listener(id)
    }
}

// ===== Auth =====

#[derive(Default)]
pub struct AuthBehaviour {
    pub init_gate: Option<Gate>,
    pub init_failure: Option<VoicemailError>,
    pub verify_gate: Option<Gate>,
    /// Returned instead of checking the password
    pub verify_failure: Option<VoicemailError>,
}

pub struct MockAuthService {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    password: String,
    behaviour: AuthBehaviour,
    contexts: AtomicUsize,
    init_calls: Mutex<Vec<(String, String)>>,
    attempts: Mutex<Vec<String>>,
}

impl MockAuthService {
    pub fn new(password: &str) -> Self {
        Self::with_behaviour(password, AuthBehaviour::default())
    }

    pub fn with_behaviour(password: &str, behaviour: AuthBehaviour) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                password: password.to_string(),
                behaviour,
                contexts: AtomicUsize::new(0),
                init_calls: Mutex::new(Vec::new()),
                attempts: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn contexts_created(&self) -> usize {
        self.inner.contexts.load(Ordering::SeqCst)
    }

    pub fn init_calls(&self) -> Vec<(String, String)> {
        self.inner.init_calls.lock().clone()
    }

    /// Passwords passed to `verify`, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.inner.attempts.lock().clone()
    }
}

impl AuthService for MockAuthService {
    fn create_context(&self, _channel: &Arc<dyn CallChannel>) -> Arc<dyn AuthContext> {
        self.inner.contexts.fetch_add(1, Ordering::SeqCst);
        Arc::new(MockAuthContext {
            inner: self.inner.clone(),
        })
    }
}

struct MockAuthContext {
    inner: Arc<AuthInner>,
}

#[async_trait]
impl AuthContext for MockAuthContext {
    async fn init(&self, domain: &str, mailbox_id: &str) -> Result<MailboxIdentity> {
        if let Some(gate) = &self.inner.behaviour.init_gate {
            gate.pass().await;
        }
        self.inner
            .init_calls
            .lock()
            .push((domain.to_string(), mailbox_id.to_string()));
        match &self.inner.behaviour.init_failure {
            Some(err) => Err(err.clone()),
            None => Ok(MailboxIdentity::new(format!("{}@{}", mailbox_id, domain))),
        }
    }

    async fn verify(&self, password: &str) -> Result<()> {
        if let Some(gate) = &self.inner.behaviour.verify_gate {
            gate.pass().await;
        }
        self.inner.attempts.lock().push(password.to_string());
        if let Some(err) = &self.inner.behaviour.verify_failure {
            return Err(err.clone());
        }
        if password == self.inner.password {
            Ok(())
        } else {
            Err(VoicemailError::InvalidCredential)
        }
    }
}

// ===== Mailbox reader =====

#[derive(Default)]
pub struct MockReaderFactory {
    readers: AtomicUsize,
    identities: Mutex<Vec<MailboxIdentity>>,
    ops: Arc<Mutex<Vec<String>>>,
    submit_failure: Option<VoicemailError>,
    submit_gate: Option<Gate>,
}

impl MockReaderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_submit(mut self) -> Self {
        self.submit_failure = Some(VoicemailError::folder_submit("folder store offline"));
        self
    }

    pub fn with_submit_gate(mut self, gate: Gate) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn readers_created(&self) -> usize {
        self.readers.load(Ordering::SeqCst)
    }

    pub fn identities(&self) -> Vec<MailboxIdentity> {
        self.identities.lock().clone()
    }

    /// Reader operations in call order, e.g. `first`, `submitFolder:3`.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

impl ReaderFactory for MockReaderFactory {
    fn create_reader(
        &self,
        identity: &MailboxIdentity,
        _channel: &Arc<dyn CallChannel>,
    ) -> Arc<dyn MailboxReader> {
        self.readers.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().push(identity.clone());
        Arc::new(MockReader {
            ops: self.ops.clone(),
            submit_failure: self.submit_failure.clone(),
            submit_gate: self.submit_gate.clone(),
        })
    }
}

struct MockReader {
    ops: Arc<Mutex<Vec<String>>>,
    submit_failure: Option<VoicemailError>,
    submit_gate: Option<Gate>,
}

impl MockReader {
    fn record(&self, op: &str) {
        self.ops.lock().push(op.to_string());
    }
}

#[async_trait]
impl MailboxReader for MockReader {
    fn first(&self) {
        self.record("first");
    }

    fn replay(&self) {
        self.record("replay");
    }

    fn next(&self) {
        self.record("next");
    }

    fn prev(&self) {
        self.record("prev");
    }

    fn delete(&self) {
        self.record("delete");
    }

    fn change_folder(&self) {
        self.record("changeFolder");
    }

    fn previous_menu(&self) {
        self.record("previousMenu");
    }

    fn repeat_menu(&self) {
        self.record("repeatMenu");
    }

    async fn submit_folder(&self, option: &str) -> Result<()> {
        if let Some(gate) = &self.submit_gate {
            gate.pass().await;
        }
        self.record(&format!("submitFolder:{}", option));
        match &self.submit_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ===== Wiring =====

pub struct Harness {
    pub channel: Arc<MockChannel>,
    pub auth: Arc<MockAuthService>,
    pub readers: Arc<MockReaderFactory>,
}

impl Harness {
    pub fn new(channel: MockChannel, auth: MockAuthService, readers: MockReaderFactory) -> Self {
        Self {
            channel: channel.into_arc(),
            auth: Arc::new(auth),
            readers: Arc::new(readers),
        }
    }

    pub fn standard() -> Self {
        Self::new(
            MockChannel::new(),
            MockAuthService::new(PASSWORD),
            MockReaderFactory::new(),
        )
    }

    pub fn deps(&self) -> SessionDependencies {
        SessionDependencies::new(self.auth.clone(), self.readers.clone())
    }

    pub fn channel(&self) -> Arc<dyn CallChannel> {
        self.channel.clone()
    }
}
