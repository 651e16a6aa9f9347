//! Voicemail menu sessions
//!
//! [`machine`] holds the state machine; the other modules are the pieces it
//! drives: channel subscriptions, the deferred-action slot, and best-effort
//! hangup requests.

pub mod deferred;
pub mod events;
pub mod handle;
pub mod hangup;
pub mod listeners;
pub(crate) mod machine;

pub use deferred::{DeferredAction, PendingAction};
pub use events::{SessionEvent, SessionSnapshot, TransitionHistory, TransitionRecord};
pub use handle::SessionHandle;
pub use hangup::HangupCoordinator;
pub use listeners::ListenerManager;
