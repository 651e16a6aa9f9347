use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{warn, Instrument};

use crate::adapters::CallChannel;
use crate::types::SessionId;

/// Best-effort hangup requests on fatal error paths.
///
/// Never retries and never changes session state: the session only terminates
/// when the transport's hangup notification arrives.
pub struct HangupCoordinator {
    session_id: SessionId,
    channel: Arc<dyn CallChannel>,
}

impl HangupCoordinator {
    pub fn new(session_id: SessionId, channel: Arc<dyn CallChannel>) -> Self {
        Self {
            session_id,
            channel,
        }
    }

    pub fn request(&self) -> JoinHandle<()> {
        let channel = self.channel.clone();
        let session_id = self.session_id.clone();
        tokio::spawn(
            async move {
                if let Err(e) = channel.hangup().await {
                    warn!("Hangup request for session {} failed: {}", session_id, e);
                }
            }
            .in_current_span(),
        )
    }
}
