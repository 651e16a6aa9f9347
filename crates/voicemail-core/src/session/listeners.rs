//! Hangup and keypad subscriptions owned by a session

use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::{CallChannel, ChannelListener, ListenerId};

/// Tracks the session's two channel subscriptions. At most one of each is live.
#[derive(Debug, Default)]
pub struct ListenerManager {
    hangup: Option<ListenerId>,
    keypad: Option<ListenerId>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `sink` to hangup and keypad events. A subscription that is
    /// already live is left alone.
    pub fn attach(&mut self, channel: &Arc<dyn CallChannel>, sink: &ChannelListener) {
        if self.hangup.is_some() || self.keypad.is_some() {
            warn!("Listeners already attached; ignoring attach request");
            return;
        }
        self.hangup = Some(channel.add_hangup_listener(sink.clone()));
        self.keypad = Some(channel.add_dtmf_listener(sink.clone()));
        debug!("Attached listeners: hangup={:?}, keypad={:?}", self.hangup, self.keypad);
    }

    /// The transport removes hangup listeners after they fire.
    pub fn hangup_fired(&mut self) {
        self.hangup = None;
    }

    /// Remove whatever is still attached. Safe to call repeatedly.
    pub fn detach_all(&mut self, channel: &Arc<dyn CallChannel>) {
        if let Some(id) = self.hangup.take() {
            channel.remove_listener(id);
        }
        if let Some(id) = self.keypad.take() {
            channel.remove_listener(id);
        }
    }

    pub fn hangup_attached(&self) -> bool {
        self.hangup.is_some()
    }

    pub fn keypad_attached(&self) -> bool {
        self.keypad.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelEventHub;
    use crate::errors::Result;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct HubChannel {
        hub: ChannelEventHub,
    }

    #[async_trait]
    impl CallChannel for HubChannel {
        async fn answer(&self) -> Result<()> {
            Ok(())
        }
        async fn hangup(&self) -> Result<()> {
            Ok(())
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

    #[test]
    fn attach_once_detach_idempotent() {
        let hub_channel = Arc::new(HubChannel::default());
        let channel: Arc<dyn CallChannel> = hub_channel.clone();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut listeners = ListenerManager::new();

        listeners.detach_all(&channel);

        listeners.attach(&channel, &tx);
        listeners.attach(&channel, &tx);
        assert_eq!(hub_channel.hub.hangup_listener_count(), 1);
        assert_eq!(hub_channel.hub.dtmf_listener_count(), 1);
        assert!(listeners.hangup_attached());
        assert!(listeners.keypad_attached());

        listeners.detach_all(&channel);
        listeners.detach_all(&channel);
        assert_eq!(hub_channel.hub.hangup_listener_count(), 0);
        assert_eq!(hub_channel.hub.dtmf_listener_count(), 0);
        assert!(!listeners.keypad_attached());
    }

    #[test]
    fn fired_hangup_is_not_removed_again() {
        let hub_channel = Arc::new(HubChannel::default());
        let channel: Arc<dyn CallChannel> = hub_channel.clone();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut listeners = ListenerManager::new();

        listeners.attach(&channel, &tx);
        hub_channel.hub.emit_hangup();
        listeners.hangup_fired();
        assert!(!listeners.hangup_attached());
        assert!(listeners.keypad_attached());

        listeners.detach_all(&channel);
        assert_eq!(hub_channel.hub.dtmf_listener_count(), 0);
    }
}
