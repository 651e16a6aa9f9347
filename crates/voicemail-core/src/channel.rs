//! Listener registry for call transports
//!
//! Transports embed a [`ChannelEventHub`] to implement the listener half of
//! [`CallChannel`](crate::adapters::CallChannel): registration hands out
//! [`ListenerId`]s, hangup listeners are consumed by the first hangup, and DTMF
//! listeners stay until removed.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

use crate::adapters::{ChannelEvent, ChannelListener, ListenerId};
use crate::dtmf::DtmfTone;

#[derive(Debug, Default)]
pub struct ChannelEventHub {
    next_id: AtomicU64,
    hangup_listeners: DashMap<ListenerId, ChannelListener>,
    dtmf_listeners: DashMap<ListenerId, ChannelListener>,
}

impl ChannelEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn add_hangup_listener(&self, listener: ChannelListener) -> ListenerId {
        let id = self.allocate_id();
        self.hangup_listeners.insert(id, listener);
        debug!("Registered hangup listener {:?}", id);
        id
    }

    pub fn add_dtmf_listener(&self, listener: ChannelListener) -> ListenerId {
        let id = self.allocate_id();
        self.dtmf_listeners.insert(id, listener);
        debug!("Registered DTMF listener {:?}", id);
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        let removed = self.hangup_listeners.remove(&id).is_some()
            || self.dtmf_listeners.remove(&id).is_some();
        if removed {
            debug!("Removed listener {:?}", id);
        }
    }

    /// Notify and unregister every hangup listener. Returns how many were notified.
    pub fn emit_hangup(&self) -> usize {
        let ids: Vec<ListenerId> = self.hangup_listeners.iter().map(|e| *e.key()).collect();
        let mut delivered = 0;
        for id in ids {
            if let Some((_, listener)) = self.hangup_listeners.remove(&id) {
                if listener.send(ChannelEvent::Hangup).is_ok() {
                    delivered += 1;
                }
            }
        }
        debug!("Hangup delivered to {} listener(s)", delivered);
        delivered
    }

    /// Deliver a keypad tone to every DTMF listener. Returns how many were notified.
    pub fn emit_dtmf(&self, tone: DtmfTone) -> usize {
        let mut delivered = 0;
        for entry in self.dtmf_listeners.iter() {
            if entry.value().send(ChannelEvent::Dtmf(tone)).is_ok() {
                delivered += 1;
            }
        }
        trace!("DTMF '{}' delivered to {} listener(s)", tone, delivered);
        delivered
    }

    pub fn hangup_listener_count(&self) -> usize {
        self.hangup_listeners.len()
    }

    pub fn dtmf_listener_count(&self) -> usize {
        self.dtmf_listeners.len()
    }
}
