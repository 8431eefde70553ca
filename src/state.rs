//! Shared site state and structural notifications
//!
//! Components that hold state derived from the cache receive typed events
//! through an `EventSink`. `StateHub` is the default sink: it folds events
//! into a `SiteState` snapshot and rebroadcasts them to subscribers.

use crate::fingerprint::Fingerprint;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Structural event emitted during bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// The cache directory was cleared; in-memory caches must be dropped
    DeleteCache {
        /// True when recovering from an interrupted run rather than a planned invalidation
        corrupted: bool,
    },
    /// A new fingerprint baseline was persisted
    FingerprintUpdated(Fingerprint),
    /// File extensions the module resolver should accept
    ResolvableExtensions(Vec<String>),
}

impl StateEvent {
    /// Stable event name, used by the run journal
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeleteCache { .. } => "DELETE_CACHE",
            Self::FingerprintUpdated(_) => "UPDATE_FINGERPRINT",
            Self::ResolvableExtensions(_) => "SET_RESOLVABLE_EXTENSIONS",
        }
    }
}

/// Receiver of structural events
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: StateEvent);
}

/// Snapshot of state shared with downstream collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteState {
    pub fingerprint: Option<Fingerprint>,
    /// Number of cache clears seen by this hub
    pub cache_clears: u32,
    /// Whether the last clear recovered from corruption
    pub last_clear_corrupted: bool,
    pub resolvable_extensions: Vec<String>,
}

impl SiteState {
    fn reduce(&mut self, event: &StateEvent) {
        match event {
            StateEvent::DeleteCache { corrupted } => {
                self.cache_clears += 1;
                self.last_clear_corrupted = *corrupted;
                self.resolvable_extensions.clear();
            }
            StateEvent::FingerprintUpdated(fp) => self.fingerprint = Some(fp.clone()),
            StateEvent::ResolvableExtensions(exts) => self.resolvable_extensions = exts.clone(),
        }
    }
}

/// In-process state store with load, mutate and subscribe operations
#[derive(Clone)]
pub struct StateHub {
    state: Arc<RwLock<SiteState>>,
    event_sender: broadcast::Sender<StateEvent>,
}

impl StateHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(SiteState::default())),
            event_sender: tx,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> SiteState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Subscribe to events dispatched after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_sender.subscribe()
    }
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for StateHub {
    fn dispatch(&self, event: StateEvent) {
        debug!("Dispatching {}", event.name());
        {
            let mut guard = match self.state.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.reduce(&event);
        }
        // No subscribers is fine
        let _ = self.event_sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_updates_snapshot() {
        let hub = StateHub::new();
        hub.dispatch(StateEvent::FingerprintUpdated(Fingerprint::from_hex("f1")));
        hub.dispatch(StateEvent::ResolvableExtensions(vec![".js".to_string()]));

        let state = hub.snapshot();
        assert_eq!(state.fingerprint, Some(Fingerprint::from_hex("f1")));
        assert_eq!(state.resolvable_extensions, vec![".js"]);
    }

    #[test]
    fn delete_cache_records_corruption() {
        let hub = StateHub::new();
        hub.dispatch(StateEvent::ResolvableExtensions(vec![".js".to_string()]));
        hub.dispatch(StateEvent::DeleteCache { corrupted: true });

        let state = hub.snapshot();
        assert_eq!(state.cache_clears, 1);
        assert!(state.last_clear_corrupted);
        assert!(state.resolvable_extensions.is_empty());
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let hub = StateHub::new();
        let mut rx = hub.subscribe();

        hub.dispatch(StateEvent::DeleteCache { corrupted: false });
        hub.dispatch(StateEvent::FingerprintUpdated(Fingerprint::from_hex("f2")));

        assert_eq!(
            rx.recv().await.unwrap(),
            StateEvent::DeleteCache { corrupted: false }
        );
        assert_eq!(
            rx.recv().await.unwrap().name(),
            "UPDATE_FINGERPRINT"
        );
    }

    #[test]
    fn clones_share_state() {
        let hub = StateHub::new();
        let other = hub.clone();
        other.dispatch(StateEvent::FingerprintUpdated(Fingerprint::from_hex("x")));
        assert!(hub.snapshot().fingerprint.is_some());
    }
}
