use crate::library::progress::LibraryEvent;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

/// Filter criteria for event subscriptions
#[derive(Debug, Clone)]
enum SubscriptionFilter {
    All,
    Memory { key: String },
}

impl SubscriptionFilter {
    fn matches(&self, event: &LibraryEvent) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Memory { key } => match event {
                LibraryEvent::ItemFinished { key: item_key, .. } => item_key == key,
                _ => false,
            },
        }
    }
}

struct Subscription {
    filter: SubscriptionFilter,
    tx: tokio_mpsc::UnboundedSender<LibraryEvent>,
}

/// Fans library events out to any number of subscribers
#[derive(Clone)]
pub struct EventHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl EventHandle {
    /// Create a new event handle and spawn a background task to dispatch events
    pub fn new(
        mut event_rx: tokio_mpsc::UnboundedReceiver<LibraryEvent>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let mut subs = match subscriptions_clone.lock() {
                    Ok(subs) => subs,
                    Err(poisoned) => poisoned.into_inner(),
                };

                // A failed send means the receiver was dropped
                subs.retain(|_, subscription| {
                    !subscription.filter.matches(&event)
                        || subscription.tx.send(event.clone()).is_ok()
                });
            }
            info!("EventHandle: Event channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to every library event.
    /// The subscription is removed once the receiver is dropped.
    pub fn subscribe(&self) -> tokio_mpsc::UnboundedReceiver<LibraryEvent> {
        self.add_subscription(SubscriptionFilter::All)
    }

    /// Subscribe to download results for a single memory key
    pub fn subscribe_memory(&self, key: String) -> tokio_mpsc::UnboundedReceiver<LibraryEvent> {
        self.add_subscription(SubscriptionFilter::Memory { key })
    }

    fn add_subscription(
        &self,
        filter: SubscriptionFilter,
    ) -> tokio_mpsc::UnboundedReceiver<LibraryEvent> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut subs = match self.subscriptions.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.insert(id, Subscription { filter, tx });
        rx
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}
