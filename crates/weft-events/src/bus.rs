//! In-process named-topic pub/sub, generalized from the teacher's
//! `EventListener` fan-out in `fluent-engines::modular_pipeline_executor`
//! (there, a fixed `Vec<Arc<dyn EventListener>>` called for every event) to
//! per-topic subscriber lists with both async and synchronous delivery.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::event::Event;

/// A subscriber reacting to published events.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: &Event) -> anyhow::Result<()>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        (self)(event)
    }
}

/// The event bus. Cheaply cloneable: internal state lives behind an `Arc`.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<String, Vec<Arc<dyn Handler>>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Process-wide singleton, lazily constructed on first use — the
    /// "expose process-wide accessors that delegate to an injected
    /// instance" pattern called for when re-architecting global singletons
    /// for dependency injection.
    pub fn global() -> &'static EventBus {
        static INSTANCE: OnceLock<EventBus> = OnceLock::new();
        INSTANCE.get_or_init(EventBus::new)
    }

    pub async fn subscribe(&self, event_type: impl Into<String>, handler: Arc<dyn Handler>) {
        let mut handlers = self.handlers.write().await;
        handlers.entry(event_type.into()).or_default().push(handler);
    }

    pub async fn unsubscribe(&self, event_type: &str) {
        let mut handlers = self.handlers.write().await;
        handlers.remove(event_type);
    }

    pub async fn clear(&self) {
        let mut handlers = self.handlers.write().await;
        handlers.clear();
    }

    pub async fn subscriber_count(&self, event_type: &str) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(event_type).map(Vec::len).unwrap_or(0)
    }

    fn stamp(event: &mut Event) {
        if event.is_timestamp_zero() {
            event.timestamp = Utc::now();
        }
    }

    /// Asynchronous delivery: each handler runs in its own task. Errors are
    /// logged, never surfaced to the publisher. Neither cross-handler nor
    /// cross-publication ordering is guaranteed.
    pub async fn publish(&self, mut event: Event) {
        Self::stamp(&mut event);
        let event_type = event.event_type.clone();

        let subscribers = {
            let handlers = self.handlers.read().await;
            handlers.get(&event_type).cloned().unwrap_or_default()
        };

        for handler in subscribers {
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&event).await {
                    warn!(event_type = %event.event_type, error = %e, "event handler failed");
                }
            });
        }
    }

    /// Synchronous delivery in registration order; the first handler error
    /// aborts the remaining fan-out and is returned to the caller.
    pub async fn publish_sync(&self, mut event: Event) -> anyhow::Result<()> {
        Self::stamp(&mut event);

        let subscribers = {
            let handlers = self.handlers.read().await;
            handlers.get(&event.event_type).cloned().unwrap_or_default()
        };

        for handler in subscribers {
            handler.handle(&event).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl Handler for FailingHandler {
        async fn handle(&self, _event: &Event) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("handler failure"))
        }
    }

    // S6 — async delivery fans out to every subscriber.
    #[tokio::test]
    async fn s6_publish_delivers_to_all_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            bus.subscribe(
                "e",
                Arc::new(CountingHandler {
                    count: count.clone(),
                }),
            )
            .await;
        }

        bus.publish(Event::new("e", "test")).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn publish_stamps_zero_timestamp() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            "e",
            Arc::new(CountingHandler {
                count: count.clone(),
            }),
        )
        .await;

        bus.publish(Event::new("e", "test")).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_sync_runs_in_registration_order_and_aborts_on_error() {
        let bus = EventBus::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let order_a = order.clone();
        bus.subscribe(
            "e",
            Arc::new(move |_event: &Event| -> anyhow::Result<()> {
                order_a.lock().unwrap().push("a");
                Ok(())
            }),
        )
        .await;
        bus.subscribe("e", Arc::new(FailingHandler)).await;

        let order_c = order.clone();
        bus.subscribe(
            "e",
            Arc::new(move |_event: &Event| -> anyhow::Result<()> {
                order_c.lock().unwrap().push("c");
                Ok(())
            }),
        )
        .await;

        let result = bus.publish_sync(Event::new("e", "test")).await;
        assert!(result.is_err());
        assert_eq!(*order.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn unsubscribe_removes_all_handlers_for_topic() {
        let bus = EventBus::new();
        bus.subscribe("e", Arc::new(FailingHandler)).await;
        assert_eq!(bus.subscriber_count("e").await, 1);

        bus.unsubscribe("e").await;
        assert_eq!(bus.subscriber_count("e").await, 0);
    }

    #[tokio::test]
    async fn clear_removes_every_handler() {
        let bus = EventBus::new();
        bus.subscribe("a", Arc::new(FailingHandler)).await;
        bus.subscribe("b", Arc::new(FailingHandler)).await;

        bus.clear().await;
        assert_eq!(bus.subscriber_count("a").await, 0);
        assert_eq!(bus.subscriber_count("b").await, 0);
    }
}
