use dashmap::DashMap;
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

struct FeedInner<T> {
    listeners: DashMap<u64, mpsc::UnboundedSender<T>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Fan-out of one event kind to any number of subscribers.
///
/// Every listener gets its own queue, so a slow or vanished listener never
/// holds back the others.
pub struct Feed<T> {
    inner: Arc<FeedInner<T>>,
}

impl<T: Clone + Send + 'static> Feed<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(FeedInner {
                listeners: DashMap::new(),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Registers a listener. After the feed closed the subscription is already ended.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        if !self.inner.closed.load(Ordering::Acquire) {
            self.inner.listeners.insert(id, tx);
        }

        Subscription {
            id,
            rx,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `item` to every live listener and prunes the dead ones.
    /// Returns the number of listeners reached.
    pub(crate) fn publish(&self, item: T) -> usize {
        if self.inner.closed.load(Ordering::Acquire) {
            return 0;
        }

        let mut delivered = 0;
        self.inner.listeners.retain(|_, tx| {
            let alive = tx.send(item.clone()).is_ok();
            delivered += usize::from(alive);
            alive
        });
        delivered
    }

    /// Ends every subscription. Items published afterwards are dropped.
    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

/// A listener registration. Ends when the feed closes; dropping it unsubscribes.
pub struct Subscription<T> {
    id: u64,
    rx: mpsc::UnboundedReceiver<T>,
    feed: Weak<FeedInner<T>>,
}

impl<T> Subscription<T> {
    /// Next item, or `None` once the feed is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns an already queued item without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.upgrade() {
            feed.listeners.remove(&self.id);
        }
    }
}
