//! Observable values shared between UI consumers.
//!
//! An [`Observable`] holds one value and a list of subscribers. Every `set`
//! replaces the value and notifies subscribers synchronously, in the order
//! they subscribed, before returning. Handles are cheap to clone and are
//! passed to whoever needs them; there is no global registry.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

enum Subscriber<T> {
    Callback(Callback<T>),
    Channel(mpsc::UnboundedSender<T>),
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(cb) => Self::Callback(Arc::clone(cb)),
            Self::Channel(tx) => Self::Channel(tx.clone()),
        }
    }
}

struct State<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(u64, Subscriber<T>)>,
}

struct Inner<T> {
    state: Mutex<State<T>>,
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // A panicking subscriber never runs under this lock, so the data is
        // still consistent if the mutex was poisoned elsewhere.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    value: initial,
                    next_id: 0,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.lock().value.clone()
    }

    /// Replace the value and notify every subscriber with it.
    ///
    /// Equal values still notify: this is a setter, not a change filter.
    pub fn set(&self, value: T) {
        let subscribers = {
            let mut state = self.inner.lock();
            state.value = value.clone();
            state.subscribers.clone()
        };
        self.deliver(&value, subscribers);
    }

    /// Apply `f` to the current value and publish the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let (value, subscribers) = {
            let mut state = self.inner.lock();
            let next = f(&state.value);
            state.value = next.clone();
            (next, state.subscribers.clone())
        };
        self.deliver(&value, subscribers);
    }

    /// Register a callback invoked synchronously on every `set`.
    ///
    /// The callback stays registered until the returned guard is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_change(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.push(Subscriber::Callback(Arc::new(callback)));
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().subscribers.retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Channel subscription; the receiver sees every value in `set` order.
    ///
    /// Dropping the receiver unsubscribes on the next publish.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push(Subscriber::Channel(tx));
        rx
    }

    pub fn stream(&self) -> UnboundedReceiverStream<T> {
        UnboundedReceiverStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// A handle that can observe but never write.
    pub fn reader(&self) -> ObservableReader<T> {
        ObservableReader {
            source: self.clone(),
        }
    }

    fn push(&self, subscriber: Subscriber<T>) -> u64 {
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, subscriber));
        id
    }

    fn deliver(&self, value: &T, subscribers: Vec<(u64, Subscriber<T>)>) {
        let mut closed = Vec::new();
        for (id, subscriber) in subscribers {
            match subscriber {
                Subscriber::Callback(cb) => cb(value),
                Subscriber::Channel(tx) => {
                    if tx.send(value.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }
        if !closed.is_empty() {
            tracing::debug!(count = closed.len(), "pruning closed observable receivers");
            self.inner
                .lock()
                .subscribers
                .retain(|(id, _)| !closed.contains(id));
        }
    }
}

/// Read-only view over an [`Observable`].
pub struct ObservableReader<T> {
    source: Observable<T>,
}

impl<T> Clone for ObservableReader<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> ObservableReader<T> {
    pub fn get(&self) -> T {
        self.source.get()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_change(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.source.on_change(callback)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        self.source.subscribe()
    }

    pub fn stream(&self) -> UnboundedReceiverStream<T> {
        self.source.stream()
    }
}

/// Guard for a callback subscription. Unsubscribes on drop.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Keep the callback registered for the lifetime of the observable.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{timeout, Duration};

    #[test]
    fn set_replaces_value() {
        let flag = Observable::new(false);
        flag.set(true);
        flag.set(false);
        assert!(!flag.get());
    }

    #[test]
    fn callbacks_see_every_transition_in_order() {
        let flag = Observable::new(false);
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let a = seen_a.clone();
        let _sub_a = flag.on_change(move |v| a.lock().unwrap().push(*v));
        let b = seen_b.clone();
        let _sub_b = flag.on_change(move |v| b.lock().unwrap().push(*v));

        flag.set(true);
        flag.set(false);

        assert_eq!(*seen_a.lock().unwrap(), vec![true, false]);
        assert_eq!(*seen_b.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn callbacks_run_in_subscription_order() {
        let flag = Observable::new(0u32);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = order.clone();
        let _s1 = flag.on_change(move |_| first.lock().unwrap().push("first"));
        let second = order.clone();
        let _s2 = flag.on_change(move |_| second.lock().unwrap().push("second"));

        flag.set(1);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn equal_values_still_notify() {
        let flag = Observable::new(true);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _sub = flag.on_change(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        flag.set(true);
        flag.set(true);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let flag = Observable::new(false);
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = flag.on_change(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(flag.subscriber_count(), 1);

        flag.set(true);
        drop(sub);
        flag.set(false);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(flag.subscriber_count(), 0);
    }

    #[test]
    fn forgotten_subscription_stays_registered() {
        let flag = Observable::new(false);
        flag.on_change(|_| {}).forget();
        assert_eq!(flag.subscriber_count(), 1);
    }

    #[test]
    fn callback_may_read_the_same_observable() {
        let flag = Observable::new(1u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reader = flag.clone();
        let s = seen.clone();
        let _sub = flag.on_change(move |_| s.lock().unwrap().push(reader.get()));

        flag.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[test]
    fn update_applies_function() {
        let counter = Observable::new(1u32);
        counter.update(|v| v + 2);
        assert_eq!(counter.get(), 3);
    }

    #[tokio::test]
    async fn channel_subscriber_receives_in_order() {
        let flag = Observable::new(false);
        let mut rx = flag.subscribe();

        flag.set(true);
        flag.set(false);

        let first = timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn closed_receivers_are_pruned() {
        let flag = Observable::new(false);
        let rx = flag.subscribe();
        assert_eq!(flag.subscriber_count(), 1);

        drop(rx);
        flag.set(true);
        assert_eq!(flag.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn reader_observes_writes() {
        let flag = Observable::new(false);
        let reader = flag.reader();
        let mut rx = reader.subscribe();

        flag.set(true);
        assert!(reader.get());
        assert_eq!(rx.recv().await, Some(true));
    }
}
