//! Observable state containers.
//!
//! A [`Store`] owns one piece of state, hands out shared reads, and applies
//! mutations through a transform closure. Every applied change bumps the
//! version and is pushed to the registered observers, in registration order.

use std::fmt;

use bevy_ecs::prelude::Resource;

type Observer<T> = Box<dyn Fn(&T, u64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Resource)]
pub struct Store<T: Send + Sync + 'static> {
    state: T,
    version: u64,
    next_subscription: u64,
    observers: Vec<(SubscriptionId, Observer<T>)>,
}

impl<T: Send + Sync + 'static> Store<T> {
    pub fn new(state: T) -> Self {
        Self {
            state,
            version: 0,
            next_subscription: 0,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.state
    }

    /// Number of changes applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Applies `transform` and notifies observers unconditionally.
    pub fn update<R>(&mut self, transform: impl FnOnce(&mut T) -> R) -> R {
        let result = transform(&mut self.state);
        self.publish();
        result
    }

    /// Applies `transform`; observers are only notified when it reports a change.
    pub fn try_update(&mut self, transform: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = transform(&mut self.state);
        if changed {
            self.publish();
        }
        changed
    }

    /// Replaces the whole state.
    pub fn set(&mut self, state: T) {
        self.state = state;
        self.publish();
    }

    pub fn subscribe(&mut self, observer: impl Fn(&T, u64) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn publish(&mut self) {
        self.version += 1;
        for (_, observer) in &self.observers {
            observer(&self.state, self.version);
        }
    }
}

impl<T: Send + Sync + fmt::Debug + 'static> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn update_notifies_observers_with_new_version() {
        let mut store = Store::new(0_u32);
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        store.subscribe(move |value, version| {
            sink.store(u64::from(*value) * 100 + version, Ordering::SeqCst);
        });

        store.update(|value| *value = 7);

        assert_eq!(*store.get(), 7);
        assert_eq!(store.version(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 701);
    }

    #[test]
    fn try_update_without_change_is_silent() {
        let mut store = Store::new(vec![1, 2, 3]);
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        store.subscribe(move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.try_update(|items| {
            let before = items.len();
            items.retain(|item| *item != 9);
            items.len() != before
        }));
        assert_eq!(store.version(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribed_observers_stop_receiving() {
        let mut store = Store::new(0_u32);
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        let id = store.subscribe(move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        store.set(1);
        assert!(store.unsubscribe(id));
        store.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!store.unsubscribe(id));
    }
}
