/*
 * Copyright 2024 Google LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Per-stream subscriptions and change fan-out.
//!
//! Every discovery stream owns one [`Watch`]. The [`WatchRegistry`] lock only
//! guards membership; each watch has its own interest set and its own queue
//! of pending changes. Delivery never waits on a consumer: a change is added
//! to the queue of every interested watch, duplicates are coalesced, and the
//! consumer is woken up. A slow consumer therefore only delays itself.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use futures::Stream;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use super::{ResourceRef, ResourceType};

/// Tracks every live [`Watch`].
#[derive(Clone, Default)]
pub struct WatchRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    watches: Mutex<HashMap<u64, Arc<Shared>>>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct Shared {
    interest: RwLock<HashSet<ResourceRef>>,
    pending: Mutex<Pending>,
    wake: Notify,
    released: AtomicBool,
}

/// Queue of undelivered changes, in arrival order, without duplicates.
#[derive(Default)]
struct Pending {
    order: VecDeque<ResourceRef>,
    members: HashSet<ResourceRef>,
}

impl Pending {
    fn push(&mut self, resource: ResourceRef) -> bool {
        if !self.members.insert(resource.clone()) {
            return false;
        }
        self.order.push_back(resource);
        true
    }

    fn pop(&mut self) -> Option<ResourceRef> {
        let resource = self.order.pop_front()?;
        self.members.remove(&resource);
        Some(resource)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

impl Shared {
    fn is_interested(&self, resource: &ResourceRef) -> bool {
        let interest = self.interest.read();
        interest.contains(resource)
            || interest.contains(&ResourceRef::wildcard(resource.resource_type))
    }

    fn deliver(&self, resource: ResourceRef) {
        if self.released.load(Ordering::Acquire) {
            return;
        }

        if self.pending.lock().push(resource) {
            self.wake.notify_one();
        }
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
        self.pending.lock().clear();
        self.wake.notify_waiters();
        self.wake.notify_one();
    }
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a watch. The watch is unregistered, and its
    /// change streams end, when the returned [`Release`] is dropped.
    pub fn build_watch(&self) -> (Watch, Release) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(Shared::default());
        self.inner.watches.lock().insert(id, shared.clone());
        super::metrics::active_watches().inc();
        tracing::trace!(id, "watch registered");

        (
            Watch {
                shared: shared.clone(),
            },
            Release {
                registry: self.clone(),
                id,
                shared,
            },
        )
    }

    /// Number of live watches.
    pub fn len(&self) -> usize {
        self.inner.watches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers each changed resource to every watch subscribed to it. A
    /// wildcard reference reaches every watch subscribed to any resource of
    /// its type.
    pub fn notify(&self, changed: impl IntoIterator<Item = ResourceRef>) {
        let changed: Vec<_> = changed.into_iter().collect();
        if changed.is_empty() {
            return;
        }

        for watch in self.snapshot() {
            for resource in &changed {
                if resource.is_wildcard() {
                    for subscribed in watch.subscribed(resource.resource_type) {
                        watch.deliver(subscribed);
                    }
                } else if watch.is_interested(resource) {
                    watch.deliver(resource.clone());
                }
            }
        }
    }

    /// Delivers every subscribed resource to every watch.
    pub fn notify_all(&self) {
        self.notify(ResourceType::VALUES.map(ResourceRef::wildcard));
    }

    /// Clones the current membership so that delivery happens outside the
    /// registry lock.
    fn snapshot(&self) -> Vec<Arc<Shared>> {
        self.inner.watches.lock().values().cloned().collect()
    }

    fn remove(&self, id: u64) {
        if self.inner.watches.lock().remove(&id).is_some() {
            super::metrics::active_watches().dec();
            tracing::trace!(id, "watch released");
        }
    }
}

impl Shared {
    fn subscribed(&self, resource_type: ResourceType) -> Vec<ResourceRef> {
        self.interest
            .read()
            .iter()
            .filter(|resource| resource.resource_type == resource_type)
            .cloned()
            .collect()
    }
}

/// A stream's set of subscribed resources and the changes made to them.
#[derive(Clone)]
pub struct Watch {
    shared: Arc<Shared>,
}

impl Watch {
    /// Subscribes to `resource`. Returns `false` if it was already
    /// subscribed. Subscriptions last for the lifetime of the watch.
    pub fn watch(&self, resource: ResourceRef) -> bool {
        self.shared.interest.write().insert(resource)
    }

    pub fn is_watching(&self, resource: &ResourceRef) -> bool {
        self.shared.is_interested(resource)
    }

    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }

    /// Yields changed resources, in no particular order, until the watch is
    /// released. Changes to the same resource that arrive before the
    /// previous one was taken are merged. Only one stream should be polled
    /// at a time; a new stream picks up where a dropped one left off.
    pub fn changes(&self) -> impl Stream<Item = ResourceRef> + Send + 'static {
        let shared = self.shared.clone();
        async_stream::stream! {
            loop {
                if shared.released.load(Ordering::Acquire) {
                    break;
                }

                let next = shared.pending.lock().pop();
                match next {
                    Some(resource) => yield resource,
                    None => shared.wake.notified().await,
                }
            }
        }
    }
}

/// Releases a [`Watch`] when dropped.
pub struct Release {
    registry: WatchRegistry,
    id: u64,
    shared: Arc<Shared>,
}

impl Release {
    pub fn release(self) {}
}

impl Drop for Release {
    fn drop(&mut self) {
        self.shared.release();
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn listener(name: &str) -> ResourceRef {
        ResourceRef::new(ResourceType::Listener, name)
    }

    fn endpoint(name: &str) -> ResourceRef {
        ResourceRef::new(ResourceType::Endpoint, name)
    }

    async fn next(stream: &mut (impl Stream<Item = ResourceRef> + Unpin)) -> Option<ResourceRef> {
        tokio::time::timeout(TIMEOUT, stream.next()).await.unwrap()
    }

    async fn nothing(stream: &mut (impl Stream<Item = ResourceRef> + Unpin)) {
        assert!(
            tokio::time::timeout(Duration::from_millis(50), stream.next())
                .await
                .is_err(),
            "expected no change"
        );
    }

    #[test]
    fn watch_is_idempotent() {
        let registry = WatchRegistry::new();
        let (watch, _release) = registry.build_watch();
        assert!(watch.watch(listener("ns/a")));
        assert!(!watch.watch(listener("ns/a")));
        assert!(watch.is_watching(&listener("ns/a")));
        assert!(!watch.is_watching(&listener("ns/b")));
    }

    #[tokio::test]
    async fn delivers_only_subscribed() {
        let registry = WatchRegistry::new();
        let (a, _a) = registry.build_watch();
        let (b, _b) = registry.build_watch();
        a.watch(listener("ns/a"));
        b.watch(listener("ns/b"));

        let mut a_changes = Box::pin(a.changes());
        let mut b_changes = Box::pin(b.changes());

        registry.notify([listener("ns/a")]);
        assert_eq!(Some(listener("ns/a")), next(&mut a_changes).await);
        nothing(&mut b_changes).await;
    }

    #[tokio::test]
    async fn stalled_consumer_does_not_delay_others() {
        let registry = WatchRegistry::new();
        let (stalled, _stalled) = registry.build_watch();
        let (live, _live) = registry.build_watch();
        stalled.watch(endpoint("x"));
        live.watch(endpoint("x"));

        // Held but never polled.
        let _stalled_changes = Box::pin(stalled.changes());
        let mut live_changes = Box::pin(live.changes());

        tokio::time::timeout(TIMEOUT, async {
            for _ in 0..1_000 {
                registry.notify([endpoint("x")]);
                assert_eq!(Some(endpoint("x")), live_changes.next().await);
            }
        })
        .await
        .unwrap();

        // The stalled watch holds one merged change, not a thousand.
        let mut stalled_changes = Box::pin(stalled.changes());
        assert_eq!(Some(endpoint("x")), next(&mut stalled_changes).await);
        nothing(&mut stalled_changes).await;
    }

    #[tokio::test]
    async fn coalesces_pending_changes() {
        let registry = WatchRegistry::new();
        let (watch, _release) = registry.build_watch();
        watch.watch(endpoint("x"));
        watch.watch(endpoint("y"));

        for _ in 0..100 {
            registry.notify([endpoint("x")]);
        }
        registry.notify([endpoint("y")]);

        let mut changes = Box::pin(watch.changes());
        assert_eq!(Some(endpoint("x")), next(&mut changes).await);
        assert_eq!(Some(endpoint("y")), next(&mut changes).await);
        nothing(&mut changes).await;
    }

    #[tokio::test]
    async fn wildcards() {
        let registry = WatchRegistry::new();
        let (everything, _e) = registry.build_watch();
        let (named, _n) = registry.build_watch();
        everything.watch(ResourceRef::wildcard(ResourceType::Listener));
        named.watch(listener("ns/a"));
        named.watch(listener("ns/b"));
        named.watch(endpoint("x"));

        let mut everything_changes = Box::pin(everything.changes());
        registry.notify([listener("ns/c")]);
        assert_eq!(Some(listener("ns/c")), next(&mut everything_changes).await);

        registry.notify_all();
        let mut named_changes = Box::pin(named.changes());
        let mut received = vec![];
        for _ in 0..3 {
            received.push(next(&mut named_changes).await.unwrap());
        }
        received.sort();
        assert_eq!(vec![listener("ns/a"), listener("ns/b"), endpoint("x")], received);
        assert_eq!(
            Some(ResourceRef::wildcard(ResourceType::Listener)),
            next(&mut everything_changes).await
        );
    }

    #[tokio::test]
    async fn release_ends_changes_and_unregisters() {
        let registry = WatchRegistry::new();
        let (watch, release) = registry.build_watch();
        watch.watch(listener("ns/a"));
        assert_eq!(1, registry.len());

        let mut changes = Box::pin(watch.changes());
        let waiter = tokio::spawn(async move { changes.next().await });
        tokio::task::yield_now().await;

        drop(release);
        assert_eq!(None, tokio::time::timeout(TIMEOUT, waiter).await.unwrap().unwrap());
        assert!(registry.is_empty());
        assert!(watch.is_released());

        registry.notify([listener("ns/a")]);
        assert_eq!(None, next(&mut Box::pin(watch.changes())).await);
    }

    #[tokio::test]
    async fn changes_are_restartable() {
        let registry = WatchRegistry::new();
        let (watch, _release) = registry.build_watch();
        watch.watch(endpoint("x"));
        watch.watch(endpoint("y"));

        registry.notify([endpoint("x"), endpoint("y")]);
        {
            let mut changes = Box::pin(watch.changes());
            assert_eq!(Some(endpoint("x")), next(&mut changes).await);
        }

        let mut changes = Box::pin(watch.changes());
        assert_eq!(Some(endpoint("y")), next(&mut changes).await);
    }
}
