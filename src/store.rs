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

//! Storage for the source objects kxds compiles.
//!
//! The resolver only needs read access through [`ConfigStore`] and
//! [`EndpointStore`]. Providers write into a [`MemoryStore`], which publishes
//! a [`SourceChange`] for every mutation so the watch engine can work out
//! which resources to push again.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::config::{content_version, EndpointSet, ListenerConfig, SourceDocument};

/// Number of changes buffered per subscriber before it starts lagging.
const CHANGE_CAPACITY: usize = 1024;

type Key = (String, String);

/// Read access to listener configurations.
pub trait ConfigStore: Send + Sync {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<ListenerConfig>>;
    fn list(&self, selector: &Selector) -> Vec<Arc<ListenerConfig>>;
}

/// Read access to endpoint sets.
pub trait EndpointStore: Send + Sync {
    /// Returns every endpoint set in `namespace` that belongs to `service`.
    fn list(&self, namespace: &str, service: &str) -> Vec<Arc<EndpointSet>>;
}

/// Selects listener configurations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    namespace: Option<String>,
}

impl Selector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    pub fn matches(&self, config: &ListenerConfig) -> bool {
        self.namespace
            .as_deref()
            .map_or(true, |namespace| namespace == config.namespace)
    }
}

/// A mutation of a source object.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceChange {
    /// A listener configuration was created, updated or deleted. `previous`
    /// holds the replaced object, if any, so that resources derived from its
    /// old shape can be refreshed too.
    Listener {
        namespace: String,
        name: String,
        previous: Option<Arc<ListenerConfig>>,
    },
    /// An endpoint set belonging to `service` was created, updated or deleted.
    Endpoints { namespace: String, service: String },
}

/// An in-memory [`ConfigStore`] and [`EndpointStore`].
pub struct MemoryStore {
    listeners: RwLock<BTreeMap<Key, Arc<ListenerConfig>>>,
    endpoints: RwLock<BTreeMap<Key, Arc<EndpointSet>>>,
    changes: broadcast::Sender<SourceChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            listeners: <_>::default(),
            endpoints: <_>::default(),
            changes,
        }
    }

    /// Subscribes to every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SourceChange> {
        self.changes.subscribe()
    }

    /// Inserts or replaces a listener configuration. Returns `false` when the
    /// stored object was already identical.
    pub fn apply_listener(&self, mut config: ListenerConfig) -> bool {
        if config.resource_version.is_empty() {
            config.resource_version =
                content_version(&(&config.namespace, &config.name, &config.spec));
        }

        let key = (config.namespace.clone(), config.name.clone());
        let previous = {
            let mut listeners = self.listeners.write();
            if listeners.get(&key).is_some_and(|existing| **existing == config) {
                return false;
            }
            listeners.insert(key.clone(), Arc::new(config))
        };

        tracing::debug!(namespace = %key.0, name = %key.1, "listener config applied");
        self.publish(SourceChange::Listener {
            namespace: key.0,
            name: key.1,
            previous,
        });
        true
    }

    pub fn delete_listener(&self, namespace: &str, name: &str) -> bool {
        let key = (namespace.to_owned(), name.to_owned());
        let Some(previous) = self.listeners.write().remove(&key) else {
            return false;
        };

        tracing::debug!(namespace, name, "listener config deleted");
        self.publish(SourceChange::Listener {
            namespace: key.0,
            name: key.1,
            previous: Some(previous),
        });
        true
    }

    /// Inserts or replaces an endpoint set. Returns `false` when the stored
    /// object was already identical.
    pub fn apply_endpoints(&self, mut set: EndpointSet) -> bool {
        if set.resource_version.is_empty() {
            set.resource_version = content_version(&(
                &set.namespace,
                &set.name,
                &set.service,
                &set.ports,
                &set.endpoints,
            ));
        }

        let key = (set.namespace.clone(), set.name.clone());
        let service = set.service.clone();
        let previous = {
            let mut endpoints = self.endpoints.write();
            if endpoints.get(&key).is_some_and(|existing| **existing == set) {
                return false;
            }
            endpoints.insert(key.clone(), Arc::new(set))
        };

        tracing::debug!(namespace = %key.0, name = %key.1, %service, "endpoint set applied");
        if let Some(previous) = previous.filter(|previous| previous.service != service) {
            self.publish(SourceChange::Endpoints {
                namespace: key.0.clone(),
                service: previous.service.clone(),
            });
        }
        self.publish(SourceChange::Endpoints {
            namespace: key.0,
            service,
        });
        true
    }

    pub fn delete_endpoints(&self, namespace: &str, name: &str) -> bool {
        let key = (namespace.to_owned(), name.to_owned());
        let Some(previous) = self.endpoints.write().remove(&key) else {
            return false;
        };

        tracing::debug!(namespace, name, "endpoint set deleted");
        self.publish(SourceChange::Endpoints {
            namespace: key.0,
            service: previous.service.clone(),
        });
        true
    }

    /// Replaces every listener configuration matching `selector` with
    /// `configs`, deleting the ones no longer present.
    pub fn replace_listeners(
        &self,
        selector: &Selector,
        configs: impl IntoIterator<Item = ListenerConfig>,
    ) {
        let mut stale: BTreeSet<Key> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, config)| selector.matches(config))
            .map(|(key, _)| key.clone())
            .collect();

        for config in configs {
            stale.remove(&(config.namespace.clone(), config.name.clone()));
            self.apply_listener(config);
        }

        for (namespace, name) in stale {
            self.delete_listener(&namespace, &name);
        }
    }

    /// Replaces every endpoint set (in `namespace`, or everywhere when
    /// `None`) with `sets`, deleting the ones no longer present.
    pub fn replace_endpoints(
        &self,
        namespace: Option<&str>,
        sets: impl IntoIterator<Item = EndpointSet>,
    ) {
        let mut stale: BTreeSet<Key> = self
            .endpoints
            .read()
            .keys()
            .filter(|(ns, _)| namespace.map_or(true, |namespace| namespace == ns))
            .cloned()
            .collect();

        for set in sets {
            stale.remove(&(set.namespace.clone(), set.name.clone()));
            self.apply_endpoints(set);
        }

        for (namespace, name) in stale {
            self.delete_endpoints(&namespace, &name);
        }
    }

    /// Makes the store's contents equal to `document`.
    pub fn apply_document(&self, document: SourceDocument) {
        self.replace_listeners(&Selector::everything(), document.listeners);
        self.replace_endpoints(None, document.endpoints);
    }

    pub fn endpoint_sets(&self) -> Vec<Arc<EndpointSet>> {
        self.endpoints.read().values().cloned().collect()
    }

    fn publish(&self, change: SourceChange) {
        // Having no subscribers is not an error: nobody is watching yet.
        let _ = self.changes.send(change);
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<ListenerConfig>> {
        self.listeners
            .read()
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
    }

    fn list(&self, selector: &Selector) -> Vec<Arc<ListenerConfig>> {
        self.listeners
            .read()
            .values()
            .filter(|config| selector.matches(config))
            .cloned()
            .collect()
    }
}

impl EndpointStore for MemoryStore {
    fn list(&self, namespace: &str, service: &str) -> Vec<Arc<EndpointSet>> {
        self.endpoints
            .read()
            .range((namespace.to_owned(), String::new())..)
            .take_while(|((ns, _), _)| ns == namespace)
            .filter(|(_, set)| set.service == service)
            .map(|(_, set)| set.clone())
            .collect()
    }
}
