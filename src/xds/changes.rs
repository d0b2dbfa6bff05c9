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

//! Maps source mutations onto the resources they affect.

use std::collections::BTreeSet;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing_futures::Instrument;

use crate::{
    config::ListenerConfig,
    store::{ConfigStore, Selector, SourceChange},
};

use super::{cluster::Backend, naming::ListenerName, ResourceRef, ResourceType, WatchRegistry};

/// Returns every resource whose resolution reads the changed object.
///
/// Endpoint changes are matched by scanning every listener, since backends
/// may reference services in any namespace.
pub fn affected(config: &dyn ConfigStore, change: &SourceChange) -> BTreeSet<ResourceRef> {
    let mut affected = BTreeSet::new();

    match change {
        SourceChange::Listener {
            namespace,
            name,
            previous,
        } => {
            affected.insert(ResourceRef::new(
                ResourceType::Listener,
                ListenerName::new(namespace, name).to_string(),
            ));

            let current = config.get(namespace, name);
            for listener in current.iter().chain(previous) {
                insert_backends(&mut affected, listener);
            }
        }
        SourceChange::Endpoints { namespace, service } => {
            for listener in config.list(&Selector::everything()) {
                for (name, backend) in Backend::all(&listener) {
                    if backend.references(&listener, namespace, service) {
                        affected.insert(ResourceRef::new(ResourceType::Endpoint, name.to_string()));
                    }
                }
            }
        }
    }

    affected
}

fn insert_backends(affected: &mut BTreeSet<ResourceRef>, listener: &ListenerConfig) {
    for (name, _) in Backend::all(listener) {
        let name = name.to_string();
        affected.insert(ResourceRef::new(ResourceType::Cluster, name.clone()));
        affected.insert(ResourceRef::new(ResourceType::Endpoint, name));
    }
}

/// Forwards store changes to `registry` until the store is dropped. If
/// changes were missed, every watch is refreshed.
pub async fn pump(
    config: std::sync::Arc<dyn ConfigStore>,
    mut changes: broadcast::Receiver<SourceChange>,
    registry: WatchRegistry,
) {
    async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    let affected = affected(&*config, &change);
                    tracing::trace!(?change, affected = affected.len(), "source changed");
                    registry.notify(affected);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "missed source changes, refreshing every watch");
                    registry.notify_all();
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
    .instrument(tracing::debug_span!("change_pump"))
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{
            BackendSpec, EndpointAddress, EndpointSet, ListenerSpec, LocalitySpec, PortSpec,
            RouteSpec, ServiceRef,
        },
        store::MemoryStore,
    };
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    fn backend(service: ServiceRef) -> BackendSpec {
        BackendSpec {
            weight: 1,
            service: Some(service),
            ..<_>::default()
        }
    }

    fn refs(entries: &[(ResourceType, &str)]) -> BTreeSet<ResourceRef> {
        entries
            .iter()
            .map(|(ty, name)| ResourceRef::new(*ty, *name))
            .collect()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut remote = ServiceRef::new("svc", PortSpec::name("grpc"));
        remote.namespace = Some("other".into());
        store.apply_listener(ListenerConfig::new(
            "ns",
            "l",
            ListenerSpec {
                routes: vec![RouteSpec {
                    backends: vec![
                        backend(ServiceRef::new("svc", PortSpec::name("grpc"))),
                        BackendSpec {
                            weight: 1,
                            localities: vec![LocalitySpec {
                                weight: 1,
                                priority: 0,
                                service: remote,
                            }],
                            ..<_>::default()
                        },
                    ],
                    ..<_>::default()
                }],
                ..<_>::default()
            },
        ));
        store.apply_listener(ListenerConfig::new("other", "svc", <_>::default()));
        store
    }

    #[test]
    fn endpoint_changes() {
        let store = store();
        let change = SourceChange::Endpoints {
            namespace: "other".into(),
            service: "svc".into(),
        };
        assert_eq!(
            refs(&[
                (ResourceType::Endpoint, "kxds.ns.l.0-1"),
                (ResourceType::Endpoint, "kxds.other.svc.default"),
            ]),
            affected(&store, &change)
        );

        let change = SourceChange::Endpoints {
            namespace: "ns".into(),
            service: "unused".into(),
        };
        assert!(affected(&store, &change).is_empty());
    }

    #[test]
    fn listener_changes_include_previous_backends() {
        let store = store();
        let previous = store.get("ns", "l");
        store.apply_listener(ListenerConfig::new("ns", "l", <_>::default()));

        let change = SourceChange::Listener {
            namespace: "ns".into(),
            name: "l".into(),
            previous,
        };
        assert_eq!(
            refs(&[
                (ResourceType::Listener, "ns/l"),
                (ResourceType::Cluster, "kxds.ns.l.0-0"),
                (ResourceType::Cluster, "kxds.ns.l.0-1"),
                (ResourceType::Cluster, "kxds.ns.l.default"),
                (ResourceType::Endpoint, "kxds.ns.l.0-0"),
                (ResourceType::Endpoint, "kxds.ns.l.0-1"),
                (ResourceType::Endpoint, "kxds.ns.l.default"),
            ]),
            affected(&store, &change)
        );
    }

    #[tokio::test]
    async fn pump_notifies_watches() {
        let store = Arc::new(store());
        let registry = WatchRegistry::new();
        tokio::spawn(pump(store.clone(), store.subscribe(), registry.clone()));

        let (watch, _release) = registry.build_watch();
        let name = ResourceRef::new(ResourceType::Endpoint, "kxds.ns.l.0-0");
        watch.watch(name.clone());

        store.apply_endpoints(EndpointSet {
            namespace: "ns".into(),
            name: "svc-1".into(),
            service: "svc".into(),
            endpoints: vec![EndpointAddress::ready("10.0.0.1")],
            ..<_>::default()
        });

        let mut changes = Box::pin(watch.changes());
        let change = tokio::time::timeout(std::time::Duration::from_secs(5), changes.next())
            .await
            .unwrap();
        assert_eq!(Some(name), change);
    }
}
