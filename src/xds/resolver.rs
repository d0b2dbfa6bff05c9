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

//! Answers discovery requests from the configuration and endpoint stores.

use std::{collections::BTreeSet, sync::Arc};

use prost_types::Any;

use crate::{
    config::ListenerConfig,
    generated::TypedMessage,
    store::{ConfigStore, EndpointStore, Selector},
};

use super::{
    cluster::Backend,
    naming::{BackendName, ListenerName},
    resource::is_wildcard_request,
    version::VersionBuilder,
    Error, ResourceType,
};

/// A request for resources of one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveRequest {
    pub resource_type: ResourceType,
    /// Requested names. Empty, or containing `*`, requests every resource.
    pub names: Vec<String>,
}

impl ResolveRequest {
    pub fn new(resource_type: ResourceType, names: Vec<String>) -> Self {
        Self {
            resource_type,
            names,
        }
    }

    /// Looks up the resource type by its type URL.
    pub fn from_type_url(type_url: &str, names: Vec<String>) -> Result<Self, Error> {
        Ok(Self::new(type_url.parse()?, names))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolveResponse {
    pub resource_type: ResourceType,
    pub resources: Vec<Any>,
    pub version_info: String,
}

impl ResolveResponse {
    pub fn type_url(&self) -> &'static str {
        self.resource_type.type_url()
    }
}

/// Resolves requested resources against the source stores.
#[derive(Clone)]
pub struct Resolver {
    config: Arc<dyn ConfigStore>,
    endpoints: Arc<dyn EndpointStore>,
}

impl Resolver {
    pub fn new(config: Arc<dyn ConfigStore>, endpoints: Arc<dyn EndpointStore>) -> Self {
        Self { config, endpoints }
    }

    /// A resolver reading both kinds of source object from one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ConfigStore + EndpointStore + 'static,
    {
        Self::new(store.clone(), store)
    }

    pub fn config_store(&self) -> &dyn ConfigStore {
        &*self.config
    }

    /// Resolves every requested resource. Any failure, including a single
    /// missing source object, fails the whole request.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, Error> {
        let mut versions = VersionBuilder::new();
        let wildcard = is_wildcard_request(&request.names);
        let names: BTreeSet<&str> = request.names.iter().map(String::as_str).collect();

        let resources = match request.resource_type {
            ResourceType::Listener => self.listeners(wildcard, &names, &mut versions),
            ResourceType::Cluster => self.clusters(wildcard, &names, &mut versions),
            ResourceType::Endpoint => self.endpoints(wildcard, &names, &mut versions),
        }
        .map_err(|error| {
            super::metrics::resolve_errors(request.resource_type.type_url(), error.kind()).inc();
            error
        })?;

        Ok(ResolveResponse {
            resource_type: request.resource_type,
            resources,
            version_info: versions.build(),
        })
    }

    fn listeners(
        &self,
        wildcard: bool,
        names: &BTreeSet<&str>,
        versions: &mut VersionBuilder,
    ) -> Result<Vec<Any>, Error> {
        let configs = if wildcard {
            self.config.list(&Selector::everything())
        } else {
            names
                .iter()
                .map(|name| {
                    let name: ListenerName = name.parse()?;
                    self.listener_config(&name.namespace, &name.name)
                })
                .collect::<Result<_, _>>()?
        };

        configs
            .iter()
            .map(|config| {
                versions.add(config.resource_version.clone());
                Ok(super::listener::build(config)?.to_any())
            })
            .collect()
    }

    fn clusters(
        &self,
        wildcard: bool,
        names: &BTreeSet<&str>,
        versions: &mut VersionBuilder,
    ) -> Result<Vec<Any>, Error> {
        let mut resources = Vec::new();
        self.for_each_backend(wildcard, names, |config, name, backend| {
            versions.add(config.resource_version.clone());
            resources.push(super::cluster::build(name, backend).to_any());
            Ok(())
        })?;
        Ok(resources)
    }

    fn endpoints(
        &self,
        wildcard: bool,
        names: &BTreeSet<&str>,
        versions: &mut VersionBuilder,
    ) -> Result<Vec<Any>, Error> {
        let mut resources = Vec::new();
        self.for_each_backend(wildcard, names, |config, name, backend| {
            versions.add(config.resource_version.clone());
            let assignment = super::endpoint::build(
                name,
                &config.namespace,
                backend,
                &*self.endpoints,
                versions,
            )?;
            resources.push(assignment.to_any());
            Ok(())
        })?;
        Ok(resources)
    }

    /// Calls `f` with every requested backend and its owning listener.
    fn for_each_backend(
        &self,
        wildcard: bool,
        names: &BTreeSet<&str>,
        mut f: impl FnMut(&ListenerConfig, &BackendName, Backend<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        if wildcard {
            for config in self.config.list(&Selector::everything()) {
                for (name, backend) in Backend::all(&config) {
                    f(&config, &name, backend)?;
                }
            }
            return Ok(());
        }

        for name in names {
            let name: BackendName = name.parse()?;
            let config = self.listener_config(&name.namespace, &name.listener)?;
            let backend = Backend::lookup(&config, name.id).ok_or_else(|| Error::SourceNotFound {
                kind: "backend",
                namespace: name.namespace.clone(),
                name: name.to_string(),
            })?;
            f(&config, &name, backend)?;
        }

        Ok(())
    }

    fn listener_config(&self, namespace: &str, name: &str) -> Result<Arc<ListenerConfig>, Error> {
        self.config
            .get(namespace, name)
            .ok_or_else(|| Error::listener_not_found(namespace, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{
            BackendSpec, EndpointAddress, EndpointPort, EndpointSet, ListenerSpec, PortSpec,
            RouteSpec, ServiceRef,
        },
        generated::envoy::config::{
            cluster::v3::Cluster,
            endpoint::v3::ClusterLoadAssignment,
            listener::v3::Listener,
            route::v3::{route, route_action},
        },
        store::MemoryStore,
    };
    use pretty_assertions::assert_eq;
    use prost::Message;

    fn my_listener() -> ListenerConfig {
        ListenerConfig::new(
            "default-ns",
            "my-listener",
            ListenerSpec {
                routes: vec![RouteSpec {
                    backends: vec![BackendSpec {
                        weight: 1,
                        service: Some(ServiceRef::new("svcA", PortSpec::name("grpc"))),
                        ..<_>::default()
                    }],
                    ..<_>::default()
                }],
                ..<_>::default()
            },
        )
    }

    fn svc_a(addresses: &[&str]) -> EndpointSet {
        EndpointSet {
            namespace: "default-ns".into(),
            name: "svcA-abc".into(),
            service: "svcA".into(),
            resource_version: String::new(),
            ports: vec![EndpointPort {
                name: Some("grpc".into()),
                port: 50051,
            }],
            endpoints: addresses.iter().map(|a| EndpointAddress::ready(*a)).collect(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, Resolver) {
        let store = Arc::new(MemoryStore::new());
        store.apply_listener(my_listener());
        store.apply_endpoints(svc_a(&["10.0.0.1"]));
        let resolver = Resolver::from_store(store.clone());
        (store, resolver)
    }

    fn request(resource_type: ResourceType, names: &[&str]) -> ResolveRequest {
        ResolveRequest::new(resource_type, names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn concrete_example() {
        let (_, resolver) = setup();
        let response = resolver
            .resolve(&request(ResourceType::Listener, &["default-ns/my-listener"]))
            .unwrap();

        assert_eq!(1, response.resources.len());
        assert_eq!(Listener::TYPE_URL, response.resources[0].type_url);
        let listener = Listener::decode(&*response.resources[0].value).unwrap();
        let manager = crate::test::http_connection_manager(&listener);
        let routes = crate::test::routes(&manager);

        let route::Action::Route(action) = routes[0].action.clone().unwrap();
        let Some(route_action::ClusterSpecifier::WeightedClusters(weighted)) =
            action.cluster_specifier
        else {
            panic!("expected weighted clusters");
        };
        assert_eq!(Some(1), weighted.total_weight);
        assert_eq!(1, weighted.clusters.len());
        assert_eq!("kxds.default-ns.my-listener.0-0", weighted.clusters[0].name);
    }

    #[test]
    fn clusters_and_endpoints() {
        let (_, resolver) = setup();
        let name = "kxds.default-ns.my-listener.0-0";

        let response = resolver
            .resolve(&request(ResourceType::Cluster, &[name]))
            .unwrap();
        let cluster = Cluster::decode(&*response.resources[0].value).unwrap();
        assert_eq!(name, cluster.name);

        let response = resolver
            .resolve(&request(ResourceType::Endpoint, &[name]))
            .unwrap();
        let assignment = ClusterLoadAssignment::decode(&*response.resources[0].value).unwrap();
        assert_eq!(name, assignment.cluster_name);
        assert_eq!(1, assignment.endpoints[0].lb_endpoints.len());
    }

    #[test]
    fn versions_are_stable_and_sensitive() {
        let (store, resolver) = setup();
        let endpoints = request(ResourceType::Endpoint, &["kxds.default-ns.my-listener.0-0"]);
        let listeners = request(ResourceType::Listener, &["default-ns/my-listener"]);

        let first = resolver.resolve(&endpoints).unwrap().version_info;
        assert_eq!(first, resolver.resolve(&endpoints).unwrap().version_info);
        let listener_version = resolver.resolve(&listeners).unwrap().version_info;

        store.apply_endpoints(svc_a(&["10.0.0.1", "10.0.0.2"]));
        let second = resolver.resolve(&endpoints).unwrap().version_info;
        assert_ne!(first, second);
        // Listener resources do not depend on endpoints.
        assert_eq!(
            listener_version,
            resolver.resolve(&listeners).unwrap().version_info
        );

        let mut config = my_listener();
        config.spec.routes[0].backends[0].max_requests = Some(5);
        store.apply_listener(config);
        assert_ne!(second, resolver.resolve(&endpoints).unwrap().version_info);
        assert_ne!(
            listener_version,
            resolver.resolve(&listeners).unwrap().version_info
        );
    }

    #[test]
    fn missing_source_fails_the_batch() {
        let (_, resolver) = setup();
        assert_eq!(
            Err(Error::listener_not_found("default-ns", "missing")),
            resolver.resolve(&request(
                ResourceType::Listener,
                &["default-ns/my-listener", "default-ns/missing"],
            ))
        );

        assert!(matches!(
            resolver.resolve(&request(
                ResourceType::Cluster,
                &["kxds.default-ns.my-listener.0-1"]
            )),
            Err(Error::SourceNotFound { kind: "backend", .. })
        ));
    }

    #[test]
    fn malformed_names_and_types() {
        let (_, resolver) = setup();
        assert!(matches!(
            resolver.resolve(&request(ResourceType::Cluster, &["other.default-ns.l.0-0"])),
            Err(Error::MalformedResourceName(_))
        ));
        assert!(matches!(
            ResolveRequest::from_type_url("type.googleapis.com/unknown", vec![]),
            Err(Error::UnknownResourceType(_))
        ));
    }

    #[test]
    fn wildcard() {
        let (store, resolver) = setup();
        store.apply_listener(ListenerConfig::new("other", "plain", <_>::default()));

        let response = resolver
            .resolve(&request(ResourceType::Listener, &[]))
            .unwrap();
        assert_eq!(2, response.resources.len());

        let response = resolver
            .resolve(&request(ResourceType::Cluster, &["*"]))
            .unwrap();
        let names: Vec<_> = response
            .resources
            .iter()
            .map(|any| Cluster::decode(&*any.value).unwrap().name)
            .collect();
        assert_eq!(
            vec![
                "kxds.default-ns.my-listener.0-0".to_owned(),
                "kxds.other.plain.default".to_owned(),
            ],
            names
        );
    }

    #[test]
    fn renaming_a_listener_changes_the_version() {
        let store = Arc::new(MemoryStore::new());
        let resolver = Resolver::from_store(store.clone());
        store.apply_listener(ListenerConfig::new("ns", "a", <_>::default()));
        let before = resolver
            .resolve(&request(ResourceType::Listener, &[]))
            .unwrap();

        store.delete_listener("ns", "a");
        store.apply_listener(ListenerConfig::new("ns", "b", <_>::default()));
        let after = resolver
            .resolve(&request(ResourceType::Listener, &[]))
            .unwrap();

        assert_ne!(before.resources, after.resources);
        assert_ne!(before.version_info, after.version_info);
    }
}
