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

use crate::{
    config::{BackendSpec, ListenerConfig},
    generated::envoy::config::{
        cluster::v3::{
            circuit_breakers::Thresholds,
            cluster::{ClusterDiscoveryType, DiscoveryType, EdsClusterConfig, LbPolicy},
            CircuitBreakers, Cluster,
        },
        core::v3::{config_source::ConfigSourceSpecifier, ApiVersion, ConfigSource, RoutingPriority},
    },
};

use super::naming::{BackendId, BackendName};

/// A backend of a listener: either one declared by a route, or the implicit
/// catch-all of a listener without routes.
#[derive(Clone, Copy, Debug)]
pub enum Backend<'a> {
    Declared(&'a BackendSpec),
    Default,
}

impl<'a> Backend<'a> {
    pub fn lookup(config: &'a ListenerConfig, id: BackendId) -> Option<Self> {
        match id {
            BackendId::Default => config.spec.routes.is_empty().then_some(Self::Default),
            BackendId::Route { route, backend } => config
                .spec
                .routes
                .get(route)?
                .backends
                .get(backend)
                .map(Self::Declared),
        }
    }

    /// Every backend of `config`, in route then backend order.
    pub fn all(config: &'a ListenerConfig) -> Vec<(BackendName, Self)> {
        if config.spec.routes.is_empty() {
            return vec![(
                BackendName::default_backend(&config.namespace, &config.name),
                Self::Default,
            )];
        }

        config
            .spec
            .routes
            .iter()
            .enumerate()
            .flat_map(|(route, spec)| {
                spec.backends.iter().enumerate().map(move |(index, backend)| {
                    (
                        BackendName::route(&config.namespace, &config.name, route, index),
                        Self::Declared(backend),
                    )
                })
            })
            .collect()
    }

    /// Whether this backend draws endpoints from `namespace/service`.
    pub fn references(&self, config: &ListenerConfig, namespace: &str, service: &str) -> bool {
        match self {
            Self::Default => config.namespace == namespace && config.name == service,
            Self::Declared(spec) => spec
                .service
                .iter()
                .chain(spec.localities.iter().map(|locality| &locality.service))
                .any(|reference| {
                    reference.name == service && reference.namespace_or(&config.namespace) == namespace
                }),
        }
    }

    fn max_requests(&self) -> Option<u32> {
        match self {
            Self::Declared(spec) => spec.max_requests,
            Self::Default => None,
        }
    }
}

/// Builds the EDS cluster of a backend. Its endpoints are served over the
/// same ADS stream under the cluster's own name.
pub fn build(name: &BackendName, backend: Backend<'_>) -> Cluster {
    let name = name.to_string();
    Cluster {
        cluster_discovery_type: Some(ClusterDiscoveryType::Type(DiscoveryType::Eds as i32)),
        eds_cluster_config: Some(EdsClusterConfig {
            eds_config: Some(ConfigSource {
                resource_api_version: ApiVersion::V3 as i32,
                config_source_specifier: Some(ConfigSourceSpecifier::Ads(<_>::default())),
            }),
            service_name: name.clone(),
        }),
        lb_policy: LbPolicy::RoundRobin as i32,
        circuit_breakers: backend.max_requests().map(|max_requests| CircuitBreakers {
            thresholds: vec![Thresholds {
                priority: RoutingPriority::Default as i32,
                max_requests: Some(max_requests),
            }],
        }),
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ListenerSpec, LocalitySpec, RouteSpec, ServiceRef};

    fn listener() -> ListenerConfig {
        let service = |name: &str| ServiceRef::new(name, <_>::default());
        ListenerConfig::new(
            "ns",
            "l",
            ListenerSpec {
                routes: vec![
                    RouteSpec {
                        backends: vec![BackendSpec {
                            weight: 1,
                            max_requests: Some(10),
                            service: Some(service("a")),
                            ..<_>::default()
                        }],
                        ..<_>::default()
                    },
                    RouteSpec {
                        backends: vec![
                            BackendSpec {
                                weight: 1,
                                service: Some(ServiceRef {
                                    namespace: Some("other".into()),
                                    ..service("b")
                                }),
                                ..<_>::default()
                            },
                            BackendSpec {
                                weight: 1,
                                localities: vec![LocalitySpec {
                                    weight: 1,
                                    priority: 0,
                                    service: service("c"),
                                }],
                                ..<_>::default()
                            },
                        ],
                        ..<_>::default()
                    },
                ],
                ..<_>::default()
            },
        )
    }

    #[test]
    fn enumerate_backends() {
        let config = listener();
        let names: Vec<_> = Backend::all(&config)
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(
            vec!["kxds.ns.l.0-0", "kxds.ns.l.1-0", "kxds.ns.l.1-1"],
            names
        );

        let empty = ListenerConfig::new("ns", "l", <_>::default());
        assert!(matches!(
            &Backend::all(&empty)[..],
            [(_, Backend::Default)]
        ));
    }

    #[test]
    fn lookup() {
        let config = listener();
        assert!(Backend::lookup(&config, BackendId::Route { route: 1, backend: 1 }).is_some());
        assert!(Backend::lookup(&config, BackendId::Route { route: 1, backend: 2 }).is_none());
        assert!(Backend::lookup(&config, BackendId::Route { route: 2, backend: 0 }).is_none());
        assert!(Backend::lookup(&config, BackendId::Default).is_none());
    }

    #[test]
    fn references() {
        let config = listener();
        let backends = Backend::all(&config);
        assert!(backends[0].1.references(&config, "ns", "a"));
        assert!(!backends[0].1.references(&config, "other", "a"));
        assert!(backends[1].1.references(&config, "other", "b"));
        assert!(!backends[1].1.references(&config, "ns", "b"));
        assert!(backends[2].1.references(&config, "ns", "c"));

        let empty = ListenerConfig::new("ns", "l", <_>::default());
        assert!(Backend::Default.references(&empty, "ns", "l"));
    }

    #[test]
    fn eds_cluster() {
        let config = listener();
        let (name, backend) = Backend::all(&config).remove(0);
        let cluster = build(&name, backend);

        assert_eq!("kxds.ns.l.0-0", cluster.name);
        let eds = cluster.eds_cluster_config.unwrap();
        assert_eq!("kxds.ns.l.0-0", eds.service_name);
        assert!(matches!(
            eds.eds_config.unwrap().config_source_specifier,
            Some(ConfigSourceSpecifier::Ads(_))
        ));
        assert_eq!(
            Some(10),
            cluster.circuit_breakers.unwrap().thresholds[0].max_requests
        );
    }
}
