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

//! Builds the `ClusterLoadAssignment` of a backend from the endpoint sets of
//! the services it references.

use std::fmt;

use crate::{
    config::{EndpointPort, EndpointSet, PortSpec, ServiceRef},
    generated::envoy::config::{
        core::v3::{address, socket_address, Address, HealthStatus, Locality, SocketAddress},
        endpoint::v3::{lb_endpoint, ClusterLoadAssignment, Endpoint, LbEndpoint, LocalityLbEndpoints},
    },
    store::EndpointStore,
};

use super::{cluster::Backend, naming::BackendName, version::VersionBuilder, Error};

/// How a service port is picked from an endpoint set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PortSelector<'a> {
    Name(&'a str),
    Number(u16),
    /// The first port the set declares.
    First,
}

impl<'a> PortSelector<'a> {
    fn from_spec(spec: &'a PortSpec) -> Result<Self, Error> {
        match (&spec.name, spec.number) {
            (Some(name), _) => Ok(Self::Name(name)),
            (None, Some(number)) => Ok(Self::Number(number)),
            (None, None) => Err(Error::malformed("service port must set a name or a number")),
        }
    }

    fn select<'s>(&self, ports: &'s [EndpointPort]) -> Option<&'s EndpointPort> {
        match self {
            Self::Name(name) => ports.iter().find(|port| port.name.as_deref() == Some(*name)),
            Self::Number(number) => ports.iter().find(|port| port.port == *number),
            Self::First => ports.first(),
        }
    }
}

impl fmt::Display for PortSelector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "`{name}`"),
            Self::Number(number) => write!(f, "{number}"),
            Self::First => f.write_str("(any)"),
        }
    }
}

/// One locality group to resolve.
struct LocalityTarget<'a> {
    namespace: &'a str,
    service: &'a str,
    port: PortSelector<'a>,
    weight: u32,
    priority: u32,
}

impl<'a> LocalityTarget<'a> {
    fn service(
        service: &'a ServiceRef,
        listener_namespace: &'a str,
        weight: u32,
        priority: u32,
    ) -> Result<Self, Error> {
        Ok(Self {
            namespace: service.namespace_or(listener_namespace),
            service: &service.name,
            port: PortSelector::from_spec(&service.port)?,
            weight,
            priority,
        })
    }
}

/// Resolves `backend` of the listener in `listener_namespace` into a load
/// assignment named `name`, adding the version of every endpoint set it
/// read to `versions`.
///
/// A backend referencing a single service yields one locality at priority 0
/// with weight 1. When a backend sets both a service and localities, the
/// service is used. Only ready endpoints are included, and a locality
/// without any is still emitted, empty, so that clients fail over to the
/// next priority.
pub fn build(
    name: &BackendName,
    listener_namespace: &str,
    backend: Backend<'_>,
    store: &dyn EndpointStore,
    versions: &mut VersionBuilder,
) -> Result<ClusterLoadAssignment, Error> {
    let targets = match backend {
        Backend::Default => vec![LocalityTarget {
            namespace: listener_namespace,
            service: &name.listener,
            port: PortSelector::First,
            weight: 1,
            priority: 0,
        }],
        Backend::Declared(spec) => match (&spec.service, &spec.localities[..]) {
            (Some(service), _) => vec![LocalityTarget::service(service, listener_namespace, 1, 0)?],
            (None, []) => return Err(Error::UnsupportedLocalityConfiguration),
            (None, localities) => localities
                .iter()
                .map(|locality| {
                    LocalityTarget::service(
                        &locality.service,
                        listener_namespace,
                        locality.weight,
                        locality.priority,
                    )
                })
                .collect::<Result<Vec<_>, Error>>()?,
        },
    };

    Ok(ClusterLoadAssignment {
        cluster_name: name.to_string(),
        endpoints: targets
            .iter()
            .enumerate()
            .map(|(index, target)| locality_endpoints(index, target, store, versions))
            .collect::<Result<_, _>>()?,
    })
}

fn locality_endpoints(
    index: usize,
    target: &LocalityTarget<'_>,
    store: &dyn EndpointStore,
    versions: &mut VersionBuilder,
) -> Result<LocalityLbEndpoints, Error> {
    let mut lb_endpoints = Vec::new();

    for set in store.list(target.namespace, target.service) {
        versions.add(set.resource_version.clone());
        lb_endpoints.extend(ready_endpoints(&set, target)?);
    }

    Ok(LocalityLbEndpoints {
        locality: Some(Locality {
            region: String::new(),
            zone: format!("{}/{}", target.namespace, target.service),
            sub_zone: index.to_string(),
        }),
        lb_endpoints,
        load_balancing_weight: Some(target.weight),
        priority: target.priority,
    })
}

fn ready_endpoints(set: &EndpointSet, target: &LocalityTarget<'_>) -> Result<Vec<LbEndpoint>, Error> {
    // A scaled-to-zero service publishes a set with neither ports nor endpoints.
    if set.ready_endpoints().next().is_none() {
        return Ok(Vec::new());
    }

    let port = target
        .port
        .select(&set.ports)
        .ok_or_else(|| Error::UnresolvedPort {
            namespace: target.namespace.to_owned(),
            service: target.service.to_owned(),
            port: target.port.to_string(),
        })?;

    Ok(set
        .ready_endpoints()
        .map(|endpoint| LbEndpoint {
            health_status: HealthStatus::Healthy as i32,
            load_balancing_weight: None,
            host_identifier: Some(lb_endpoint::HostIdentifier::Endpoint(Endpoint {
                address: Some(Address {
                    address: Some(address::Address::SocketAddress(SocketAddress {
                        protocol: socket_address::Protocol::Tcp as i32,
                        address: endpoint.address.clone(),
                        port_specifier: Some(socket_address::PortSpecifier::PortValue(
                            port.port.into(),
                        )),
                    })),
                }),
                hostname: endpoint.hostname.clone().unwrap_or_default(),
            })),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BackendSpec, EndpointAddress, LocalitySpec},
        store::MemoryStore,
    };
    use pretty_assertions::assert_eq;

    fn endpoint_set(name: &str, service: &str, addresses: Vec<EndpointAddress>) -> EndpointSet {
        EndpointSet {
            namespace: "ns".into(),
            name: name.into(),
            service: service.into(),
            resource_version: format!("{name}-1"),
            ports: vec![
                EndpointPort {
                    name: Some("http".into()),
                    port: 8080,
                },
                EndpointPort {
                    name: Some("grpc".into()),
                    port: 50051,
                },
            ],
            endpoints: addresses,
        }
    }

    fn addresses(assignment: &LocalityLbEndpoints) -> Vec<(String, u32)> {
        assignment
            .lb_endpoints
            .iter()
            .map(|endpoint| match &endpoint.host_identifier {
                Some(lb_endpoint::HostIdentifier::Endpoint(Endpoint {
                    address:
                        Some(Address {
                            address: Some(address::Address::SocketAddress(socket)),
                        }),
                    ..
                })) => match socket.port_specifier {
                    Some(socket_address::PortSpecifier::PortValue(port)) => {
                        (socket.address.clone(), port)
                    }
                    _ => panic!("expected a port value"),
                },
                _ => panic!("expected a socket address"),
            })
            .collect()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.apply_endpoints(endpoint_set(
            "a-1",
            "a",
            vec![
                EndpointAddress::ready("10.0.0.1"),
                EndpointAddress::not_ready("10.0.0.2"),
            ],
        ));
        store.apply_endpoints(endpoint_set(
            "a-2",
            "a",
            vec![EndpointAddress::ready("10.0.0.3")],
        ));
        store.apply_endpoints(endpoint_set(
            "b-1",
            "b",
            vec![EndpointAddress::not_ready("10.0.1.1")],
        ));
        store
    }

    fn name() -> BackendName {
        BackendName::route("ns", "l", 0, 0)
    }

    #[test]
    fn single_service() {
        let store = store();
        let backend = BackendSpec {
            weight: 1,
            service: Some(ServiceRef::new("a", PortSpec::name("grpc"))),
            ..<_>::default()
        };
        let mut versions = VersionBuilder::new();
        let assignment =
            build(&name(), "ns", Backend::Declared(&backend), &store, &mut versions).unwrap();

        assert_eq!("kxds.ns.l.0-0", assignment.cluster_name);
        assert_eq!(1, assignment.endpoints.len());
        let locality = &assignment.endpoints[0];
        assert_eq!(0, locality.priority);
        assert_eq!(Some(1), locality.load_balancing_weight);
        assert_eq!(
            vec![("10.0.0.1".to_owned(), 50051), ("10.0.0.3".to_owned(), 50051)],
            addresses(locality)
        );

        let mut expected = VersionBuilder::new();
        expected.extend(["a-2-1", "a-1-1"]);
        assert_eq!(expected.build(), versions.build());
    }

    #[test]
    fn port_by_number() {
        let store = store();
        let backend = BackendSpec {
            weight: 1,
            service: Some(ServiceRef::new("a", PortSpec::number(8080))),
            ..<_>::default()
        };
        let assignment = build(
            &name(),
            "ns",
            Backend::Declared(&backend),
            &store,
            &mut <_>::default(),
        )
        .unwrap();
        assert_eq!(8080, addresses(&assignment.endpoints[0])[0].1);
    }

    #[test]
    fn unresolved_ports() {
        let store = store();
        for port in [PortSpec::name("admin"), PortSpec::number(9090)] {
            let backend = BackendSpec {
                weight: 1,
                service: Some(ServiceRef::new("a", port)),
                ..<_>::default()
            };
            assert!(matches!(
                build(&name(), "ns", Backend::Declared(&backend), &store, &mut <_>::default()),
                Err(Error::UnresolvedPort { .. })
            ));
        }

        let backend = BackendSpec {
            weight: 1,
            service: Some(ServiceRef::new("a", PortSpec::default())),
            ..<_>::default()
        };
        assert!(matches!(
            build(&name(), "ns", Backend::Declared(&backend), &store, &mut <_>::default()),
            Err(Error::MalformedSpec(_))
        ));
    }

    #[test]
    fn localities_keep_weight_and_priority() {
        let store = store();
        let backend = BackendSpec {
            weight: 1,
            localities: vec![
                LocalitySpec {
                    weight: 80,
                    priority: 0,
                    service: ServiceRef::new("b", PortSpec::name("grpc")),
                },
                LocalitySpec {
                    weight: 20,
                    priority: 1,
                    service: ServiceRef::new("a", PortSpec::name("grpc")),
                },
            ],
            ..<_>::default()
        };
        let assignment = build(
            &name(),
            "ns",
            Backend::Declared(&backend),
            &store,
            &mut <_>::default(),
        )
        .unwrap();

        assert_eq!(2, assignment.endpoints.len());
        let (first, second) = (&assignment.endpoints[0], &assignment.endpoints[1]);
        assert_eq!((Some(80), 0), (first.load_balancing_weight, first.priority));
        assert_eq!((Some(20), 1), (second.load_balancing_weight, second.priority));
        // No ready endpoints still yields a group.
        assert!(first.lb_endpoints.is_empty());
        assert_eq!(2, second.lb_endpoints.len());
        assert_eq!("ns/b", first.locality.as_ref().unwrap().zone);
        assert_eq!("1", second.locality.as_ref().unwrap().sub_zone);
    }

    #[test]
    fn scaled_to_zero_service_fails_over() {
        let store = store();
        store.apply_endpoints(EndpointSet {
            ports: Vec::new(),
            ..endpoint_set("primary-1", "primary", Vec::new())
        });
        let backend = BackendSpec {
            weight: 1,
            localities: vec![
                LocalitySpec {
                    weight: 1,
                    priority: 0,
                    service: ServiceRef::new("primary", PortSpec::name("grpc")),
                },
                LocalitySpec {
                    weight: 1,
                    priority: 1,
                    service: ServiceRef::new("a", PortSpec::name("grpc")),
                },
            ],
            ..<_>::default()
        };
        let assignment = build(
            &name(),
            "ns",
            Backend::Declared(&backend),
            &store,
            &mut <_>::default(),
        )
        .unwrap();

        let groups: Vec<_> = assignment
            .endpoints
            .iter()
            .map(|locality| (locality.priority, locality.lb_endpoints.len()))
            .collect();
        assert_eq!(vec![(0, 0), (1, 2)], groups);
    }

    #[test]
    fn missing_service_yields_empty_group() {
        let store = store();
        let backend = BackendSpec {
            weight: 1,
            service: Some(ServiceRef::new("missing", PortSpec::name("grpc"))),
            ..<_>::default()
        };
        let assignment = build(
            &name(),
            "ns",
            Backend::Declared(&backend),
            &store,
            &mut <_>::default(),
        )
        .unwrap();
        assert_eq!(1, assignment.endpoints.len());
        assert!(assignment.endpoints[0].lb_endpoints.is_empty());
    }

    #[test]
    fn neither_service_nor_localities() {
        let backend = BackendSpec {
            weight: 1,
            ..<_>::default()
        };
        assert_eq!(
            Err(Error::UnsupportedLocalityConfiguration),
            build(
                &name(),
                "ns",
                Backend::Declared(&backend),
                &store(),
                &mut <_>::default()
            )
        );
    }

    #[test]
    fn service_wins_over_localities() {
        let backend = BackendSpec {
            weight: 1,
            service: Some(ServiceRef::new("a", PortSpec::name("grpc"))),
            localities: vec![LocalitySpec {
                weight: 1,
                priority: 3,
                service: ServiceRef::new("b", PortSpec::name("grpc")),
            }],
            ..<_>::default()
        };
        let assignment = build(
            &name(),
            "ns",
            Backend::Declared(&backend),
            &store(),
            &mut <_>::default(),
        )
        .unwrap();
        assert_eq!(1, assignment.endpoints.len());
        assert_eq!(0, assignment.endpoints[0].priority);
        assert_eq!("ns/a", assignment.endpoints[0].locality.as_ref().unwrap().zone);
    }

    #[test]
    fn default_backend_uses_first_port() {
        let store = store();
        let name = BackendName::default_backend("ns", "a");
        let assignment =
            build(&name, "ns", Backend::Default, &store, &mut <_>::default()).unwrap();
        assert_eq!(8080, addresses(&assignment.endpoints[0])[0].1);
    }
}
