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

//! Discovery streams against a management server listening on a socket.

use std::{sync::Arc, time::Duration};

use kxds::{
    config::{BackendSpec, ListenerConfig, ListenerSpec, PortSpec, RouteSpec, ServiceRef},
    generated::{
        envoy::{
            config::{core::v3::Node, endpoint::v3::ClusterLoadAssignment},
            service::discovery::v3::{
                aggregated_discovery_service_client::AggregatedDiscoveryServiceClient,
                DiscoveryRequest, DiscoveryResponse,
            },
        },
        TypedMessage,
    },
    test::endpoint_set,
    xds::{server::ControlPlane, ResourceType},
    MemoryStore,
};
use prost::Message;
use tokio::sync::mpsc;

struct Stream {
    requests: mpsc::UnboundedSender<DiscoveryRequest>,
    responses: tonic::Streaming<DiscoveryResponse>,
}

impl Stream {
    async fn open(store: Arc<MemoryStore>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server =
            kxds::xds::server::spawn(listener, ControlPlane::from_store("kxds-test", store))
                .unwrap();
        tokio::spawn(server);

        let mut client = AggregatedDiscoveryServiceClient::connect(format!("http://{address}"))
            .await
            .unwrap();
        let (requests, rx) = mpsc::unbounded_channel();
        let responses = client
            .stream_aggregated_resources(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
            .await
            .unwrap()
            .into_inner();

        Self {
            requests,
            responses,
        }
    }

    fn send(&self, resource_type: ResourceType, names: &[&str], ack: Option<&DiscoveryResponse>) {
        self.requests
            .send(DiscoveryRequest {
                version_info: ack.map(|r| r.version_info.clone()).unwrap_or_default(),
                node: Some(Node {
                    id: "client-1".into(),
                    ..<_>::default()
                }),
                resource_names: names.iter().map(|name| (*name).to_owned()).collect(),
                type_url: resource_type.type_url().into(),
                response_nonce: ack.map(|r| r.nonce.clone()).unwrap_or_default(),
                error_detail: None,
            })
            .unwrap();
    }

    async fn recv(&mut self) -> DiscoveryResponse {
        tokio::time::timeout(Duration::from_secs(5), self.responses.message())
            .await
            .expect("timed out waiting for a response")
            .unwrap()
            .unwrap()
    }
}

fn listener() -> ListenerConfig {
    ListenerConfig::new(
        "default",
        "greeter",
        ListenerSpec {
            routes: vec![RouteSpec {
                backends: vec![BackendSpec {
                    weight: 1,
                    service: Some(ServiceRef::new("greeter-v1", PortSpec::name("grpc"))),
                    ..<_>::default()
                }],
                ..<_>::default()
            }],
            ..<_>::default()
        },
    )
}

fn endpoint_count(response: &DiscoveryResponse) -> usize {
    let assignment = ClusterLoadAssignment::decode(&*response.resources[0].value).unwrap();
    assignment.endpoints[0].lb_endpoints.len()
}

#[tokio::test]
async fn subscribe_and_follow_endpoint_changes() {
    let store = Arc::new(MemoryStore::new());
    store.apply_listener(listener());
    store.apply_endpoints(endpoint_set("default", "greeter-v1", 50051, &["10.0.0.1"]));
    let mut stream = Stream::open(store.clone()).await;

    stream.send(ResourceType::Listener, &["default/greeter"], None);
    let listeners = stream.recv().await;
    assert_eq!(ResourceType::Listener.type_url(), listeners.type_url);
    assert_eq!(1, listeners.resources.len());
    assert_eq!(
        "kxds-test",
        listeners.control_plane.as_ref().unwrap().identifier
    );
    stream.send(ResourceType::Listener, &["default/greeter"], Some(&listeners));

    let cluster = "kxds.default.greeter.0-0";
    stream.send(ResourceType::Endpoint, &[cluster], None);
    let endpoints = stream.recv().await;
    assert_eq!(ClusterLoadAssignment::TYPE_URL, endpoints.type_url);
    assert_eq!(1, endpoint_count(&endpoints));
    stream.send(ResourceType::Endpoint, &[cluster], Some(&endpoints));

    store.apply_endpoints(endpoint_set(
        "default",
        "greeter-v1",
        50051,
        &["10.0.0.1", "10.0.0.2"],
    ));
    let update = stream.recv().await;
    assert_eq!(ClusterLoadAssignment::TYPE_URL, update.type_url);
    assert_eq!(2, endpoint_count(&update));
    assert_ne!(endpoints.version_info, update.version_info);
    assert_ne!(endpoints.nonce, update.nonce);
}

#[tokio::test]
async fn wildcard_listeners_see_new_listeners() {
    let store = Arc::new(MemoryStore::new());
    store.apply_listener(listener());
    let mut stream = Stream::open(store.clone()).await;

    stream.send(ResourceType::Listener, &[], None);
    let first = stream.recv().await;
    assert_eq!(1, first.resources.len());
    stream.send(ResourceType::Listener, &[], Some(&first));

    store.apply_listener(ListenerConfig::new("default", "farewell", <_>::default()));
    let second = stream.recv().await;
    assert_eq!(2, second.resources.len());
    assert_ne!(first.version_info, second.version_info);
}
