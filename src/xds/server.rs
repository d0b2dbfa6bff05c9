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

//! The aggregated discovery service: drives state-of-the-world streams by
//! resolving what clients request and pushing updates as sources change.

use std::{collections::BTreeSet, sync::Arc};

use enum_map::EnumMap;
use futures::{Stream, TryFutureExt};
use tokio_stream::StreamExt;
use tracing_futures::Instrument;

use crate::{
    generated::envoy::{
        config::core::v3::ControlPlane as ControlPlaneId,
        service::discovery::v3::{
            aggregated_discovery_service_server::{
                AggregatedDiscoveryService, AggregatedDiscoveryServiceServer,
            },
            DiscoveryRequest, DiscoveryResponse,
        },
    },
    store::MemoryStore,
};

use super::{
    is_wildcard_request,
    metrics::{self, StreamConnectionMetrics},
    ResolveRequest, Resolver, ResourceRef, ResourceType, Watch, WatchRegistry,
};

/// Serves `control_plane` on `listener`.
#[tracing::instrument(skip_all)]
pub fn spawn(
    listener: tokio::net::TcpListener,
    control_plane: ControlPlane,
) -> std::io::Result<impl std::future::Future<Output = crate::Result<()>>> {
    let address = listener.local_addr()?;
    let server = AggregatedDiscoveryServiceServer::new(control_plane);
    let server = tonic::transport::Server::builder().add_service(server);
    tracing::info!("serving management server on port `{}`", address.port());
    Ok(server
        .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
        .map_err(From::from))
}

#[derive(Clone)]
pub struct ControlPlane {
    id: Arc<str>,
    resolver: Resolver,
    registry: WatchRegistry,
}

impl ControlPlane {
    pub fn new(id: impl Into<Arc<str>>, resolver: Resolver, registry: WatchRegistry) -> Self {
        Self {
            id: id.into(),
            resolver,
            registry,
        }
    }

    /// Creates a control plane serving `store`, and spawns the task
    /// forwarding its changes to connected streams.
    pub fn from_store(id: impl Into<Arc<str>>, store: Arc<MemoryStore>) -> Self {
        let registry = WatchRegistry::new();
        tokio::spawn(super::changes::pump(
            store.clone(),
            store.subscribe(),
            registry.clone(),
        ));
        Self::new(id, Resolver::from_store(store), registry)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub async fn stream_resources<S>(
        &self,
        mut streaming: S,
    ) -> Result<impl Stream<Item = Result<DiscoveryResponse, tonic::Status>> + Send, tonic::Status>
    where
        S: Stream<Item = Result<DiscoveryRequest, tonic::Status>>
            + Send
            + std::marker::Unpin
            + 'static,
    {
        tracing::trace!("starting stream");
        let message = streaming.next().await.ok_or_else(|| {
            tracing::error!("No message found");
            tonic::Status::invalid_argument("No message found")
        })??;

        let node_id = match &message.node {
            Some(node) if !node.id.is_empty() => node.id.clone(),
            _ => {
                tracing::error!("Node identifier was not found");
                return Err(tonic::Status::invalid_argument("Node identifier required"));
            }
        };
        message.type_url.parse::<ResourceType>()?;

        let (watch, release) = self.registry.build_watch();
        let mut changes = Box::pin(watch.changes());
        let mut stream = StreamState::new(self.clone(), node_id.clone(), watch);

        tracing::debug!(id = %node_id, r#type = %message.type_url, "initial request");

        Ok(Box::pin(
            async_stream::stream! {
                let _metrics = StreamConnectionMetrics::new();
                let _release = release;

                if let Some(response) = stream.on_request(message) {
                    yield Ok::<_, tonic::Status>(response);
                }

                loop {
                    tokio::select! {
                        change = changes.next() => {
                            let Some(resource) = change else {
                                break;
                            };

                            if let Some(response) = stream.on_change(resource) {
                                yield Ok::<_, tonic::Status>(response);
                            }
                        }
                        new_message = streaming.next() => {
                            let new_message = match new_message.transpose() {
                                Ok(Some(value)) => value,
                                Ok(None) => break,
                                Err(error) => {
                                    tracing::error!(%error, "error receiving message");
                                    break;
                                }
                            };

                            if let Some(response) = stream.on_request(new_message) {
                                yield Ok::<_, tonic::Status>(response);
                            }
                        }
                    }
                }

                tracing::debug!("terminating stream");
            }
            .instrument(tracing::info_span!("xds_stream", node.id = %node_id)),
        ))
    }
}

#[tonic::async_trait]
impl AggregatedDiscoveryService for ControlPlane {
    type StreamAggregatedResourcesStream =
        std::pin::Pin<Box<dyn Stream<Item = Result<DiscoveryResponse, tonic::Status>> + Send>>;

    #[tracing::instrument(skip_all)]
    async fn stream_aggregated_resources(
        &self,
        request: tonic::Request<tonic::Streaming<DiscoveryRequest>>,
    ) -> Result<tonic::Response<Self::StreamAggregatedResourcesStream>, tonic::Status> {
        Ok(tonic::Response::new(Box::pin(
            self.stream_resources(request.into_inner()).await?,
        )))
    }
}

/// What a stream has requested of one resource type.
#[derive(Default)]
struct Subscription {
    requested: bool,
    wildcard: bool,
    names: BTreeSet<String>,
    nonce: Option<String>,
}

impl Subscription {
    fn request(&self) -> Vec<String> {
        if self.wildcard {
            Vec::new()
        } else {
            self.names.iter().cloned().collect()
        }
    }
}

/// Per-stream protocol state.
struct StreamState {
    control_plane: ControlPlane,
    node_id: String,
    watch: Watch,
    subscriptions: EnumMap<ResourceType, Subscription>,
}

impl StreamState {
    fn new(control_plane: ControlPlane, node_id: String, watch: Watch) -> Self {
        Self {
            control_plane,
            node_id,
            watch,
            subscriptions: <_>::default(),
        }
    }

    /// Handles a client request, returning the response to send, if any.
    fn on_request(&mut self, request: DiscoveryRequest) -> Option<DiscoveryResponse> {
        let resource_type = match request.type_url.parse::<ResourceType>() {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(%error, url = %request.type_url, "unknown resource type");
                return None;
            }
        };
        let type_url = resource_type.type_url();
        metrics::discovery_requests(&self.node_id, type_url).inc();

        let subscription = &mut self.subscriptions[resource_type];
        if let Some(nonce) = &subscription.nonce {
            if !request.response_nonce.is_empty() && request.response_nonce != *nonce {
                tracing::trace!(nonce = %request.response_nonce, "ignoring stale nonce");
                return None;
            }
        }

        if let Some(error) = &request.error_detail {
            metrics::nacks(&self.node_id, type_url).inc();
            tracing::error!(
                nonce = %request.response_nonce,
                version = %request.version_info,
                error = %error.message,
                r#type = %resource_type,
                "NACK"
            );
            return None;
        }

        let wildcard = is_wildcard_request(&request.resource_names);
        let names: BTreeSet<String> = if wildcard {
            BTreeSet::new()
        } else {
            request.resource_names.into_iter().collect()
        };

        let unchanged =
            subscription.requested && subscription.wildcard == wildcard && subscription.names == names;
        subscription.requested = true;
        subscription.wildcard = wildcard;
        subscription.names = names;

        if wildcard {
            self.watch.watch(ResourceRef::wildcard(resource_type));
        } else {
            for name in &subscription.names {
                self.watch.watch(ResourceRef::new(resource_type, name.clone()));
            }
        }

        if unchanged {
            tracing::trace!(nonce = %request.response_nonce, r#type = %resource_type, "ACK");
            return None;
        }

        let request = ResolveRequest::new(resource_type, subscription.request());
        self.respond(request)
    }

    /// Handles a changed resource, returning the update to push, if any.
    fn on_change(&mut self, resource: ResourceRef) -> Option<DiscoveryResponse> {
        let resource_type = resource.resource_type;
        let subscription = &self.subscriptions[resource_type];
        if !subscription.requested {
            return None;
        }

        let names = if resource_type.is_full_state() || resource.is_wildcard() {
            subscription.request()
        } else if subscription.wildcard || subscription.names.contains(&resource.name) {
            vec![resource.name]
        } else {
            return None;
        };

        tracing::trace!(r#type = %resource_type, "sending new discovery response");
        self.respond(ResolveRequest::new(resource_type, names))
    }

    fn respond(&mut self, request: ResolveRequest) -> Option<DiscoveryResponse> {
        let resource_type = request.resource_type;
        let resolved = match self.control_plane.resolver.resolve(&request) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::warn!(%error, r#type = %resource_type, names = ?request.names, "failed to resolve resources");
                return None;
            }
        };

        let response = DiscoveryResponse {
            version_info: resolved.version_info,
            resources: resolved.resources,
            canary: false,
            type_url: resource_type.type_url().to_owned(),
            nonce: uuid::Uuid::new_v4().to_string(),
            control_plane: Some(ControlPlaneId {
                identifier: self.control_plane.id.to_string(),
            }),
        };

        tracing::trace!(
            version = &*response.version_info,
            r#type = &*response.type_url,
            nonce = &*response.nonce,
            resources = response.resources.len(),
            "discovery response"
        );
        metrics::discovery_responses(&self.node_id, &response.type_url).inc();
        self.subscriptions[resource_type].nonce = Some(response.nonce.clone());

        Some(response)
    }
}
