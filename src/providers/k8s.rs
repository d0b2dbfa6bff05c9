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

//! Kubernetes provider: `ListenerConfig` custom resources and
//! `discovery.k8s.io/v1` `EndpointSlice`s, mirrored by reflectors.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::{Stream, TryStreamExt};
use k8s_openapi::{
    api::discovery::v1::EndpointSlice,
    apiextensions_apiserver::pkg::apis::apiextensions::v1::{
        CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
        CustomResourceDefinitionVersion, CustomResourceValidation,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use kube::{core::Resource, runtime::watcher::Event};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing_futures::Instrument;

use crate::{
    config::{EndpointAddress, EndpointPort, EndpointSet, ListenerConfig, ListenerSpec},
    store::{MemoryStore, Selector},
};

pub const GROUP: &str = "kxds.dev";
pub const VERSION: &str = "v1alpha1";
pub const KIND: &str = "ListenerConfig";
pub const PLURAL: &str = "listenerconfigs";
/// Label linking an `EndpointSlice` to its service.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

/// The `ListenerConfig` custom resource.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListenerResource {
    #[schemars(skip)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ListenerSpec,
}

impl ListenerResource {
    pub fn new(namespace: &str, name: &str, spec: ListenerSpec) -> Self {
        Self {
            metadata: ObjectMeta {
                namespace: Some(namespace.into()),
                name: Some(name.into()),
                ..<_>::default()
            },
            spec,
        }
    }
}

impl serde::Serialize for ListenerResource {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut obj = ser.serialize_struct("ListenerConfig", 4)?;
        obj.serialize_field("apiVersion", &Self::api_version(&()))?;
        obj.serialize_field("kind", &Self::kind(&()))?;
        obj.serialize_field("metadata", &self.metadata)?;
        obj.serialize_field("spec", &self.spec)?;
        obj.end()
    }
}

impl Resource for ListenerResource {
    type DynamicType = ();
    type Scope = kube::core::NamespaceResourceScope;

    fn group(_: &()) -> std::borrow::Cow<'_, str> {
        GROUP.into()
    }

    fn kind(_: &()) -> std::borrow::Cow<'_, str> {
        KIND.into()
    }

    fn version(_: &()) -> std::borrow::Cow<'_, str> {
        VERSION.into()
    }

    fn api_version(_: &()) -> std::borrow::Cow<'_, str> {
        format!("{GROUP}/{VERSION}").into()
    }

    fn plural(_: &()) -> std::borrow::Cow<'_, str> {
        PLURAL.into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl kube::core::crd::v1::CustomResourceExt for ListenerResource {
    fn crd() -> CustomResourceDefinition {
        let open_api_v3_schema = schemars::gen::SchemaSettings::openapi3()
            .with(|s| {
                s.inline_subschemas = true;
                s.meta_schema = None;
            })
            .with_visitor(kube_core::schema::StructuralSchemaRewriter)
            .into_generator()
            .into_root_schema_for::<Self>();

        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(Self::crd_name().into()),
                ..<_>::default()
            },
            spec: CustomResourceDefinitionSpec {
                group: GROUP.into(),
                scope: "Namespaced".into(),
                names: CustomResourceDefinitionNames {
                    plural: PLURAL.into(),
                    singular: Some("listenerconfig".into()),
                    kind: KIND.into(),
                    ..<_>::default()
                },
                versions: vec![CustomResourceDefinitionVersion {
                    name: VERSION.into(),
                    served: true,
                    storage: true,
                    schema: Some(CustomResourceValidation {
                        // schemars and k8s-openapi model the root schema
                        // differently, so convert through JSON.
                        open_api_v3_schema: serde_json::to_value(&open_api_v3_schema)
                            .ok()
                            .and_then(|value| serde_json::from_value(value).ok()),
                    }),
                    ..<_>::default()
                }],
                ..<_>::default()
            },
            status: None,
        }
    }

    fn crd_name() -> &'static str {
        "listenerconfigs.kxds.dev"
    }

    fn api_resource() -> kube::core::dynamic::ApiResource {
        kube::core::dynamic::ApiResource::erase::<Self>(&())
    }

    fn shortnames() -> &'static [&'static str] {
        &[]
    }
}

impl TryFrom<ListenerResource> for ListenerConfig {
    type Error = eyre::Error;

    fn try_from(resource: ListenerResource) -> Result<Self, Self::Error> {
        let ObjectMeta {
            namespace,
            name,
            resource_version,
            ..
        } = resource.metadata;

        Ok(Self {
            namespace: namespace.ok_or_else(|| eyre::eyre!("listener config has no namespace"))?,
            name: name.ok_or_else(|| eyre::eyre!("listener config has no name"))?,
            resource_version: resource_version.unwrap_or_default(),
            spec: resource.spec,
        })
    }
}

/// Converts an `EndpointSlice`. Returns `None` for slices that do not
/// belong to a service.
pub fn endpoint_set(slice: EndpointSlice) -> Option<EndpointSet> {
    let EndpointSlice {
        metadata,
        endpoints,
        ports,
        ..
    } = slice;
    let service = metadata.labels.as_ref()?.get(SERVICE_NAME_LABEL)?.clone();

    let ports = ports
        .unwrap_or_default()
        .into_iter()
        .filter_map(|port| {
            Some(EndpointPort {
                name: port.name,
                port: u16::try_from(port.port?).ok()?,
            })
        })
        .collect();

    let endpoints = endpoints
        .into_iter()
        .filter_map(|endpoint| {
            Some(EndpointAddress {
                address: endpoint.addresses.into_iter().next()?,
                hostname: endpoint.hostname,
                ready: endpoint
                    .conditions
                    .and_then(|conditions| conditions.ready)
                    .unwrap_or(true),
            })
        })
        .collect();

    Some(EndpointSet {
        namespace: metadata.namespace?,
        name: metadata.name?,
        service,
        resource_version: metadata.resource_version.unwrap_or_default(),
        ports,
        endpoints,
    })
}

/// Mirrors `ListenerConfig`s and `EndpointSlice`s from `namespace`, or from
/// every namespace, into `store`.
pub async fn watch(
    store: Arc<MemoryStore>,
    ready: Arc<AtomicBool>,
    namespace: Option<String>,
) -> crate::Result<()> {
    let span = tracing::info_span!("provider", kind = "kubernetes", namespace = ?namespace);
    let client = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        kube::Client::try_default(),
    )
    .instrument(span.clone())
    .await??;

    let listener_reflector =
        update_listeners(client.clone(), namespace.clone(), store.clone()).instrument(span.clone());
    let endpoint_reflector =
        update_endpoints(client, namespace, store).instrument(span.clone());
    tokio::pin!(listener_reflector);
    tokio::pin!(endpoint_reflector);

    let (mut listeners_synced, mut endpoints_synced) = (false, false);
    loop {
        let result = tokio::select! {
            result = listener_reflector.try_next() => result.map(|next| next.map(|_| listeners_synced = true)),
            result = endpoint_reflector.try_next() => result.map(|next| next.map(|_| endpoints_synced = true)),
        };

        match result {
            Ok(Some(())) => {
                if listeners_synced && endpoints_synced && !ready.swap(true, Ordering::SeqCst) {
                    tracing::info!("kubernetes sources synced");
                }
            }
            Ok(None) => break Err(eyre::eyre!("kubernetes watch stream terminated")),
            Err(error) => break Err(error),
        }
    }
}

fn api<K>(client: kube::Client, namespace: Option<&str>) -> kube::Api<K>
where
    K: Resource<Scope = kube::core::NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(namespace) => kube::Api::namespaced(client, namespace),
        None => kube::Api::all(client),
    }
}

fn listener_events(
    client: kube::Client,
    namespace: Option<&str>,
) -> impl Stream<Item = Result<Event<ListenerResource>, kube::runtime::watcher::Error>> {
    let writer = kube::runtime::reflector::store::Writer::<ListenerResource>::default();
    let stream = kube::runtime::watcher(
        api::<ListenerResource>(client, namespace),
        kube::runtime::watcher::Config::default(),
    );
    kube::runtime::reflector(writer, stream)
}

fn endpoint_slice_events(
    client: kube::Client,
    namespace: Option<&str>,
) -> impl Stream<Item = Result<Event<EndpointSlice>, kube::runtime::watcher::Error>> {
    let writer = kube::runtime::reflector::store::Writer::<EndpointSlice>::default();
    let stream = kube::runtime::watcher(
        api::<EndpointSlice>(client, namespace),
        kube::runtime::watcher::Config::default().labels(SERVICE_NAME_LABEL),
    );
    kube::runtime::reflector(writer, stream)
}

fn update_listeners(
    client: kube::Client,
    namespace: Option<String>,
    store: Arc<MemoryStore>,
) -> impl Stream<Item = crate::Result<()>> {
    async_stream::stream! {
        for await event in listener_events(client, namespace.as_deref()) {
            match event? {
                Event::Applied(resource) => {
                    tracing::debug!("received applied listener config from k8s");
                    match ListenerConfig::try_from(resource) {
                        Ok(config) => {
                            store.apply_listener(config);
                            crate::metrics::provider_events("listener", "applied").inc();
                        }
                        Err(error) => tracing::warn!(%error, "received invalid listener config from k8s"),
                    }
                }
                Event::Deleted(resource) => {
                    tracing::debug!("received deleted listener config from k8s");
                    if let (Some(namespace), Some(name)) = (&resource.metadata.namespace, &resource.metadata.name) {
                        store.delete_listener(namespace, name);
                        crate::metrics::provider_events("listener", "deleted").inc();
                    }
                }
                Event::Restarted(resources) => {
                    tracing::debug!(count = resources.len(), "received restart event for listener configs from k8s");
                    let configs: Vec<ListenerConfig> = resources
                        .into_iter()
                        .filter_map(|resource| match ListenerConfig::try_from(resource) {
                            Ok(config) => Some(config),
                            Err(error) => {
                                tracing::warn!(%error, "received invalid listener config on restart from k8s");
                                None
                            }
                        })
                        .collect();

                    let selector = namespace.as_deref().map_or_else(Selector::everything, Selector::namespace);
                    store.replace_listeners(&selector, configs);
                    crate::metrics::provider_events("listener", "restarted").inc();
                }
            }

            yield Ok(());
        }
    }
}

fn update_endpoints(
    client: kube::Client,
    namespace: Option<String>,
    store: Arc<MemoryStore>,
) -> impl Stream<Item = crate::Result<()>> {
    async_stream::stream! {
        for await event in endpoint_slice_events(client, namespace.as_deref()) {
            match event? {
                Event::Applied(slice) => {
                    tracing::trace!("received applied endpoint slice from k8s");
                    if let Some(set) = endpoint_set(slice) {
                        store.apply_endpoints(set);
                        crate::metrics::provider_events("endpoints", "applied").inc();
                    }
                }
                Event::Deleted(slice) => {
                    tracing::trace!("received deleted endpoint slice from k8s");
                    if let (Some(namespace), Some(name)) = (&slice.metadata.namespace, &slice.metadata.name) {
                        store.delete_endpoints(namespace, name);
                        crate::metrics::provider_events("endpoints", "deleted").inc();
                    }
                }
                Event::Restarted(slices) => {
                    tracing::debug!(count = slices.len(), "received restart event for endpoint slices from k8s");
                    store.replace_endpoints(
                        namespace.as_deref(),
                        slices.into_iter().filter_map(endpoint_set),
                    );
                    crate::metrics::provider_events("endpoints", "restarted").inc();
                }
            }

            yield Ok(());
        }
    }
}
