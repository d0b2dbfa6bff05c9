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

use std::sync::{atomic::AtomicBool, Arc};

use crate::{store::MemoryStore, xds::server::ControlPlane};

pub const PORT: u16 = 18000;

/// Runs kxds as an xDS management server, using `provider` as the source
/// of listener configurations and endpoints.
#[derive(clap::Args, Clone)]
pub struct Manage {
    /// The port to serve the aggregated discovery service on.
    #[clap(short, long, env = "KXDS_PORT", default_value_t = PORT)]
    pub port: u16,
    /// Identifier reported to clients as the control plane's identity.
    #[clap(long, env = "KXDS_ID", default_value = "kxds")]
    pub id: String,
    /// The configuration source for the management server.
    #[clap(subcommand)]
    pub provider: Providers,
}

/// The available source providers.
#[derive(Clone, clap::Subcommand)]
pub enum Providers {
    /// Watches `ListenerConfig` resources and `EndpointSlice`s.
    Kubernetes {
        /// Only watch this namespace. Every namespace is watched if omitted.
        #[clap(short, long, env = "KXDS_NAMESPACE")]
        namespace: Option<String>,
    },

    /// Watches for changes to the file located at `path`.
    File {
        /// The path to the source document.
        path: std::path::PathBuf,
    },
}

impl Manage {
    pub async fn manage(
        &self,
        store: Arc<MemoryStore>,
        ready: Arc<AtomicBool>,
    ) -> crate::Result<()> {
        let listener =
            tokio::net::TcpListener::bind((std::net::Ipv6Addr::UNSPECIFIED, self.port)).await?;
        let control_plane = ControlPlane::from_store(self.id.clone(), store.clone());
        let server = crate::xds::server::spawn(listener, control_plane)?;

        let provider_task = {
            const PROVIDER_RETRIES: u32 = 25;
            const PROVIDER_BACKOFF: std::time::Duration = std::time::Duration::from_millis(250);

            tryhard::retry_fn(move || match &self.provider {
                Providers::Kubernetes { namespace } => tokio::spawn(crate::providers::k8s::watch(
                    store.clone(),
                    ready.clone(),
                    namespace.clone(),
                )),
                Providers::File { path } => tokio::spawn(crate::providers::fs::watch(
                    store.clone(),
                    ready.clone(),
                    path.clone(),
                )),
            })
            .retries(PROVIDER_RETRIES)
            .exponential_backoff(PROVIDER_BACKOFF)
            .on_retry(|_, _, error| {
                let error = error.to_string();
                async move {
                    tracing::warn!(%error, "provider task error, retrying");
                }
            })
        };

        tokio::select! {
            result = server => result,
            result = provider_task => result.map_err(From::from).and_then(|result| result),
        }
    }
}
