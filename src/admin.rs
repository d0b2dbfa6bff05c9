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

//! The admin HTTP endpoint: metrics, health checks and a configuration dump.

mod health;

use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server as HyperServer, StatusCode,
};

use self::health::Health;
use crate::store::{ConfigStore, MemoryStore, Selector};

pub const PORT: u16 = 8000;

/// What the admin endpoint reports on.
#[derive(Clone)]
pub struct State {
    pub store: Arc<MemoryStore>,
    /// Set once the provider has applied its initial state.
    pub ready: Arc<AtomicBool>,
}

impl State {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            ready: <_>::default(),
        }
    }
}

pub fn server(
    state: State,
    address: Option<std::net::SocketAddr>,
) -> tokio::task::JoinHandle<Result<(), hyper::Error>> {
    let address = address.unwrap_or_else(|| (std::net::Ipv6Addr::UNSPECIFIED, PORT).into());
    let health = Health::new();
    tracing::info!(address = %address, "Starting admin endpoint");

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        let health = health.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                let health = health.clone();
                async move {
                    let result = handle_request(req, state, health).await;
                    Ok::<_, Infallible>(map_result_into_response(result))
                }
            }))
        }
    });

    tokio::spawn(HyperServer::bind(&address).serve(make_svc))
}

/// Maps handler errors into a `500` response.
fn map_result_into_response(request: Result<Response<Body>, eyre::Error>) -> Response<Body> {
    match request {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, "admin http server error");
            let mut response = Response::new(Body::from("internal error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[tracing::instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
async fn handle_request(
    request: Request<Body>,
    state: State,
    health: Health,
) -> Result<Response<Body>, eyre::Error> {
    tracing::trace!("handling request");

    match (request.method(), request.uri().path()) {
        (&Method::GET, "/metrics") => Ok(collect_metrics()),
        (&Method::GET, "/live" | "/livez") => Ok(health.check_healthy()),
        (&Method::GET, "/ready" | "/readyz") => Ok(check_readiness(&state)),
        (&Method::GET, "/config") => config_dump(&state),
        (_, path) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(format!("{path} not found")))
            .map_err(From::from),
    }
}

fn check_readiness(state: &State) -> Response<Body> {
    health::status_response(state.ready.load(Ordering::SeqCst))
}

/// Every listener configuration currently in the store, as JSON.
fn config_dump(state: &State) -> Result<Response<Body>, eyre::Error> {
    let listeners = state.store.list(&Selector::everything());
    let body = serde_json::to_string(&serde_json::json!({
        "listeners": listeners,
        "endpoints": state.store.endpoint_sets(),
    }))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        )
        .body(Body::from(body))
        .map_err(From::from)
}

fn collect_metrics() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    let mut buffer = vec![];
    let encoder = prometheus::TextEncoder::new();
    let body =
        prometheus::Encoder::encode(&encoder, &crate::metrics::registry().gather(), &mut buffer)
            .map_err(|error| tracing::warn!(%error, "Failed to encode metrics"))
            .and_then(|_| {
                String::from_utf8(buffer)
                    .map(Body::from)
                    .map_err(|error| tracing::warn!(%error, "Failed to convert metrics to utf8"))
            });

    match body {
        Ok(body) => {
            *response.body_mut() = body;
        }
        Err(_) => {
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListenerConfig;

    #[tokio::test]
    async fn collect_metrics() {
        let response = super::collect_metrics();
        assert_eq!(response.status(), hyper::StatusCode::OK);
    }

    #[test]
    fn check_readiness() {
        let state = State::new(Arc::new(MemoryStore::new()));

        let response = super::check_readiness(&state);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.ready.store(true, Ordering::SeqCst);
        let response = super::check_readiness(&state);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn config_dump() {
        let state = State::new(Arc::new(MemoryStore::new()));
        state
            .store
            .apply_listener(ListenerConfig::new("ns", "l", <_>::default()));

        let response = super::config_dump(&state).unwrap();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!("l", value["listeners"][0]["name"]);
    }
}
