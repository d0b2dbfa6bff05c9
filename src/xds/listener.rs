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

use std::collections::HashSet;

use crate::{
    config::ListenerConfig,
    generated::{
        envoy::{
            config::{
                core::v3::HttpProtocolOptions,
                listener::v3::{ApiListener, Listener},
                route::v3::{RouteConfiguration, VirtualHost},
            },
            extensions::filters::{
                http::router::v3::Router,
                network::http_connection_manager::v3::{
                    http_connection_manager::RouteSpecifier, http_filter::ConfigType,
                    HttpConnectionManager, HttpFilter,
                },
            },
        },
        TypedMessage,
    },
};

use super::{
    naming::{BackendName, ListenerName},
    Error,
};

/// Name of the terminal routing filter.
pub const ROUTER_FILTER: &str = "envoy.filters.http.router";

/// Builds the API listener for `config`, with its route table inlined.
pub fn build(config: &ListenerConfig) -> Result<Listener, Error> {
    BackendName::validate_listener(&config.namespace, &config.name)?;
    let name = ListenerName::new(&config.namespace, &config.name).to_string();

    let routes = if config.spec.routes.is_empty() {
        vec![super::route::default_route(config)]
    } else {
        config
            .spec
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| super::route::compile(config, index, route))
            .collect::<Result<_, _>>()?
    };

    let manager = HttpConnectionManager {
        stat_prefix: name.clone(),
        http_filters: http_filters(config)?,
        common_http_protocol_options: config
            .spec
            .max_stream_duration
            .map(super::proto_duration)
            .transpose()?
            .map(|duration| HttpProtocolOptions {
                idle_timeout: None,
                max_stream_duration: Some(duration),
            }),
        route_specifier: Some(RouteSpecifier::RouteConfig(RouteConfiguration {
            name: name.clone(),
            virtual_hosts: vec![VirtualHost {
                name: name.clone(),
                domains: vec!["*".into()],
                routes,
            }],
        })),
    };

    Ok(Listener {
        name,
        api_listener: Some(ApiListener {
            api_listener: Some(manager.to_any()),
        }),
    })
}

/// Fault filters in declaration order, then the router.
fn http_filters(config: &ListenerConfig) -> Result<Vec<HttpFilter>, Error> {
    let mut seen = HashSet::new();
    let mut filters = Vec::with_capacity(config.spec.interceptors.len() + 1);

    for interceptor in &config.spec.interceptors {
        if interceptor.name == ROUTER_FILTER || !seen.insert(&*interceptor.name) {
            return Err(Error::malformed(format!(
                "duplicate interceptor `{}`",
                interceptor.name
            )));
        }

        filters.push(HttpFilter {
            name: interceptor.name.clone(),
            is_optional: false,
            config_type: Some(ConfigType::TypedConfig(
                super::fault::compile(&interceptor.fault)?.to_any(),
            )),
        });
    }

    filters.push(HttpFilter {
        name: ROUTER_FILTER.into(),
        is_optional: false,
        config_type: Some(ConfigType::TypedConfig(Router {}.to_any())),
    });

    Ok(filters)
}
