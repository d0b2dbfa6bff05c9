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

//! Compiles [`RouteSpec`]s into `envoy.config.route.v3.Route`s.
//!
//! A gRPC call's `:path` is `/<package>.<Service>/<Method>`, so a method
//! matcher compiles to an exact path, a service matcher to the
//! `/<package>.<Service>/` prefix and a namespace matcher to the
//! `/<package>.` prefix. Routes without a path matcher match every call.

use crate::{
    config::{BackendSpec, HeaderMatcherSpec, ListenerConfig, MatcherSpec, RouteSpec},
    generated::envoy::{
        config::{
            core::v3::RuntimeFractionalPercent,
            route::v3::{
                header_matcher::HeaderMatchSpecifier, route, route_action, route_match,
                weighted_cluster::ClusterWeight, HeaderMatcher, Route, RouteAction, RouteMatch,
                WeightedCluster,
            },
        },
        kind::{
            matcher::v3::{regex_matcher, RegexMatcher},
            v3::Int64Range,
        },
    },
};

use super::{naming::BackendName, Error};

/// The only regular expression engine clients are required to support.
pub const RE2_ENGINE: &str = "re2";

/// Compiles the `index`th route of `listener`.
pub fn compile(listener: &ListenerConfig, index: usize, spec: &RouteSpec) -> Result<Route, Error> {
    let max_stream_duration = spec
        .max_stream_duration
        .map(super::proto_duration)
        .transpose()?
        .map(|duration| route_action::MaxStreamDuration {
            max_stream_duration: Some(duration),
            grpc_timeout_header_max: None,
        });

    Ok(Route {
        name: format!("route-{index}"),
        r#match: Some(compile_match(spec.matcher.as_ref())?),
        typed_per_filter_config: super::fault::overrides(listener, &spec.interceptors)?,
        action: Some(route::Action::Route(RouteAction {
            max_stream_duration,
            cluster_specifier: Some(route_action::ClusterSpecifier::WeightedClusters(
                weighted_clusters(listener, index, &spec.backends)?,
            )),
        })),
    })
}

/// The catch-all route of a listener that declares no routes.
pub fn default_route(listener: &ListenerConfig) -> Route {
    Route {
        name: super::naming::DEFAULT_BACKEND.into(),
        r#match: Some(RouteMatch {
            path_specifier: Some(route_match::PathSpecifier::Prefix("/".into())),
            ..<_>::default()
        }),
        typed_per_filter_config: <_>::default(),
        action: Some(route::Action::Route(RouteAction {
            max_stream_duration: None,
            cluster_specifier: Some(route_action::ClusterSpecifier::Cluster(
                BackendName::default_backend(&listener.namespace, &listener.name).to_string(),
            )),
        })),
    }
}

/// Compiles a matcher. Precedence is method, then service, then namespace,
/// then the `/` catch-all.
pub fn compile_match(matcher: Option<&MatcherSpec>) -> Result<RouteMatch, Error> {
    let Some(matcher) = matcher else {
        return Ok(RouteMatch {
            path_specifier: Some(route_match::PathSpecifier::Prefix("/".into())),
            ..<_>::default()
        });
    };

    let path_specifier = if let Some(method) = &matcher.method {
        route_match::PathSpecifier::Path(format!("/{}", method.trim_start_matches('/')))
    } else if let Some(service) = &matcher.service {
        route_match::PathSpecifier::Prefix(format!("/{}/", service.trim_matches('/')))
    } else if let Some(namespace) = &matcher.namespace {
        route_match::PathSpecifier::Prefix(format!(
            "/{}.",
            namespace.trim_start_matches('/').trim_end_matches('.')
        ))
    } else {
        route_match::PathSpecifier::Prefix("/".into())
    };

    let runtime_fraction = matcher
        .fraction
        .as_ref()
        .map(super::fractional_percent)
        .transpose()?
        .map(|fraction| RuntimeFractionalPercent {
            default_value: Some(fraction),
            runtime_key: String::new(),
        });

    Ok(RouteMatch {
        path_specifier: Some(path_specifier),
        headers: matcher
            .metadata
            .iter()
            .map(compile_header_matcher)
            .collect::<Result<_, _>>()?,
        runtime_fraction,
    })
}

pub fn compile_header_matcher(spec: &HeaderMatcherSpec) -> Result<HeaderMatcher, Error> {
    let mut specifiers = Vec::with_capacity(1);

    if let Some(exact) = &spec.exact {
        specifiers.push(HeaderMatchSpecifier::ExactMatch(exact.clone()));
    }
    if let Some(regex) = &spec.regex {
        if regex.engine != RE2_ENGINE {
            return Err(Error::malformed(format!(
                "unsupported regex engine `{}`",
                regex.engine
            )));
        }
        if regex.pattern.trim().is_empty() {
            return Err(Error::malformed(format!(
                "blank regex pattern for `{}`",
                spec.name
            )));
        }
        if let Err(error) = regex::Regex::new(&regex.pattern) {
            return Err(Error::malformed(format!(
                "invalid regex pattern `{}`: {error}",
                regex.pattern
            )));
        }

        specifiers.push(HeaderMatchSpecifier::SafeRegexMatch(RegexMatcher {
            regex: regex.pattern.clone(),
            engine_type: Some(regex_matcher::EngineType::GoogleRe2(<_>::default())),
        }));
    }
    if let Some(range) = spec.range {
        specifiers.push(HeaderMatchSpecifier::RangeMatch(Int64Range {
            start: range.start,
            end: range.end,
        }));
    }
    if let Some(present) = spec.present {
        specifiers.push(HeaderMatchSpecifier::PresentMatch(present));
    }
    if let Some(prefix) = &spec.prefix {
        specifiers.push(HeaderMatchSpecifier::PrefixMatch(prefix.clone()));
    }
    if let Some(suffix) = &spec.suffix {
        specifiers.push(HeaderMatchSpecifier::SuffixMatch(suffix.clone()));
    }

    if specifiers.len() != 1 {
        return Err(Error::malformed(format!(
            "metadata matcher `{}` must set exactly one match",
            spec.name
        )));
    }

    Ok(HeaderMatcher {
        name: spec.name.clone(),
        invert_match: spec.invert,
        header_match_specifier: specifiers.pop(),
    })
}

/// The weighted backends of a route. The total weight is the plain sum of
/// the backend weights.
pub fn weighted_clusters(
    listener: &ListenerConfig,
    route: usize,
    backends: &[BackendSpec],
) -> Result<WeightedCluster, Error> {
    if backends.is_empty() {
        return Err(Error::malformed(format!("route {route} has no backends")));
    }

    let mut total_weight = 0u32;
    let clusters: Vec<ClusterWeight> = backends
        .iter()
        .enumerate()
        .map(|(index, backend)| {
            total_weight = total_weight
                .checked_add(backend.weight)
                .ok_or_else(|| Error::malformed(format!("route {route} weights overflow")))?;

            Ok(ClusterWeight {
                name: BackendName::route(&listener.namespace, &listener.name, route, index)
                    .to_string(),
                weight: Some(backend.weight),
                typed_per_filter_config: super::fault::overrides(listener, &backend.interceptors)?,
            })
        })
        .collect::<Result<_, Error>>()?;

    Ok(WeightedCluster {
        clusters,
        total_weight: Some(total_weight),
    })
}
