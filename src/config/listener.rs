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

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named, versioned routing configuration for one listener.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListenerConfig {
    pub namespace: String,
    pub name: String,
    /// Opaque version of this object in its source system. When empty the
    /// store derives one from the object's content.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    #[serde(default)]
    pub spec: ListenerSpec,
}

impl ListenerConfig {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: ListenerSpec) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resource_version: String::new(),
            spec,
        }
    }

    /// Looks up a listener-level interceptor by name.
    pub fn interceptor(&self, name: &str) -> Option<&Interceptor> {
        self.spec
            .interceptors
            .iter()
            .find(|interceptor| interceptor.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListenerSpec {
    /// Upper bound on the lifetime of any stream opened through this listener.
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub max_stream_duration: Option<Duration>,
    /// Interceptors applied to every call, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interceptors: Vec<Interceptor>,
    /// Routes, matched in declaration order. An empty list routes every call
    /// to the service named after the listener.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSpec>,
}

/// A named call interceptor. At listener level it declares a filter, and on
/// a route or backend it overrides the configuration of the listener-level
/// interceptor with the same name.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Interceptor {
    pub name: String,
    pub fault: FaultSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RouteSpec {
    /// Calls this route applies to. Absent matches every call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<MatcherSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interceptors: Vec<Interceptor>,
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub max_stream_duration: Option<Duration>,
    pub backends: Vec<BackendSpec>,
}

/// Selects calls by gRPC method path and request metadata.
///
/// At most one of `method`, `service` and `namespace` is expected to be set;
/// when several are, the most specific wins.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatcherSpec {
    /// Fully qualified method, `package.Service/Method`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Fully qualified service, `package.Service`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Protobuf package prefix, `package`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<HeaderMatcherSpec>,
    /// Only a sample of otherwise matching calls use the route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<Fraction>,
}

/// A predicate over one metadata entry. Exactly one of the match fields must
/// be set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeaderMatcherSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Negates the result of the match.
    #[serde(default)]
    pub invert: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegexSpec {
    pub pattern: String,
    /// Regular expression engine, currently only `re2`.
    #[serde(default = "default_regex_engine")]
    pub engine: String,
}

fn default_regex_engine() -> String {
    crate::xds::route::RE2_ENGINE.into()
}

/// Half-open integer range, `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
}

/// A probability, `numerator / denominator`, where the denominator is one of
/// `hundred`, `ten_thousand` or `million`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Fraction {
    pub numerator: u32,
    #[serde(default = "default_denominator")]
    pub denominator: String,
}

fn default_denominator() -> String {
    "hundred".into()
}

impl Fraction {
    pub fn percent(numerator: u32) -> Self {
        Self {
            numerator,
            denominator: default_denominator(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackendSpec {
    /// Relative share of the route's traffic.
    pub weight: u32,
    /// Maximum concurrent requests, enforced by the client's circuit breaker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interceptors: Vec<Interceptor>,
    /// A single service backing this backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRef>,
    /// Weighted, prioritised groups of services backing this backend.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub localities: Vec<LocalitySpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalitySpec {
    pub weight: u32,
    #[serde(default)]
    pub priority: u32,
    pub service: ServiceRef,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceRef {
    pub name: String,
    /// Defaults to the namespace of the owning listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub port: PortSpec,
}

impl ServiceRef {
    pub fn new(name: impl Into<String>, port: PortSpec) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            port,
        }
    }

    /// The namespace this reference resolves in.
    pub fn namespace_or<'a>(&'a self, listener_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(listener_namespace)
    }
}

/// A service port, by name or number. The name takes precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PortSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u16>,
}

impl PortSpec {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            number: None,
        }
    }

    pub fn number(number: u16) -> Self {
        Self {
            name: None,
            number: Some(number),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FaultSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_active_faults: Option<u32>,
}

/// Delays calls, either by a fixed duration or by the duration the caller
/// requests through the `x-envoy-fault-delay-request` metadata entry.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DelaySpec {
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub fixed: Option<Duration>,
    #[serde(default)]
    pub from_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Fraction>,
}

/// Fails calls, either with a fixed gRPC status code or with the code the
/// caller requests through the `x-envoy-fault-abort-grpc-request` metadata
/// entry.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AbortSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    #[serde(default)]
    pub from_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Fraction>,
}
