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

//! Source objects that kxds compiles into xDS resources.
//!
//! A [`ListenerConfig`] declares how a gRPC client should route the calls it
//! makes to one logical target, and an [`EndpointSet`] lists the addresses
//! that currently back a service. Both are owned by whichever provider feeds
//! the [`crate::store::MemoryStore`].

mod endpoints;
mod listener;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use self::{
    endpoints::{EndpointAddress, EndpointPort, EndpointSet},
    listener::{
        AbortSpec, BackendSpec, DelaySpec, FaultSpec, Fraction, HeaderMatcherSpec, Interceptor,
        ListenerConfig, ListenerSpec, LocalitySpec, MatcherSpec, PortSpec, RangeSpec, RegexSpec,
        RouteSpec, ServiceRef,
    },
};

/// The document format read by the file provider.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SourceDocument {
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
    #[serde(default)]
    pub endpoints: Vec<EndpointSet>,
}

impl SourceDocument {
    /// Reads a document from YAML (or JSON, which is a subset of YAML).
    pub fn from_reader<R: std::io::Read>(input: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(input)
    }

    pub fn from_slice(input: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(input)
    }
}

/// Derives a stable resource version from an object's content, for sources
/// (such as plain files) that have no version of their own.
///
/// # Panics
///
/// Source objects only contain string-keyed maps, so serializing one cannot
/// fail.
pub(crate) fn content_version<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).expect("source objects always serialize to JSON");
    format!("{:016x}", seahash::hash(&bytes))
}
