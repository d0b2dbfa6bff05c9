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

use crate::generated::{
    envoy::config::{
        cluster::v3::Cluster, endpoint::v3::ClusterLoadAssignment, listener::v3::Listener,
    },
    TypedMessage,
};

use super::Error;

/// Resource name subscribing to every resource of a type.
pub const WILDCARD: &str = "*";

/// The xDS resource types kxds serves.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, enum_map::Enum)]
pub enum ResourceType {
    Listener,
    Cluster,
    Endpoint,
}

impl ResourceType {
    pub const VALUES: [Self; 3] = [Self::Listener, Self::Cluster, Self::Endpoint];

    /// Returns the corresponding type URL for the response type.
    pub const fn type_url(&self) -> &'static str {
        match self {
            Self::Listener => Listener::TYPE_URL,
            Self::Cluster => Cluster::TYPE_URL,
            Self::Endpoint => ClusterLoadAssignment::TYPE_URL,
        }
    }

    /// Whether a response for this type has to carry every subscribed
    /// resource, since clients treat an omitted resource as deleted.
    pub const fn is_full_state(&self) -> bool {
        matches!(self, Self::Listener | Self::Cluster)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Listener => "listener",
            Self::Cluster => "cluster",
            Self::Endpoint => "endpoint",
        })
    }
}

impl TryFrom<&'_ str> for ResourceType {
    type Error = Error;

    fn try_from(url: &str) -> Result<Self, Error> {
        Self::VALUES
            .into_iter()
            .find(|ty| ty.type_url() == url)
            .ok_or_else(|| Error::UnknownResourceType(url.to_owned()))
    }
}

impl std::str::FromStr for ResourceType {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::try_from(url)
    }
}

/// Identity of one watchable, resolvable resource.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub name: String,
}

impl ResourceRef {
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
        }
    }

    /// A reference matching every resource of `resource_type`.
    pub fn wildcard(resource_type: ResourceType) -> Self {
        Self::new(resource_type, WILDCARD)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.name)
    }
}

/// Returns whether a requested name list subscribes to every resource.
pub fn is_wildcard_request(names: &[String]) -> bool {
    names.is_empty() || names.iter().any(|name| name == WILDCARD)
}
