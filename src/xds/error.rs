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

/// Failures while resolving or compiling xDS resources.
///
/// Any of these aborts the resolve call it occurred in; nothing partial is
/// ever sent to a client.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed resource name `{0}`")]
    MalformedResourceName(String),
    #[error("unknown resource type `{0}`")]
    UnknownResourceType(String),
    #[error("{kind} `{namespace}/{name}` not found")]
    SourceNotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },
    #[error("{0}")]
    MalformedSpec(String),
    #[error("backend sets neither a service nor localities")]
    UnsupportedLocalityConfiguration,
    #[error("service `{namespace}/{service}` has no port {port}")]
    UnresolvedPort {
        namespace: String,
        service: String,
        port: String,
    },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSpec(message.into())
    }

    pub(crate) fn listener_not_found(namespace: &str, name: &str) -> Self {
        Self::SourceNotFound {
            kind: "listener",
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }

    /// A short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedResourceName(_) => "malformed_resource_name",
            Self::UnknownResourceType(_) => "unknown_resource_type",
            Self::SourceNotFound { .. } => "source_not_found",
            Self::MalformedSpec(_) => "malformed_spec",
            Self::UnsupportedLocalityConfiguration => "unsupported_locality_configuration",
            Self::UnresolvedPort { .. } => "unresolved_port",
        }
    }
}

impl From<Error> for tonic::Status {
    fn from(error: Error) -> Self {
        match error {
            Error::MalformedResourceName(_) | Error::UnknownResourceType(_) => {
                tonic::Status::invalid_argument(error.to_string())
            }
            Error::SourceNotFound { .. } => tonic::Status::not_found(error.to_string()),
            _ => tonic::Status::internal(error.to_string()),
        }
    }
}
