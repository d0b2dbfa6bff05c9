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

//! Resource names.
//!
//! Listeners are named `<namespace>/<name>`. Clusters and their load
//! assignments share a backend name,
//! `kxds.<namespace>.<listener>.<route index>-<backend index>`, or
//! `kxds.<namespace>.<listener>.default` for the catch-all backend of a
//! listener without routes. Backend names are derived from position, so
//! reordering routes renames their backends.

use std::{fmt, str::FromStr};

use super::Error;

/// Leading field of every backend name.
pub const BACKEND_TAG: &str = "kxds";
/// Backend id of a listener's catch-all backend.
pub const DEFAULT_BACKEND: &str = "default";

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ListenerName {
    pub namespace: String,
    pub name: String,
}

impl ListenerName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ListenerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ListenerName {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.split('/').collect::<Vec<_>>()[..] {
            [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(Error::MalformedResourceName(input.to_owned())),
        }
    }
}

/// Position of a backend within its listener.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BackendId {
    Route { route: usize, backend: usize },
    Default,
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route { route, backend } => write!(f, "{route}-{backend}"),
            Self::Default => f.write_str(DEFAULT_BACKEND),
        }
    }
}

impl FromStr for BackendId {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == DEFAULT_BACKEND {
            return Ok(Self::Default);
        }

        let (route, backend) = input.split_once('-').ok_or(())?;
        let parse = |index: &str| {
            // Only canonical decimal forms, so that names round-trip exactly.
            if index.is_empty()
                || !index.bytes().all(|b| b.is_ascii_digit())
                || (index.len() > 1 && index.starts_with('0'))
            {
                return Err(());
            }
            index.parse::<usize>().map_err(drop)
        };

        Ok(Self::Route {
            route: parse(route)?,
            backend: parse(backend)?,
        })
    }
}

/// The name shared by a backend's cluster and load assignment.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BackendName {
    pub namespace: String,
    pub listener: String,
    pub id: BackendId,
}

impl BackendName {
    pub fn new(namespace: impl Into<String>, listener: impl Into<String>, id: BackendId) -> Self {
        Self {
            namespace: namespace.into(),
            listener: listener.into(),
            id,
        }
    }

    pub fn route(
        namespace: impl Into<String>,
        listener: impl Into<String>,
        route: usize,
        backend: usize,
    ) -> Self {
        Self::new(namespace, listener, BackendId::Route { route, backend })
    }

    pub fn default_backend(namespace: impl Into<String>, listener: impl Into<String>) -> Self {
        Self::new(namespace, listener, BackendId::Default)
    }

    pub fn listener_name(&self) -> ListenerName {
        ListenerName::new(&self.namespace, &self.listener)
    }

    /// Checks that the backends of listener `namespace/listener` have names
    /// that parse back, which rules out `.` in either part.
    pub fn validate_listener(namespace: &str, listener: &str) -> Result<(), Error> {
        if namespace.contains('.') || listener.contains('.') {
            return Err(Error::malformed(format!(
                "listener `{namespace}/{listener}` cannot contain `.` in its namespace or name"
            )));
        }

        Ok(())
    }
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{BACKEND_TAG}.{}.{}.{}",
            self.namespace, self.listener, self.id
        )
    }
}

impl FromStr for BackendName {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedResourceName(input.to_owned());

        match input.split('.').collect::<Vec<_>>()[..] {
            [BACKEND_TAG, namespace, listener, id]
                if !namespace.is_empty() && !listener.is_empty() =>
            {
                Ok(Self::new(
                    namespace,
                    listener,
                    id.parse().map_err(|()| malformed())?,
                ))
            }
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dotted_listeners_are_rejected() {
        assert!(BackendName::validate_listener("ns", "my-listener").is_ok());
        for (namespace, listener) in [("ns", "my.listener"), ("my.ns", "l")] {
            assert!(matches!(
                BackendName::validate_listener(namespace, listener),
                Err(Error::MalformedSpec(_))
            ));
        }
    }

    #[test]
    fn listener_round_trip() {
        let name = ListenerName::new("default-ns", "my-listener");
        assert_eq!("default-ns/my-listener", name.to_string());
        assert_eq!(name, name.to_string().parse().unwrap());
    }

    #[test]
    fn backend_round_trip() {
        for name in [
            BackendName::route("default-ns", "my-listener", 0, 0),
            BackendName::route("ns", "l", 12, 3),
            BackendName::default_backend("ns", "l"),
        ] {
            assert_eq!(name, name.to_string().parse().unwrap());
        }

        assert_eq!(
            "kxds.default-ns.my-listener.0-0",
            BackendName::route("default-ns", "my-listener", 0, 0).to_string()
        );
        assert_eq!(
            "kxds.ns.l.default",
            BackendName::default_backend("ns", "l").to_string()
        );
    }

    #[test]
    fn malformed_listener_names() {
        for input in ["", "ns", "ns/", "/name", "a/b/c"] {
            assert_eq!(
                Err(Error::MalformedResourceName(input.into())),
                input.parse::<ListenerName>(),
            );
        }
    }

    #[test]
    fn malformed_backend_names() {
        for input in [
            "",
            "kxds.ns.l",
            "kxds.ns.l.0-0.extra",
            "other.ns.l.0-0",
            "kxds..l.0-0",
            "kxds.ns.l.0",
            "kxds.ns.l.a-0",
            "kxds.ns.l.01-0",
            "kxds.ns.l.+1-0",
            "kxds.ns.l.0-",
        ] {
            assert_eq!(
                Err(Error::MalformedResourceName(input.into())),
                input.parse::<BackendName>(),
                "{input}"
            );
        }
    }
}
