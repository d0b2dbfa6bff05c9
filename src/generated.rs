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

//! Protobuf definitions for the subset of the Envoy v3 xDS API that kxds
//! serves. Field numbers match the upstream `.proto` files so the messages
//! are wire compatible with any xDS client; fields kxds never populates are
//! omitted and are skipped by decoders as unknown fields.

#![allow(
    clippy::doc_markdown,
    clippy::use_self,
    clippy::enum_variant_names,
    clippy::large_enum_variant,
    clippy::derive_partial_eq_without_eq
)]

pub mod envoy;
pub mod google;

/// A protobuf message which can be packed into a [`prost_types::Any`].
pub trait TypedMessage: prost::Message + Sized {
    const TYPE_URL: &'static str;

    /// Packs the message into an `Any`. Encoding into a `Vec` cannot fail,
    /// and prost writes fields in tag order, so the output is deterministic
    /// as long as maps are `BTreeMap`s.
    fn to_any(&self) -> prost_types::Any {
        prost_types::Any {
            type_url: Self::TYPE_URL.into(),
            value: self.encode_to_vec(),
        }
    }
}

macro_rules! typed_messages {
    ($($ty:path => $url:literal),+ $(,)?) => {
        $(
            impl TypedMessage for $ty {
                const TYPE_URL: &'static str = concat!("type.googleapis.com/", $url);
            }
        )+
    }
}

typed_messages! {
    envoy::config::listener::v3::Listener => "envoy.config.listener.v3.Listener",
    envoy::config::cluster::v3::Cluster => "envoy.config.cluster.v3.Cluster",
    envoy::config::endpoint::v3::ClusterLoadAssignment => "envoy.config.endpoint.v3.ClusterLoadAssignment",
    envoy::config::route::v3::RouteConfiguration => "envoy.config.route.v3.RouteConfiguration",
    envoy::extensions::filters::network::http_connection_manager::v3::HttpConnectionManager =>
        "envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager",
    envoy::extensions::filters::http::fault::v3::HttpFault => "envoy.extensions.filters.http.fault.v3.HTTPFault",
    envoy::extensions::filters::http::router::v3::Router => "envoy.extensions.filters.http.router.v3.Router",
}
