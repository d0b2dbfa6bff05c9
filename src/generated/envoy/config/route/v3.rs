/// \[#next-free-field: 18\]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteConfiguration {
    /// The name of the route configuration.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// An array of virtual hosts that make up the route table.
    #[prost(message, repeated, tag = "2")]
    pub virtual_hosts: ::prost::alloc::vec::Vec<VirtualHost>,
}
/// The top level element in the routing configuration is a virtual host. Each
/// virtual host has a logical name as well as a set of domains that get routed
/// to it based on the incoming request's host header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VirtualHost {
    /// The logical name of the virtual host.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// A list of domains (host/authority header) that will be matched to this
    /// virtual host.
    #[prost(string, repeated, tag = "2")]
    pub domains: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// The list of routes that will be matched, in order, for incoming requests.
    /// The first route that matches will be used.
    #[prost(message, repeated, tag = "3")]
    pub routes: ::prost::alloc::vec::Vec<Route>,
}
/// A route is both a specification of how to match a request as well as an
/// indication of what to do next.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Route {
    /// Name for the route.
    #[prost(string, tag = "14")]
    pub name: ::prost::alloc::string::String,
    /// Route matching parameters.
    #[prost(message, optional, tag = "1")]
    pub r#match: ::core::option::Option<RouteMatch>,
    /// Per-filter configuration overrides, keyed by HTTP filter name.
    #[prost(btree_map = "string, message", tag = "13")]
    pub typed_per_filter_config: ::prost::alloc::collections::BTreeMap<
        ::prost::alloc::string::String,
        ::prost_types::Any,
    >,
    #[prost(oneof = "route::Action", tags = "2")]
    pub action: ::core::option::Option<route::Action>,
}
/// Nested message and enum types in `Route`.
pub mod route {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Action {
        /// Route request to some upstream cluster.
        #[prost(message, tag = "2")]
        Route(super::RouteAction),
    }
}
/// Compared to the :ref:`cluster <envoy_v3_api_field_config.route.v3.RouteAction.cluster>`
/// field that specifies a single upstream cluster as the target of a request,
/// the :ref:`weighted_clusters <envoy_v3_api_field_config.route.v3.RouteAction.weighted_clusters>`
/// option allows for specification of multiple upstream clusters along with
/// weights that indicate the percentage of traffic to be forwarded to each
/// cluster.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WeightedCluster {
    /// Specifies one or more upstream clusters associated with the route.
    #[prost(message, repeated, tag = "1")]
    pub clusters: ::prost::alloc::vec::Vec<weighted_cluster::ClusterWeight>,
    /// Specifies the total weight across all clusters.
    #[prost(message, optional, tag = "3")]
    pub total_weight: ::core::option::Option<u32>,
}
/// Nested message and enum types in `WeightedCluster`.
pub mod weighted_cluster {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ClusterWeight {
        /// Name of the upstream cluster.
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        /// The weight of the cluster.
        #[prost(message, optional, tag = "2")]
        pub weight: ::core::option::Option<u32>,
        /// Per-filter configuration overrides, keyed by HTTP filter name.
        #[prost(btree_map = "string, message", tag = "10")]
        pub typed_per_filter_config: ::prost::alloc::collections::BTreeMap<
            ::prost::alloc::string::String,
            ::prost_types::Any,
        >,
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteMatch {
    /// Indicates that the route should additionally match on a runtime key.
    #[prost(message, optional, tag = "9")]
    pub runtime_fraction: ::core::option::Option<super::super::core::v3::RuntimeFractionalPercent>,
    /// Specifies a set of headers that the route should match on. The router
    /// will check the request's headers against all the specified headers in
    /// the route config. A match will happen if all the headers in the route
    /// are present in the request with the same values (or based on presence if
    /// the value field is not in the config).
    #[prost(message, repeated, tag = "6")]
    pub headers: ::prost::alloc::vec::Vec<HeaderMatcher>,
    #[prost(oneof = "route_match::PathSpecifier", tags = "1, 2")]
    pub path_specifier: ::core::option::Option<route_match::PathSpecifier>,
}
/// Nested message and enum types in `RouteMatch`.
pub mod route_match {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PathSpecifier {
        /// If specified, the route is a prefix rule meaning that the prefix must
        /// match the beginning of the *:path* header.
        #[prost(string, tag = "1")]
        Prefix(::prost::alloc::string::String),
        /// If specified, the route is an exact path rule meaning that the path
        /// must exactly match the *:path* header once the query string is
        /// removed.
        #[prost(string, tag = "2")]
        Path(::prost::alloc::string::String),
    }
}
/// \[#next-free-field: 40\]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteAction {
    /// Specifies the maximum stream duration for this route.
    #[prost(message, optional, tag = "36")]
    pub max_stream_duration: ::core::option::Option<route_action::MaxStreamDuration>,
    #[prost(oneof = "route_action::ClusterSpecifier", tags = "1, 3")]
    pub cluster_specifier: ::core::option::Option<route_action::ClusterSpecifier>,
}
/// Nested message and enum types in `RouteAction`.
pub mod route_action {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MaxStreamDuration {
        /// Specifies the maximum duration allowed for streams on the route.
        #[prost(message, optional, tag = "1")]
        pub max_stream_duration: ::core::option::Option<::prost_types::Duration>,
        /// If present, and the request contains a `grpc-timeout header
        /// <<https://github.com/grpc/grpc/blob/master/doc/PROTOCOL-HTTP2.md>`_,> use
        /// that value as the *max_stream_duration*, but limit the applied timeout
        /// to the maximum value specified here.
        #[prost(message, optional, tag = "2")]
        pub grpc_timeout_header_max: ::core::option::Option<::prost_types::Duration>,
    }
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ClusterSpecifier {
        /// Indicates the upstream cluster to which the request should be routed
        /// to.
        #[prost(string, tag = "1")]
        Cluster(::prost::alloc::string::String),
        /// Multiple upstream clusters can be specified for a given route. The
        /// request is routed to one of the upstream clusters based on weights
        /// assigned to each cluster.
        #[prost(message, tag = "3")]
        WeightedClusters(super::WeightedCluster),
    }
}
/// .. attention::
///
///    Internally, Envoy always uses the HTTP/2 *:authority* header to represent
///    the HTTP/1 *Host* header. Thus, if attempting to match on *Host*, match on
///    *:authority* instead.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeaderMatcher {
    /// Specifies the name of the header in the request.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// If specified, the match result will be inverted before checking.
    /// Defaults to false.
    #[prost(bool, tag = "8")]
    pub invert_match: bool,
    #[prost(oneof = "header_matcher::HeaderMatchSpecifier", tags = "4, 11, 6, 7, 9, 10")]
    pub header_match_specifier: ::core::option::Option<header_matcher::HeaderMatchSpecifier>,
}
/// Nested message and enum types in `HeaderMatcher`.
pub mod header_matcher {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum HeaderMatchSpecifier {
        /// If specified, header match will be performed based on the value of
        /// the header.
        #[prost(string, tag = "4")]
        ExactMatch(::prost::alloc::string::String),
        /// If specified, this regex string is a regular expression rule which
        /// implies the entire request header value must match the regex.
        #[prost(message, tag = "11")]
        SafeRegexMatch(super::super::super::super::kind::matcher::v3::RegexMatcher),
        /// If specified, header match will be performed based on range.
        #[prost(message, tag = "6")]
        RangeMatch(super::super::super::super::kind::v3::Int64Range),
        /// If specified as true, header match will be performed based on whether
        /// the header is in the request. If specified as false, header match
        /// will be performed based on whether the header is absent.
        #[prost(bool, tag = "7")]
        PresentMatch(bool),
        /// If specified, header match will be performed based on the prefix of
        /// the header value.
        #[prost(string, tag = "9")]
        PrefixMatch(::prost::alloc::string::String),
        /// If specified, header match will be performed based on the suffix of
        /// the header value.
        #[prost(string, tag = "10")]
        SuffixMatch(::prost::alloc::string::String),
    }
}
