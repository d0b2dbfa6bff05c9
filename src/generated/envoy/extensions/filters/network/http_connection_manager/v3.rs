/// \[#next-free-field: 57\]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpConnectionManager {
    /// The human readable prefix to use when emitting statistics for the
    /// connection manager.
    #[prost(string, tag = "2")]
    pub stat_prefix: ::prost::alloc::string::String,
    /// A list of individual HTTP filters that make up the filter chain for
    /// requests made to the connection manager. Order matters as the filters
    /// are processed sequentially as request events happen.
    #[prost(message, repeated, tag = "5")]
    pub http_filters: ::prost::alloc::vec::Vec<HttpFilter>,
    /// Additional settings for HTTP requests handled by the connection manager.
    #[prost(message, optional, tag = "35")]
    pub common_http_protocol_options:
        ::core::option::Option<super::super::super::super::super::config::core::v3::HttpProtocolOptions>,
    #[prost(oneof = "http_connection_manager::RouteSpecifier", tags = "4")]
    pub route_specifier: ::core::option::Option<http_connection_manager::RouteSpecifier>,
}
/// Nested message and enum types in `HttpConnectionManager`.
pub mod http_connection_manager {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RouteSpecifier {
        /// The route table for the connection manager is static and is
        /// specified in this property.
        #[prost(message, tag = "4")]
        RouteConfig(super::super::super::super::super::super::config::route::v3::RouteConfiguration),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpFilter {
    /// The name of the filter configuration. It also serves as a resource name
    /// in ExtensionConfigDS.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// If true, clients that do not support this filter may ignore the
    /// filter but otherwise accept the config.
    #[prost(bool, tag = "6")]
    pub is_optional: bool,
    #[prost(oneof = "http_filter::ConfigType", tags = "4")]
    pub config_type: ::core::option::Option<http_filter::ConfigType>,
}
/// Nested message and enum types in `HttpFilter`.
pub mod http_filter {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ConfigType {
        /// Filter specific configuration which depends on the filter being
        /// instantiated. See the supported filters for further documentation.
        #[prost(message, tag = "4")]
        TypedConfig(::prost_types::Any),
    }
}
