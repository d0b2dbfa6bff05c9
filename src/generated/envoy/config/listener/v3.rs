/// \[#next-free-field: 36\]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Listener {
    /// The unique name by which this listener is known.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Used to represent an API listener, which is used in non-proxy clients.
    /// The type of API exposed to the non-proxy application depends on the type
    /// of API listener.
    #[prost(message, optional, tag = "19")]
    pub api_listener: ::core::option::Option<ApiListener>,
}
/// Describes a type of API listener, which is used in non-proxy clients.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApiListener {
    /// The type in this field determines the type of API listener. At present,
    /// the following types are supported:
    /// envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager (HTTP)
    #[prost(message, optional, tag = "1")]
    pub api_listener: ::core::option::Option<::prost_types::Any>,
}
