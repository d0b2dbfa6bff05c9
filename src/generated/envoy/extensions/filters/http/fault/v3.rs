#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FaultAbort {
    /// The percentage of requests/operations/connections that will be aborted
    /// with the error code provided.
    #[prost(message, optional, tag = "3")]
    pub percentage: ::core::option::Option<super::super::super::super::super::kind::v3::FractionalPercent>,
    #[prost(oneof = "fault_abort::ErrorType", tags = "2, 5, 4")]
    pub error_type: ::core::option::Option<fault_abort::ErrorType>,
}
/// Nested message and enum types in `FaultAbort`.
pub mod fault_abort {
    /// Fault aborts are controlled via an HTTP header (if applicable).
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderAbort {}
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ErrorType {
        /// HTTP status code to use to abort the HTTP request.
        #[prost(uint32, tag = "2")]
        HttpStatus(u32),
        /// gRPC status code to use to abort the gRPC request.
        #[prost(uint32, tag = "5")]
        GrpcStatus(u32),
        /// Fault aborts are controlled via an HTTP header (if applicable).
        #[prost(message, tag = "4")]
        HeaderAbort(HeaderAbort),
    }
}
/// \[#next-free-field: 16\]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpFault {
    /// If specified, the filter will inject delays based on the values in the
    /// object.
    #[prost(message, optional, tag = "1")]
    pub delay: ::core::option::Option<super::super::super::common::fault::v3::FaultDelay>,
    /// If specified, the filter will abort requests based on the values in
    /// the object. At least *abort* or *delay* must be specified.
    #[prost(message, optional, tag = "2")]
    pub abort: ::core::option::Option<FaultAbort>,
    /// The maximum number of faults that can be active at a single time via
    /// the configured fault filter.
    #[prost(message, optional, tag = "6")]
    pub max_active_faults: ::core::option::Option<u32>,
}
