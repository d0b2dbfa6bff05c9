/// Delay specification is used to inject latency into the
/// HTTP/Mongo operation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FaultDelay {
    /// The percentage of operations/connections/requests on which the delay
    /// will be injected.
    #[prost(message, optional, tag = "4")]
    pub percentage: ::core::option::Option<super::super::super::super::super::kind::v3::FractionalPercent>,
    #[prost(oneof = "fault_delay::FaultDelaySecifier", tags = "3, 5")]
    pub fault_delay_secifier: ::core::option::Option<fault_delay::FaultDelaySecifier>,
}
/// Nested message and enum types in `FaultDelay`.
pub mod fault_delay {
    /// Fault delays are controlled via an HTTP header (if applicable).
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct HeaderDelay {}
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum FaultDelaySecifier {
        /// Add a fixed delay before forwarding the operation onwards.
        #[prost(message, tag = "3")]
        FixedDelay(::prost_types::Duration),
        /// Fault delays are controlled via an HTTP header (if applicable).
        #[prost(message, tag = "5")]
        HeaderDelay(HeaderDelay),
    }
}
