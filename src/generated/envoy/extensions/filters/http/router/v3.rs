/// The router filter. kxds never sets any of its options.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Router {}
