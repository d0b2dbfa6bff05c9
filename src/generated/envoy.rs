pub mod config {
    pub mod cluster {
        pub mod v3;
    }
    pub mod core {
        pub mod v3;
    }
    pub mod endpoint {
        pub mod v3;
    }
    pub mod listener {
        pub mod v3;
    }
    pub mod route {
        pub mod v3;
    }
}
pub mod extensions {
    pub mod filters {
        pub mod common {
            pub mod fault {
                pub mod v3;
            }
        }
        pub mod http {
            pub mod fault {
                pub mod v3;
            }
            pub mod router {
                pub mod v3;
            }
        }
        pub mod network {
            pub mod http_connection_manager {
                pub mod v3;
            }
        }
    }
}
/// `envoy.type`, renamed to avoid the keyword.
pub mod kind {
    pub mod matcher {
        pub mod v3;
    }
    pub mod v3;
}
pub mod service {
    pub mod discovery {
        pub mod v3;
    }
}
