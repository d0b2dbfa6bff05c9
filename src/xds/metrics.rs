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

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge};

pub(crate) const NODE_LABEL: &str = "node";
pub(crate) const TYPE_LABEL: &str = "type";
pub(crate) const KIND_LABEL: &str = "kind";

pub(crate) fn discovery_requests(node: &str, type_url: &str) -> IntCounter {
    static DISCOVERY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
        prometheus::register_int_counter_vec_with_registry! {
            prometheus::opts! {
                "xds_discovery_requests",
                "Total number of xDS discovery requests",
            },
            &[NODE_LABEL, TYPE_LABEL],
            crate::metrics::registry(),
        }
        .unwrap()
    });

    DISCOVERY_REQUESTS.with_label_values(&[node, type_url])
}

pub(crate) fn discovery_responses(node: &str, type_url: &str) -> IntCounter {
    static DISCOVERY_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
        prometheus::register_int_counter_vec_with_registry! {
            prometheus::opts! {
                "xds_discovery_responses",
                "Total number of xDS discovery responses",
            },
            &[NODE_LABEL, TYPE_LABEL],
            crate::metrics::registry(),
        }
        .unwrap()
    });

    DISCOVERY_RESPONSES.with_label_values(&[node, type_url])
}

pub(crate) fn nacks(node: &str, type_url: &str) -> IntCounter {
    static NACKS: Lazy<IntCounterVec> = Lazy::new(|| {
        prometheus::register_int_counter_vec_with_registry! {
            prometheus::opts! {
                "xds_nacks",
                "Total number of xDS NACKs",
            },
            &[NODE_LABEL, TYPE_LABEL],
            crate::metrics::registry(),
        }
        .unwrap()
    });

    NACKS.with_label_values(&[node, type_url])
}

/// Resolve failures by resource type and error kind.
pub(crate) fn resolve_errors(type_url: &str, kind: &str) -> IntCounter {
    static RESOLVE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
        prometheus::register_int_counter_vec_with_registry! {
            prometheus::opts! {
                "xds_resolve_errors",
                "Total number of failed resource resolutions",
            },
            &[TYPE_LABEL, KIND_LABEL],
            crate::metrics::registry(),
        }
        .unwrap()
    });

    RESOLVE_ERRORS.with_label_values(&[type_url, kind])
}

pub(crate) fn active_streams() -> &'static IntGauge {
    static ACTIVE_STREAMS: Lazy<IntGauge> = Lazy::new(|| {
        prometheus::register_int_gauge_with_registry! {
            prometheus::opts! {
                "xds_active_streams",
                "Number of open discovery streams",
            },
            crate::metrics::registry(),
        }
        .unwrap()
    });

    &ACTIVE_STREAMS
}

pub(crate) fn active_watches() -> &'static IntGauge {
    static ACTIVE_WATCHES: Lazy<IntGauge> = Lazy::new(|| {
        prometheus::register_int_gauge_with_registry! {
            prometheus::opts! {
                "xds_active_watches",
                "Number of watches in the watch registry",
            },
            crate::metrics::registry(),
        }
        .unwrap()
    });

    &ACTIVE_WATCHES
}

/// Tracks an open discovery stream for as long as it is alive.
pub struct StreamConnectionMetrics(());

impl StreamConnectionMetrics {
    pub fn new() -> Self {
        active_streams().inc();
        Self(())
    }
}

impl Drop for StreamConnectionMetrics {
    fn drop(&mut self) {
        active_streams().dec();
    }
}
