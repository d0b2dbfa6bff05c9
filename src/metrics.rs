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
use prometheus::{IntCounter, IntCounterVec, Registry};

pub(crate) const KIND_LABEL: &str = "kind";
pub(crate) const EVENT_LABEL: &str = "event";

/// Returns the [`Registry`] containing every metric kxds exports. All
/// metric names are prefixed with `kxds_`.
pub fn registry() -> &'static Registry {
    static REGISTRY: Lazy<Registry> = Lazy::new(|| {
        Registry::new_custom(Some("kxds".into()), None)
            .unwrap_or_else(|_| Registry::default())
    });

    &REGISTRY
}

/// Source events a provider has applied, by object kind and event.
pub(crate) fn provider_events(kind: &str, event: &str) -> IntCounter {
    static PROVIDER_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
        prometheus::register_int_counter_vec_with_registry! {
            prometheus::opts! {
                "provider_events",
                "Total number of source events applied by the configuration provider",
            },
            &[KIND_LABEL, EVENT_LABEL],
            registry(),
        }
        .unwrap()
    });

    PROVIDER_EVENTS.with_label_values(&[kind, event])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_prefixed() {
        provider_events("listener", "applied").inc();

        let families = registry().gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "kxds_provider_events"));
    }
}
