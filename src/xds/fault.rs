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

//! Compiles [`FaultSpec`]s into the `envoy.extensions.filters.http.fault.v3`
//! filter configuration, both for the listener's filter chain and for
//! per-route and per-backend overrides.

use std::collections::BTreeMap;

use crate::{
    config::{AbortSpec, DelaySpec, FaultSpec, Interceptor, ListenerConfig},
    generated::{
        envoy::extensions::filters::{
            common::fault::v3::{fault_delay, FaultDelay},
            http::fault::v3::{fault_abort, FaultAbort, HttpFault},
        },
        TypedMessage,
    },
};

use super::Error;

pub fn compile(spec: &FaultSpec) -> Result<HttpFault, Error> {
    Ok(HttpFault {
        delay: spec.delay.as_ref().map(delay).transpose()?,
        abort: spec.abort.as_ref().map(abort).transpose()?,
        max_active_faults: spec.max_active_faults,
    })
}

fn delay(spec: &DelaySpec) -> Result<FaultDelay, Error> {
    let specifier = match (spec.fixed, spec.from_metadata) {
        (Some(fixed), false) => {
            fault_delay::FaultDelaySecifier::FixedDelay(super::proto_duration(fixed)?)
        }
        (None, true) => fault_delay::FaultDelaySecifier::HeaderDelay(<_>::default()),
        _ => return Err(Error::malformed("malformed delay fault")),
    };

    Ok(FaultDelay {
        fault_delay_secifier: Some(specifier),
        percentage: spec
            .percentage
            .as_ref()
            .map(super::fractional_percent)
            .transpose()?,
    })
}

fn abort(spec: &AbortSpec) -> Result<FaultAbort, Error> {
    let error_type = match (spec.code, spec.from_metadata) {
        (Some(code), false) => fault_abort::ErrorType::GrpcStatus(code),
        (None, true) => fault_abort::ErrorType::HeaderAbort(<_>::default()),
        _ => return Err(Error::malformed("malformed abort fault")),
    };

    Ok(FaultAbort {
        error_type: Some(error_type),
        percentage: spec
            .percentage
            .as_ref()
            .map(super::fractional_percent)
            .transpose()?,
    })
}

/// Compiles route or backend level interceptor overrides into a
/// `typed_per_filter_config` map keyed by filter name. Every override must
/// name an interceptor declared by the listener.
pub fn overrides(
    listener: &ListenerConfig,
    interceptors: &[Interceptor],
) -> Result<BTreeMap<String, prost_types::Any>, Error> {
    interceptors
        .iter()
        .map(|interceptor| {
            if listener.interceptor(&interceptor.name).is_none() {
                return Err(Error::malformed(format!(
                    "override of unknown interceptor `{}`",
                    interceptor.name
                )));
            }

            Ok((interceptor.name.clone(), compile(&interceptor.fault)?.to_any()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::{Fraction, ListenerSpec},
        generated::envoy::kind::v3::fractional_percent::DenominatorType,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_delay() {
        let fault = compile(&FaultSpec {
            delay: Some(DelaySpec {
                fixed: Some(Duration::from_millis(1500)),
                percentage: Some(Fraction::percent(50)),
                ..<_>::default()
            }),
            ..<_>::default()
        })
        .unwrap();

        let delay = fault.delay.unwrap();
        assert_eq!(
            Some(fault_delay::FaultDelaySecifier::FixedDelay(
                prost_types::Duration {
                    seconds: 1,
                    nanos: 500_000_000
                }
            )),
            delay.fault_delay_secifier
        );
        let percentage = delay.percentage.unwrap();
        assert_eq!(50, percentage.numerator);
        assert_eq!(DenominatorType::Hundred as i32, percentage.denominator);
        assert!(fault.abort.is_none());
        assert!(fault.max_active_faults.is_none());
    }

    #[test]
    fn metadata_driven() {
        let fault = compile(&FaultSpec {
            delay: Some(DelaySpec {
                from_metadata: true,
                ..<_>::default()
            }),
            abort: Some(AbortSpec {
                from_metadata: true,
                ..<_>::default()
            }),
            max_active_faults: Some(3),
        })
        .unwrap();

        assert!(matches!(
            fault.delay.unwrap().fault_delay_secifier,
            Some(fault_delay::FaultDelaySecifier::HeaderDelay(_))
        ));
        let abort = fault.abort.unwrap();
        assert!(matches!(
            abort.error_type,
            Some(fault_abort::ErrorType::HeaderAbort(_))
        ));
        assert_eq!(None, abort.percentage);
        assert_eq!(Some(3), fault.max_active_faults);
    }

    #[test]
    fn grpc_status_abort() {
        let fault = compile(&FaultSpec {
            abort: Some(AbortSpec {
                code: Some(14),
                percentage: Some(Fraction {
                    numerator: 1,
                    denominator: "million".into(),
                }),
                ..<_>::default()
            }),
            ..<_>::default()
        })
        .unwrap();

        let abort = fault.abort.unwrap();
        assert_eq!(Some(fault_abort::ErrorType::GrpcStatus(14)), abort.error_type);
        assert_eq!(
            DenominatorType::Million as i32,
            abort.percentage.unwrap().denominator
        );
    }

    #[test]
    fn malformed_variants() {
        let delay = |fixed: Option<Duration>, from_metadata| FaultSpec {
            delay: Some(DelaySpec {
                fixed,
                from_metadata,
                percentage: None,
            }),
            ..<_>::default()
        };
        let abort = |code: Option<u32>, from_metadata| FaultSpec {
            abort: Some(AbortSpec {
                code,
                from_metadata,
                percentage: None,
            }),
            ..<_>::default()
        };

        for spec in [delay(None, false), delay(Some(Duration::from_secs(1)), true)] {
            assert_eq!(
                Err(Error::MalformedSpec("malformed delay fault".into())),
                compile(&spec)
            );
        }
        for spec in [abort(None, false), abort(Some(1), true)] {
            assert_eq!(
                Err(Error::MalformedSpec("malformed abort fault".into())),
                compile(&spec)
            );
        }
    }

    #[test]
    fn overrides_must_reference_listener_interceptors() {
        let interceptor = |name: &str| Interceptor {
            name: name.into(),
            fault: FaultSpec {
                abort: Some(AbortSpec {
                    code: Some(2),
                    ..<_>::default()
                }),
                ..<_>::default()
            },
        };
        let listener = ListenerConfig::new(
            "ns",
            "l",
            ListenerSpec {
                interceptors: vec![interceptor("chaos")],
                ..<_>::default()
            },
        );

        let map = overrides(&listener, &[interceptor("chaos")]).unwrap();
        assert_eq!(vec!["chaos"], map.keys().collect::<Vec<_>>());
        assert_eq!(HttpFault::TYPE_URL, map["chaos"].type_url);

        assert_eq!(
            Err(Error::MalformedSpec(
                "override of unknown interceptor `other`".into()
            )),
            overrides(&listener, &[interceptor("other")])
        );
    }
}
