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

//! The xDS side of kxds: compiling source objects into Envoy v3 resources,
//! resolving discovery requests, and pushing changes to connected clients.

pub mod changes;
pub mod cluster;
pub mod endpoint;
mod error;
pub mod fault;
pub mod listener;
pub(crate) mod metrics;
pub mod naming;
pub mod resolver;
mod resource;
pub mod route;
pub mod server;
pub mod version;
pub mod watch;

use crate::{
    config::Fraction,
    generated::envoy::kind::v3::{fractional_percent::DenominatorType, FractionalPercent},
};

pub use self::{
    error::Error,
    resolver::{ResolveRequest, ResolveResponse, Resolver},
    resource::{is_wildcard_request, ResourceRef, ResourceType, WILDCARD},
    watch::{Release, Watch, WatchRegistry},
};

/// Converts a [`Fraction`] into its protocol form. Only the `hundred`,
/// `ten_thousand` and `million` denominators exist.
pub(crate) fn fractional_percent(fraction: &Fraction) -> Result<FractionalPercent, Error> {
    let denominator = match &*fraction.denominator {
        "hundred" => DenominatorType::Hundred,
        "ten_thousand" => DenominatorType::TenThousand,
        "million" => DenominatorType::Million,
        other => {
            return Err(Error::malformed(format!(
                "unsupported fraction denominator `{other}`"
            )))
        }
    };

    Ok(FractionalPercent {
        numerator: fraction.numerator,
        denominator: denominator as i32,
    })
}

pub(crate) fn proto_duration(duration: std::time::Duration) -> Result<prost_types::Duration, Error> {
    prost_types::Duration::try_from(duration)
        .map_err(|_| Error::malformed(format!("duration {duration:?} is out of range")))
}
