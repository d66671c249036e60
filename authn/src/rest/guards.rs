// apiseed
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Composition of guards into a middleware pipeline.

use apiseed_core::rest::RestResult;
use axum::extract::{Request, State};
use axum::middleware::{self, FromFnLayer, Next};
use axum::response::{IntoResponse, Response};
use derivative::Derivative;
use http::request::Parts;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Identity on behalf of which a guard accepted a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal(String);

impl Principal {
    /// Creates a new principal with the given `identity`.
    pub fn new<S: Into<String>>(identity: S) -> Self {
        Self(identity.into())
    }

    /// Returns the identity of the principal.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Principals accepted by all the guards that ran on a request, keyed by guard name.
///
/// The pipeline stores this in the request extensions so that handlers can extract it with
/// `axum::Extension<Principals>`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Principals(BTreeMap<&'static str, Principal>);

impl Principals {
    /// Records that the guard `name` accepted the request on behalf of `principal`.
    pub fn insert(&mut self, name: &'static str, principal: Principal) {
        self.0.insert(name, principal);
    }

    /// Returns the principal accepted by the guard `name`, if that guard ran.
    pub fn get(&self, name: &str) -> Option<&Principal> {
        self.0.get(name)
    }
}

/// A named check over the metadata of a request.
pub trait Guard: Send + Sync {
    /// Returns the name under which the guard records its principal.
    fn name(&self) -> &'static str;

    /// Decides whether the request described by `parts` can proceed.
    ///
    /// Returns the principal on behalf of which the request is accepted, or the error to return to
    /// the client if the request is rejected.
    fn check(&self, parts: &Parts) -> RestResult<Principal>;
}

/// Type of the middleware function that runs a pipeline.
type GuardsFn = fn(State<Guards>, Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;

/// Layer that runs a `Guards` pipeline before the wrapped routes.
pub type GuardsLayer = FromFnLayer<GuardsFn, Guards, (State<Guards>, Request)>;

/// Ordered pipeline of guards.
#[derive(Clone, Default, Derivative)]
#[derivative(Debug)]
pub struct Guards {
    /// The guards to run, in order.
    #[derivative(Debug = "ignore")]
    guards: Vec<Arc<dyn Guard>>,
}

impl Guards {
    /// Creates an empty pipeline, which accepts all requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `guard` to the pipeline.
    pub fn with<G: Guard + 'static>(mut self, guard: G) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Runs all guards against the request described by `parts` and records their principals in
    /// `principals`.  The first rejection stops the pipeline.
    pub fn check(&self, parts: &Parts, principals: &mut Principals) -> RestResult<()> {
        for guard in &self.guards {
            match guard.check(parts) {
                Ok(principal) => principals.insert(guard.name(), principal),
                Err(e) => {
                    debug!(
                        "Request to {} rejected by guard {}: {}",
                        parts.uri.path(),
                        guard.name(),
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Converts the pipeline into a layer for `Router::route_layer` or `MethodRouter::layer`.
    pub fn layer(self) -> GuardsLayer {
        middleware::from_fn_with_state(self, run_guards as GuardsFn)
    }
}

/// Middleware that runs the `guards` pipeline on `request` before passing it to `next`.
fn run_guards(
    State(guards): State<Guards>,
    request: Request,
    next: Next,
) -> Pin<Box<dyn Future<Output = Response> + Send>> {
    Box::pin(async move {
        let (mut parts, body) = request.into_parts();
        let mut principals = parts.extensions.remove::<Principals>().unwrap_or_default();
        if let Err(e) = guards.check(&parts, &mut principals) {
            return e.into_response();
        }
        parts.extensions.insert(principals);
        next.run(Request::from_parts(parts, body)).await
    })
}
