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

//! REST-layer guards and HTTP authorization utilities.

mod api_key;
mod guards;
mod httputils;
mod username;

pub use api_key::{API_KEY_HEADER, API_KEY_QUERY, ApiKeyGuard, DEFAULT_PRINCIPAL};
pub use guards::{Guard, Guards, GuardsLayer, Principal, Principals};
pub use httputils::{get_basic_auth, has_authorization};
pub use username::{ANONYMOUS_PRINCIPAL, UserGuard};
