// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod content_type;
pub mod error;
pub mod http;
pub mod playlist;
pub mod progress;
pub mod resolve;
pub mod station;

// Re-export main types for convenience
pub use content_type::{ContentType, ContentTypeClassifier, ContentTypeDetector, MediaType};
pub use error::{FetchError, ResolveError};
pub use http::{HttpClient, HttpResponse, ProbeResponse, ReqwestClient};
pub use playlist::{FetchLimits, fetch_playlist, parse_m3u, parse_pls};
pub use progress::{NoopReporter, ResolveEvent, ResolveReporter, SharedResolveReporter};
pub use resolve::{Resolution, ResolveHandle, ResolverOptions, StationResolver};
pub use station::Station;
