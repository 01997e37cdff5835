// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Errors that can occur while downloading a playlist
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch playlist from {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Stream error while reading playlist {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The playlist URL the failure relates to
    pub fn url(&self) -> &str {
        match self {
            FetchError::RequestFailed { url, .. }
            | FetchError::HttpStatus { url, .. }
            | FetchError::StreamFailed { url, .. } => url,
        }
    }
}

/// Top-level errors for station resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Playlist error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Resolution was cancelled before it completed")]
    Cancelled,
}
