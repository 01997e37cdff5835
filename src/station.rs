// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content_type::ContentType;

/// A named, playable radio stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub name: String,
    /// Candidate stream addresses; never empty, no duplicates
    pub stream_uris: Vec<String>,
    pub stream_content_type: ContentType,
    pub last_modified: DateTime<Utc>,
}

impl Station {
    /// Create a station with a single stream URI.
    ///
    /// A missing or blank name falls back to the URI itself.
    pub fn new(name: Option<&str>, stream_uri: &str, content_type: ContentType) -> Self {
        let stream_uri = stream_uri.trim().to_string();
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| stream_uri.clone());

        Self {
            name,
            stream_uris: vec![stream_uri],
            stream_content_type: content_type,
            last_modified: Utc::now(),
        }
    }

    /// The preferred stream address
    pub fn stream_uri(&self) -> &str {
        self.stream_uris.first().map(String::as_str).unwrap_or_default()
    }
}
