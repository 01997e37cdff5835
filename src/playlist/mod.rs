// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod fetch;
mod m3u;
mod pls;

use std::collections::HashMap;

use crate::content_type::{ContentType, ContentTypeDetector};

pub use fetch::{
    FetchLimits, MAX_LINE_CHARS, MAX_PLAYLIST_LINES, encoding_for_charset, fetch_playlist,
};
pub use m3u::parse_m3u;
pub use pls::parse_pls;

/// Remembers classifications for the duration of one parse so a playlist
/// repeating a URI only probes it once.
struct CachedDetector<'a, D: ?Sized> {
    inner: &'a D,
    cache: HashMap<String, ContentType>,
}

impl<'a, D: ContentTypeDetector + ?Sized> CachedDetector<'a, D> {
    fn new(inner: &'a D) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    async fn detect(&mut self, uri: &str) -> ContentType {
        if let Some(content_type) = self.cache.get(uri) {
            return *content_type;
        }

        let content_type = self.inner.detect(uri).await;
        self.cache.insert(uri.to_string(), content_type);
        content_type
    }
}
