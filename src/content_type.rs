// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

const MIME_TYPES_MPEG: &[&str] = &["audio/mpeg"];
const MIME_TYPES_OGG: &[&str] = &["audio/ogg", "application/ogg", "audio/opus"];
const MIME_TYPES_AAC: &[&str] = &["audio/aac", "audio/aacp"];
const MIME_TYPES_HLS: &[&str] = &[
    "application/vnd.apple.mpegurl",
    "application/vnd.apple.mpegurl.audio",
];
const MIME_TYPES_M3U: &[&str] = &[
    "application/mpegurl",
    "application/x-mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
];
const MIME_TYPES_PLS: &[&str] = &["audio/x-scpls", "application/pls+xml"];

const MIME_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Canonical content type of a station address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Mpeg,
    Ogg,
    Aac,
    Hls,
    M3u,
    Pls,
    Unsupported,
}

impl ContentType {
    /// Map a MIME type (without parameters) to its tag, ignoring case
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        let table: [(&[&str], ContentType); 6] = [
            (MIME_TYPES_MPEG, ContentType::Mpeg),
            (MIME_TYPES_OGG, ContentType::Ogg),
            (MIME_TYPES_AAC, ContentType::Aac),
            (MIME_TYPES_HLS, ContentType::Hls),
            (MIME_TYPES_M3U, ContentType::M3u),
            (MIME_TYPES_PLS, ContentType::Pls),
        ];

        table
            .into_iter()
            .find(|(types, _)| types.contains(&mime.as_str()))
            .map(|(_, tag)| tag)
            .unwrap_or(ContentType::Unsupported)
    }

    /// Playlist formats that need to be downloaded and parsed
    pub fn is_playlist(self) -> bool {
        matches!(self, ContentType::M3u | ContentType::Pls)
    }

    /// Formats a player can consume directly
    pub fn is_stream(self) -> bool {
        matches!(
            self,
            ContentType::Mpeg | ContentType::Ogg | ContentType::Aac | ContentType::Hls
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Mpeg => "mpeg",
            ContentType::Ogg => "ogg",
            ContentType::Aac => "aac",
            ContentType::Hls => "hls",
            ContentType::M3u => "m3u",
            ContentType::Pls => "pls",
            ContentType::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed Content-Type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Lowercased MIME type without parameters
    pub mime: String,
    /// Value of the `charset` parameter, if any
    pub charset: Option<String>,
}

impl MediaType {
    /// Parse a raw header value such as `audio/x-mpegurl; charset=UTF-8`
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let mime = parts.next()?.trim().to_ascii_lowercase();
        if mime.is_empty() {
            return None;
        }

        let charset = parts.find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_string())
                .filter(|v| !v.is_empty())
        });

        Some(Self { mime, charset })
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::from_mime(&self.mime)
    }
}

/// Guess a MIME type from the extension of a URL's path
pub fn guess_mime_from_extension(address: &str) -> Option<&'static str> {
    let url = Url::parse(address).ok()?;
    let file_name = url.path_segments()?.next_back()?;
    let (_, extension) = file_name.rsplit_once('.')?;

    match extension.to_ascii_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" | "opus" => Some("audio/ogg"),
        "aac" => Some("audio/aac"),
        "m3u8" => Some("application/vnd.apple.mpegurl"),
        "m3u" => Some("audio/x-mpegurl"),
        "pls" => Some("audio/x-scpls"),
        _ => None,
    }
}

/// Anything that can tell the content type of an address
#[async_trait]
pub trait ContentTypeDetector: Send + Sync {
    /// Classify an address. Never fails: problems map to `Unsupported`.
    async fn detect(&self, address: &str) -> ContentType;
}

/// Classifies addresses by probing them over HTTP
#[derive(Clone)]
pub struct ContentTypeClassifier<C> {
    client: C,
}

impl<C: HttpClient> ContentTypeClassifier<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Probe the address and return its declared media type.
    ///
    /// A missing or `application/octet-stream` type falls back to a guess
    /// based on the file extension of the (redirected) URL. Network failures
    /// and non-2xx responses return `None`.
    pub async fn probe(&self, address: &str) -> Option<MediaType> {
        let response = match self.client.probe(address).await {
            Ok(response) => response,
            Err(e) => {
                debug!(%address, error = %e, "content type probe failed");
                return None;
            }
        };

        if !response.is_success() {
            debug!(%address, status = response.status, "content type probe rejected");
            return None;
        }

        let declared = response.content_type.as_deref().and_then(MediaType::parse);

        match declared {
            Some(media) if media.mime != MIME_TYPE_OCTET_STREAM => Some(media),
            declared => {
                let charset = declared.and_then(|media| media.charset);
                guess_mime_from_extension(&response.final_url)
                    .or_else(|| guess_mime_from_extension(address))
                    .map(|mime| MediaType {
                        mime: mime.to_string(),
                        charset,
                    })
            }
        }
    }

    /// Classify the address into a content type tag
    pub async fn classify(&self, address: &str) -> ContentType {
        let content_type = self
            .probe(address)
            .await
            .map(|media| media.content_type())
            .unwrap_or(ContentType::Unsupported);

        debug!(%address, %content_type, "classified address");
        content_type
    }
}

#[async_trait]
impl<C: HttpClient> ContentTypeDetector for ContentTypeClassifier<C> {
    async fn detect(&self, address: &str) -> ContentType {
        self.classify(address).await
    }
}
