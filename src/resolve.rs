// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::content_type::{ContentType, ContentTypeClassifier};
use crate::error::ResolveError;
use crate::http::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, HttpClient, ReqwestClient};
use crate::playlist::{FetchLimits, fetch_playlist, parse_m3u, parse_pls};
use crate::progress::{NoopReporter, ResolveEvent, SharedResolveReporter};
use crate::station::Station;

/// Options for station resolution
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Overall timeout of a single HTTP request, body included
    pub timeout: Duration,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Caps applied to downloaded playlists
    pub limits: FetchLimits,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            limits: FetchLimits::default(),
        }
    }
}

impl ResolverOptions {
    /// Build a reqwest client honouring these timeouts
    pub fn build_client(&self) -> Result<ReqwestClient, reqwest::Error> {
        ReqwestClient::with_timeouts(self.timeout, self.connect_timeout)
    }
}

/// Outcome of resolving one address
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Stations found. Empty for malformed input, a repeated direct address,
    /// or a playlist without usable entries.
    Stations(Vec<Station>),
    /// The address points at nothing playable
    Unsupported { address: String },
}

impl Resolution {
    pub fn stations(&self) -> &[Station] {
        match self {
            Resolution::Stations(stations) => stations,
            Resolution::Unsupported { .. } => &[],
        }
    }

    pub fn into_stations(self) -> Vec<Station> {
        match self {
            Resolution::Stations(stations) => stations,
            Resolution::Unsupported { .. } => Vec::new(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Resolution::Unsupported { .. })
    }
}

/// Only absolute http(s) URLs with a host are worth probing
fn is_valid_address(address: &str) -> bool {
    Url::parse(address)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// Turns user-entered addresses into playable stations.
///
/// The resolver remembers the last direct stream address it resolved and
/// suppresses an immediate resubmission of it. That memory is shared by
/// clones and is last-write-wins: overlapping resolutions on the same
/// resolver may race on it.
#[derive(Clone)]
pub struct StationResolver<C> {
    classifier: ContentTypeClassifier<C>,
    limits: FetchLimits,
    reporter: SharedResolveReporter,
    last_resolved: Arc<Mutex<Option<String>>>,
}

impl StationResolver<ReqwestClient> {
    /// Create a resolver backed by reqwest, configured from `options`
    pub fn from_options(options: &ResolverOptions) -> Result<Self, reqwest::Error> {
        Ok(Self::new(options.build_client()?).with_limits(options.limits))
    }
}

impl<C: HttpClient> StationResolver<C> {
    pub fn new(client: C) -> Self {
        Self {
            classifier: ContentTypeClassifier::new(client),
            limits: FetchLimits::default(),
            reporter: NoopReporter::shared(),
            last_resolved: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_limits(mut self, limits: FetchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_reporter(mut self, reporter: SharedResolveReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// The direct stream address most recently resolved
    pub async fn last_resolved(&self) -> Option<String> {
        self.last_resolved.lock().await.clone()
    }

    /// Clear the resubmission memory
    pub async fn forget_last_resolved(&self) {
        *self.last_resolved.lock().await = None;
    }

    /// Resolve an address into stations.
    ///
    /// This is the main entry point for the library. It:
    /// 1. Drops addresses that are not http(s) URLs
    /// 2. Probes the content type
    /// 3. Downloads and parses playlists, or wraps a direct stream
    ///
    /// Only a failed playlist download is an error; an unplayable address
    /// yields [`Resolution::Unsupported`].
    pub async fn resolve(&self, address: &str) -> Result<Resolution, ResolveError> {
        let address = address.trim();
        if !is_valid_address(address) {
            debug!(%address, "ignoring malformed address");
            return Ok(Resolution::Stations(Vec::new()));
        }

        self.reporter.report(ResolveEvent::Probing {
            address: address.to_string(),
        });
        let content_type = self.classifier.classify(address).await;
        self.reporter.report(ResolveEvent::Classified {
            address: address.to_string(),
            content_type,
        });

        let stations = match content_type {
            ContentType::M3u | ContentType::Pls => {
                self.resolve_playlist(address, content_type).await?
            }
            ContentType::Unsupported => {
                info!(%address, "address is not a valid station");
                self.reporter.report(ResolveEvent::InvalidStation {
                    address: address.to_string(),
                });
                return Ok(Resolution::Unsupported {
                    address: address.to_string(),
                });
            }
            stream => self.resolve_stream(address, stream).await,
        };

        info!(%address, %content_type, stations = stations.len(), "resolved address");
        self.reporter.report(ResolveEvent::Resolved {
            address: address.to_string(),
            stations: stations.len(),
        });

        Ok(Resolution::Stations(stations))
    }

    async fn resolve_playlist(
        &self,
        url: &str,
        content_type: ContentType,
    ) -> Result<Vec<Station>, ResolveError> {
        self.reporter.report(ResolveEvent::FetchingPlaylist {
            url: url.to_string(),
        });

        let lines = fetch_playlist(self.classifier.client(), url, self.limits)
            .await
            .inspect_err(|e| warn!(%url, error = %e, "playlist download failed"))?;

        let stations = if content_type == ContentType::Pls {
            parse_pls(&lines, &self.classifier).await
        } else {
            parse_m3u(&lines, &self.classifier).await
        };

        self.reporter.report(ResolveEvent::PlaylistParsed {
            url: url.to_string(),
            lines: lines.len(),
            stations: stations.len(),
        });

        Ok(stations)
    }

    async fn resolve_stream(&self, address: &str, content_type: ContentType) -> Vec<Station> {
        let duplicate = {
            let mut last = self.last_resolved.lock().await;
            let duplicate = last.as_deref() == Some(address);
            *last = Some(address.to_string());
            duplicate
        };

        if duplicate {
            debug!(%address, "suppressing repeated address");
            self.reporter.report(ResolveEvent::DuplicateAddress {
                address: address.to_string(),
            });
            return Vec::new();
        }

        vec![Station::new(None, address, content_type)]
    }
}

impl<C: HttpClient + Clone + 'static> StationResolver<C> {
    /// Resolve an address on a background task.
    ///
    /// The result is delivered once through the returned handle. Dropping
    /// the handle abandons the work, including any in-flight download.
    pub fn spawn(&self, address: impl Into<String>) -> ResolveHandle {
        let resolver = self.clone();
        let address = address.into();

        let task = tokio::spawn(async move { resolver.resolve(&address).await });

        ResolveHandle { task }
    }
}

/// Handle to a resolution running in the background
pub struct ResolveHandle {
    task: JoinHandle<Result<Resolution, ResolveError>>,
}

impl ResolveHandle {
    /// Wait for the resolution to finish
    pub async fn outcome(mut self) -> Result<Resolution, ResolveError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "resolution task did not complete");
                Err(ResolveError::Cancelled)
            }
        }
    }

    /// Abandon the resolution; its result is discarded
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ResolveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
