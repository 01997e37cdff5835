// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::content_type::MediaType;
use crate::error::FetchError;
use crate::http::HttpClient;

/// Lines read from a playlist before the download is abandoned
pub const MAX_PLAYLIST_LINES: usize = 100;

/// Characters kept from a single playlist line
pub const MAX_LINE_CHARS: usize = 2000;

/// Caps applied while downloading a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_lines: usize,
    pub max_line_chars: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_lines: MAX_PLAYLIST_LINES,
            max_line_chars: MAX_LINE_CHARS,
        }
    }
}

/// Pick the encoding named by a Content-Type charset parameter.
///
/// Lines are split on raw `\n`/`\r` bytes, so only ASCII-compatible
/// encodings are honoured; anything else falls back to UTF-8.
pub fn encoding_for_charset(charset: Option<&str>) -> &'static Encoding {
    charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .filter(|encoding| encoding.is_ascii_compatible())
        .unwrap_or(UTF_8)
}

/// Splits a byte stream into bounded lines.
///
/// Bytes beyond the per-line cap are dropped as they arrive, so memory stays
/// bounded no matter how the transport chunks the body.
struct LineCollector {
    limits: FetchLimits,
    encoding: &'static Encoding,
    lines: Vec<String>,
    current: Vec<u8>,
    after_cr: bool,
}

impl LineCollector {
    fn new(limits: FetchLimits, encoding: &'static Encoding) -> Self {
        Self {
            limits,
            encoding,
            lines: Vec::new(),
            current: Vec::new(),
            after_cr: false,
        }
    }

    fn is_full(&self) -> bool {
        self.lines.len() >= self.limits.max_lines
    }

    /// Feed a chunk of the body. Returns false once the line cap is reached.
    fn push(&mut self, chunk: &[u8]) -> bool {
        // No supported encoding needs more than four bytes per character
        let max_bytes = self.limits.max_line_chars.saturating_mul(4);

        for &byte in chunk {
            if self.is_full() {
                return false;
            }

            match byte {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    self.after_cr = byte == b'\r';
                    self.end_line();
                }
                _ => {
                    self.after_cr = false;
                    if self.current.len() < max_bytes {
                        self.current.push(byte);
                    }
                }
            }
        }

        !self.is_full()
    }

    fn end_line(&mut self) {
        let (decoded, _) = self.encoding.decode_without_bom_handling(&self.current);
        let mut line = decoded.into_owned();
        self.current.clear();

        if self.lines.is_empty()
            && let Some(stripped) = line.strip_prefix('\u{feff}')
        {
            line = stripped.to_string();
        }

        if let Some((cut, _)) = line.char_indices().nth(self.limits.max_line_chars) {
            line.truncate(cut);
        }

        self.lines.push(line);
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() && !self.is_full() {
            self.end_line();
        }
        self.lines
    }
}

/// Download a playlist, keeping at most `limits.max_lines` lines of at most
/// `limits.max_line_chars` characters each.
///
/// The download stops as soon as enough lines have been read.
pub async fn fetch_playlist<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    limits: FetchLimits,
) -> Result<Vec<String>, FetchError> {
    let response = client
        .get_stream(url)
        .await
        .map_err(|e| FetchError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !(200..300).contains(&response.status) {
        warn!(%url, status = response.status, "playlist download rejected");
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let charset = response
        .content_type
        .as_deref()
        .and_then(MediaType::parse)
        .and_then(|media| media.charset);
    let encoding = encoding_for_charset(charset.as_deref());

    let mut collector = LineCollector::new(limits, encoding);
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        if !collector.push(&chunk) {
            debug!(%url, max_lines = limits.max_lines, "playlist line cap reached");
            break;
        }
    }

    let lines = collector.finish();
    debug!(%url, lines = lines.len(), "playlist downloaded");
    Ok(lines)
}
