// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::content_type::{ContentType, ContentTypeDetector};
use crate::station::Station;

use super::CachedDetector;

#[derive(Debug, Default)]
struct PlsEntry {
    file: Option<String>,
    title: Option<String>,
}

/// Index of a `File12` style key; must be a positive decimal number
fn indexed_key(key: &str, prefix: &str) -> Option<u32> {
    if key.len() <= prefix.len() || !key.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, digits) = key.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

/// Collect `FileN`/`TitleN` pairs keyed by N. First occurrence of a key wins.
fn collect_entries(lines: &[String]) -> (BTreeMap<u32, PlsEntry>, Option<u32>) {
    let mut entries: BTreeMap<u32, PlsEntry> = BTreeMap::new();
    let mut declared_count = None;

    for line in lines {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if key.eq_ignore_ascii_case("NumberOfEntries") {
            if declared_count.is_none() {
                declared_count = value.parse().ok();
            }
        } else if let Some(index) = indexed_key(key, "File") {
            let entry = entries.entry(index).or_default();
            if entry.file.is_none() && !value.is_empty() {
                entry.file = Some(value.to_string());
            }
        } else if let Some(index) = indexed_key(key, "Title") {
            let entry = entries.entry(index).or_default();
            if entry.title.is_none() {
                entry.title = Some(value.to_string());
            }
        }
    }

    (entries, declared_count)
}

/// Parse PLS playlist lines into stations.
///
/// Entries are emitted in index order. Indices that are malformed, zero, or
/// above a declared `NumberOfEntries` are skipped, as are entries whose
/// stream classifies as unsupported.
pub async fn parse_pls<D: ContentTypeDetector + ?Sized>(
    lines: &[String],
    detector: &D,
) -> Vec<Station> {
    let (entries, declared_count) = collect_entries(lines);
    let mut detector = CachedDetector::new(detector);
    let mut stations = Vec::new();

    for (index, entry) in entries {
        if declared_count.is_some_and(|count| index > count) {
            debug!(index, "skipping PLS entry beyond NumberOfEntries");
            continue;
        }

        let Some(stream_uri) = entry.file else {
            continue;
        };

        let content_type = detector.detect(&stream_uri).await;
        if content_type == ContentType::Unsupported {
            warn!(%stream_uri, "dropping playlist entry with unsupported content type");
            continue;
        }

        stations.push(Station::new(entry.title.as_deref(), &stream_uri, content_type));
    }

    debug!(stations = stations.len(), "parsed PLS playlist");
    stations
}
