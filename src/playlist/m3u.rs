// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::{debug, warn};

use crate::content_type::{ContentType, ContentTypeDetector};
use crate::station::Station;

use super::CachedDetector;

const EXTINF_TAG: &str = "#EXTINF:";

/// Display name carried by an `#EXTINF:` line: the text after the first comma
fn extinf_name(line: &str) -> String {
    line[EXTINF_TAG.len()..]
        .split_once(',')
        .map(|(_, title)| title.trim().to_string())
        .unwrap_or_default()
}

/// Parse M3U playlist lines into stations.
///
/// Every stream line is classified through `detector`; entries of
/// unsupported type are dropped. An `#EXTINF:` name only applies to the
/// stream line that follows it.
pub async fn parse_m3u<D: ContentTypeDetector + ?Sized>(
    lines: &[String],
    detector: &D,
) -> Vec<Station> {
    let mut detector = CachedDetector::new(detector);
    let mut stations = Vec::new();
    let mut pending_name = String::new();

    for line in lines {
        let line = line.trim_start();

        if line.starts_with(EXTINF_TAG) {
            pending_name = extinf_name(line);
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let stream_uri = line.trim_end();
        let name = std::mem::take(&mut pending_name);

        let content_type = detector.detect(stream_uri).await;
        if content_type == ContentType::Unsupported {
            warn!(%stream_uri, "dropping playlist entry with unsupported content type");
            continue;
        }

        stations.push(Station::new(Some(&name), stream_uri, content_type));
    }

    debug!(stations = stations.len(), "parsed M3U playlist");
    stations
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::playlist::testing::{TableDetector, lines};

    #[tokio::test]
    async fn extinf_name_applies_to_next_stream() {
        let detector = TableDetector::with(&[("http://x/stream.mp3", ContentType::Mpeg)]);
        let stations = parse_m3u(&lines("#EXTINF:0,My Station\nhttp://x/stream.mp3"), &detector).await;

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "My Station");
        assert_eq!(stations[0].stream_uris, vec!["http://x/stream.mp3"]);
        assert_eq!(stations[0].stream_content_type, ContentType::Mpeg);
    }

    #[tokio::test]
    async fn indented_tags_are_recognised() {
        let detector = TableDetector::with(&[("http://x/stream.mp3", ContentType::Mpeg)]);
        let stations = parse_m3u(
            &lines("  #EXTM3U\n\t#EXTINF:-1,Indented Radio\n  http://x/stream.mp3  "),
            &detector,
        )
        .await;

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "Indented Radio");
        assert_eq!(stations[0].stream_uris, vec!["http://x/stream.mp3"]);
        assert_eq!(detector.call_count(), 1);
    }

    #[tokio::test]
    async fn stream_without_extinf_is_named_after_uri() {
        let detector = TableDetector::with(&[("http://x/stream.mp3", ContentType::Mpeg)]);
        let stations = parse_m3u(&lines("http://x/stream.mp3"), &detector).await;

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "http://x/stream.mp3");
    }

    #[tokio::test]
    async fn extinf_without_comma_yields_uri_name() {
        let detector = TableDetector::with(&[("http://x/a.mp3", ContentType::Mpeg)]);
        let stations = parse_m3u(&lines("#EXTINF:-1\nhttp://x/a.mp3"), &detector).await;

        assert_eq!(stations[0].name, "http://x/a.mp3");
    }

    #[tokio::test]
    async fn name_uses_text_after_first_comma_only() {
        let detector = TableDetector::with(&[("http://x/a.mp3", ContentType::Mpeg)]);
        let stations = parse_m3u(
            &lines("#EXTINF:-1 tvg-id=\"x\",Rock, Pop & More \nhttp://x/a.mp3"),
            &detector,
        )
        .await;

        assert_eq!(stations[0].name, "Rock, Pop & More");
    }

    #[tokio::test]
    async fn unsupported_entries_are_dropped_and_do_not_leak_names() {
        let detector = TableDetector::with(&[
            ("http://x/a.mp3", ContentType::Mpeg),
            ("http://x/c.ogg", ContentType::Ogg),
        ]);
        let playlist = "#EXTM3U\n\
                        #EXTINF:-1,First\n\
                        http://x/a.mp3\n\
                        #EXTINF:-1,Broken\n\
                        http://x/b.html\n\
                        http://x/c.ogg\n";
        let stations = parse_m3u(&lines(playlist), &detector).await;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "First");
        assert_eq!(stations[1].name, "http://x/c.ogg");
        assert_eq!(stations[1].stream_content_type, ContentType::Ogg);
    }

    #[tokio::test]
    async fn comments_and_blank_lines_are_ignored() {
        let detector = TableDetector::with(&[("http://x/a.aac", ContentType::Aac)]);
        let playlist = "#EXTM3U\n\n   \n#EXTVLCOPT:network-caching=1000\n  http://x/a.aac  \n";
        let stations = parse_m3u(&lines(playlist), &detector).await;

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].stream_uris, vec!["http://x/a.aac"]);
        assert_eq!(detector.call_count(), 1);
    }

    #[tokio::test]
    async fn station_count_matches_supported_stream_lines() {
        let detector = TableDetector::with(&[
            ("http://x/1.mp3", ContentType::Mpeg),
            ("http://x/2.m3u8", ContentType::Hls),
            ("http://x/4.mp3", ContentType::Mpeg),
        ]);
        let playlist = "http://x/1.mp3\n#c\nhttp://x/2.m3u8\nhttp://x/3.txt\n\nhttp://x/4.mp3";
        let stations = parse_m3u(&lines(playlist), &detector).await;

        assert_eq!(stations.len(), 3);
    }

    #[tokio::test]
    async fn repeated_uris_are_classified_once() {
        let detector = TableDetector::with(&[("http://x/a.mp3", ContentType::Mpeg)]);
        let playlist = "#EXTINF:-1,One\nhttp://x/a.mp3\n#EXTINF:-1,Two\nhttp://x/a.mp3";
        let stations = parse_m3u(&lines(playlist), &detector).await;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[1].name, "Two");
        assert_eq!(detector.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_playlist_yields_no_stations() {
        let detector = TableDetector::default();
        assert!(parse_m3u(&[], &detector).await.is_empty());
    }
}
