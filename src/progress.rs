// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use crate::content_type::ContentType;

/// Events emitted while resolving a station address
#[derive(Debug, Clone)]
pub enum ResolveEvent {
    /// The address is being probed for its content type
    Probing { address: String },

    /// The probe finished
    Classified {
        address: String,
        content_type: ContentType,
    },

    /// A playlist is being downloaded
    FetchingPlaylist { url: String },

    /// A playlist was downloaded and parsed
    PlaylistParsed {
        url: String,
        /// Lines kept after applying the fetch caps
        lines: usize,
        stations: usize,
    },

    /// The address was resolved before; nothing new to report
    DuplicateAddress { address: String },

    /// The address does not point at anything playable.
    /// Front ends show this as a "not a valid station" notice.
    InvalidStation { address: String },

    /// Resolution finished
    Resolved { address: String, stations: usize },
}

/// Trait for reporting progress events during resolution.
///
/// Implementations can use this to display spinners, notices,
/// or collect statistics.
pub trait ResolveReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ResolveEvent);
}

/// A shared reference to a reporter
pub type SharedResolveReporter = Arc<dyn ResolveReporter>;

/// A no-op reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ResolveReporter for NoopReporter {
    fn report(&self, _event: ResolveEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedResolveReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every event it receives
    #[derive(Default)]
    pub struct RecordingReporter {
        pub events: Mutex<Vec<ResolveEvent>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<ResolveEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ResolveReporter for RecordingReporter {
        fn report(&self, event: ResolveEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
