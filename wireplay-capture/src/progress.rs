// Copyright 2025 Wireplay Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Per-connection carry-forward state for request counting and framing.

use std::collections::HashMap;
use wireplay_core::{ConnectionId, RawChunk};

/// Carry-forward state for one open connection.
///
/// `last_was_read` reflects the final read-type observation of the most
/// recently applied chunk; `request_count` only ever grows for the
/// connection's lifetime.
#[derive(Debug, Clone)]
pub struct Progress {
    pub last_was_read: bool,
    pub request_count: u64,
}

impl Progress {
    fn new(last_was_read: bool) -> Self {
        Self {
            last_was_read,
            request_count: 0,
        }
    }

    /// Fold one chunk's observations into the state. An empty chunk leaves
    /// `last_was_read` untouched.
    pub fn apply(&mut self, chunk: &RawChunk) {
        if let Some(ends_in_read) = chunk.ends_in_read() {
            self.last_was_read = ends_in_read;
        }
        self.request_count += chunk.read_count();
    }
}

/// Progress entries for every connection with chunks still in flight.
///
/// Owned exclusively by the [`StreamUpgrader`](crate::StreamUpgrader);
/// nothing else reads or writes the entries, so no locking is involved.
/// Memory stays bounded by the number of concurrently open connections
/// because terminal chunks remove their entry.
#[derive(Debug, Default)]
pub struct ConnectionProgressTracker {
    connections: HashMap<ConnectionId, Progress>,
}

impl ConnectionProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a connection's progress, creating it on first sight.
    ///
    /// A connection first observed mid-stream (non-zero index) is assumed
    /// to be resuming an unterminated read, since its true prior state is
    /// unknown.
    pub fn entry_or_insert(
        &mut self,
        id: &ConnectionId,
        first_stream_index: u64,
    ) -> &mut Progress {
        self.connections
            .entry(id.clone())
            .or_insert_with(|| Progress::new(first_stream_index != 0))
    }

    /// Drop a connection's entry once its terminal chunk is processed.
    pub fn remove(&mut self, id: &ConnectionId) {
        self.connections.remove(id);
    }

    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireplay_core::{ObservationKind, ObservationRecord, StreamChunkKey};

    fn chunk(kinds: &[ObservationKind]) -> RawChunk {
        let observations = kinds.iter().map(|k| ObservationRecord::marker(*k)).collect();
        RawChunk::new(StreamChunkKey::new("c1", 0), "node-a", observations)
    }

    #[test]
    fn apply_counts_reads_and_tracks_final_observation() {
        use ObservationKind::*;
        let mut progress = Progress::new(false);

        progress.apply(&chunk(&[Read, Write]));
        assert!(!progress.last_was_read);
        assert_eq!(progress.request_count, 1);

        progress.apply(&chunk(&[Write, ReadSegment]));
        assert!(progress.last_was_read);
        assert_eq!(progress.request_count, 2);
    }

    #[test]
    fn empty_chunk_leaves_last_was_read_unchanged() {
        let mut progress = Progress::new(true);
        progress.apply(&chunk(&[]));
        assert!(progress.last_was_read);
        assert_eq!(progress.request_count, 0);
    }

    #[test]
    fn midstream_first_sight_assumes_unterminated_read() {
        let mut tracker = ConnectionProgressTracker::new();
        let fresh = ConnectionId::from("fresh");
        let resumed = ConnectionId::from("resumed");

        assert!(!tracker.entry_or_insert(&fresh, 0).last_was_read);
        assert!(tracker.entry_or_insert(&resumed, 5).last_was_read);

        // The stored state wins on later lookups; the index argument only
        // matters on first sight.
        assert!(!tracker.entry_or_insert(&fresh, 9).last_was_read);
    }

    #[test]
    fn remove_bounds_memory_to_open_connections() {
        let mut tracker = ConnectionProgressTracker::new();
        let id = ConnectionId::from("c1");
        tracker.entry_or_insert(&id, 0);
        assert_eq!(tracker.open_connections(), 1);
        tracker.remove(&id);
        assert_eq!(tracker.open_connections(), 0);
    }
}
