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

//! Enriches raw chunks with pre-chunk progress snapshots.

use crate::progress::ConnectionProgressTracker;
use wireplay_core::{EnrichedChunk, RawChunk};

/// Transforms each raw chunk into an enriched chunk carrying the state a
/// consumer needs to resume message framing across the previous chunk
/// boundary.
///
/// Ordering is snapshot-then-apply: the enrichment fields are copied out of
/// the connection's progress *before* the chunk's observations are folded
/// in, so they describe state entering the chunk.
#[derive(Debug, Default)]
pub struct StreamUpgrader {
    tracker: ConnectionProgressTracker,
}

impl StreamUpgrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrich one chunk and advance the connection's progress.
    ///
    /// Chunks must arrive in stream order per connection. A terminal chunk
    /// retires the connection's progress entry; if the same connection id
    /// reappears later it starts fresh.
    pub fn upgrade(&mut self, chunk: RawChunk) -> EnrichedChunk {
        let progress = self
            .tracker
            .entry_or_insert(&chunk.key.connection_id, chunk.key.stream_index);

        let last_observation_was_unterminated_read = progress.last_was_read;
        let prior_requests_received = progress.request_count;

        progress.apply(&chunk);

        if chunk.key.is_terminal {
            self.tracker.remove(&chunk.key.connection_id);
            tracing::debug!(
                connection_id = %chunk.key.connection_id,
                "Retired progress for terminal chunk"
            );
        }

        EnrichedChunk {
            chunk,
            last_observation_was_unterminated_read,
            prior_requests_received,
        }
    }

    /// Connections with progress still held.
    pub fn open_connections(&self) -> usize {
        self.tracker.open_connections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireplay_core::{ObservationKind, ObservationRecord, StreamChunkKey};

    fn chunk_with_reads(conn: &str, index: u64, reads: usize) -> RawChunk {
        let observations = (0..reads)
            .map(|_| ObservationRecord::marker(ObservationKind::Read))
            .collect();
        RawChunk::new(StreamChunkKey::new(conn, index), "node-a", observations)
    }

    fn terminal_chunk(conn: &str, index: u64) -> RawChunk {
        RawChunk::new(StreamChunkKey::terminal(conn, index), "node-a", vec![])
    }

    #[test]
    fn prior_requests_snapshot_precedes_the_chunk() {
        let mut upgrader = StreamUpgrader::new();

        // Read counts [2, 0, 3]: the third chunk must see 2 prior requests.
        let first = upgrader.upgrade(chunk_with_reads("c1", 0, 2));
        assert_eq!(first.prior_requests_received, 0);

        let second = upgrader.upgrade(chunk_with_reads("c1", 1, 0));
        assert_eq!(second.prior_requests_received, 2);

        let third = upgrader.upgrade(chunk_with_reads("c1", 2, 3));
        assert_eq!(third.prior_requests_received, 2);

        let fourth = upgrader.upgrade(chunk_with_reads("c1", 3, 0));
        assert_eq!(fourth.prior_requests_received, 5);
    }

    #[test]
    fn first_chunk_at_index_zero_enters_clean() {
        let mut upgrader = StreamUpgrader::new();
        let enriched = upgrader.upgrade(chunk_with_reads("c1", 0, 1));
        assert!(!enriched.last_observation_was_unterminated_read);
    }

    #[test]
    fn midstream_first_chunk_assumes_unterminated_read() {
        let mut upgrader = StreamUpgrader::new();
        let enriched = upgrader.upgrade(chunk_with_reads("c1", 4, 1));
        assert!(enriched.last_observation_was_unterminated_read);
    }

    #[test]
    fn read_ending_chunk_marks_next_chunk_unterminated() {
        let mut upgrader = StreamUpgrader::new();

        let mut chunk = chunk_with_reads("c1", 0, 0);
        chunk.observations = vec![
            ObservationRecord::marker(ObservationKind::Write),
            ObservationRecord::marker(ObservationKind::Read),
        ];
        upgrader.upgrade(chunk);

        let next = upgrader.upgrade(chunk_with_reads("c1", 1, 0));
        assert!(next.last_observation_was_unterminated_read);
    }

    #[test]
    fn observations_pass_through_unchanged() {
        let mut upgrader = StreamUpgrader::new();
        let chunk = RawChunk::new(
            StreamChunkKey::new("c1", 0),
            "node-a",
            vec![
                ObservationRecord::new(ObservationKind::Read, &b"GET / HTTP/1.1\r\n"[..]),
                ObservationRecord::new(ObservationKind::Write, &b"HTTP/1.1 200 OK\r\n"[..]),
            ],
        );
        let enriched = upgrader.upgrade(chunk);
        assert_eq!(enriched.chunk.observations.len(), 2);
        assert_eq!(
            enriched.chunk.observations[0].data.as_ref(),
            b"GET / HTTP/1.1\r\n"
        );
        assert_eq!(enriched.chunk.node_id, "node-a");
    }

    #[test]
    fn terminal_chunk_resets_a_reappearing_connection() {
        let mut upgrader = StreamUpgrader::new();

        upgrader.upgrade(chunk_with_reads("c1", 0, 2));
        upgrader.upgrade(terminal_chunk("c1", 1));
        assert_eq!(upgrader.open_connections(), 0);

        // Same id reappearing at index 0: fresh progress, no carryover.
        let fresh = upgrader.upgrade(chunk_with_reads("c1", 0, 1));
        assert_eq!(fresh.prior_requests_received, 0);
        assert!(!fresh.last_observation_was_unterminated_read);

        // Reappearing mid-stream: the index alone decides the assumption.
        upgrader.upgrade(terminal_chunk("c1", 1));
        let resumed = upgrader.upgrade(chunk_with_reads("c1", 7, 0));
        assert!(resumed.last_observation_was_unterminated_read);
        assert_eq!(resumed.prior_requests_received, 0);
    }
}
