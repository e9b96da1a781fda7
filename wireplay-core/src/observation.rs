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

//! Captured observation records and the chunk types that carry them.
//!
//! A capture stream delivers [`RawChunk`]s: ordered windows of socket
//! events for one connection, possibly fragmenting an HTTP message across
//! chunk boundaries. Ingestion enriches each chunk with the progress state
//! a consumer needs to resume framing where the previous chunk left off
//! (see [`EnrichedChunk`]).

use crate::key::StreamChunkKey;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind tag for one captured socket event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Read,
    ReadSegment,
    Write,
    WriteSegment,
    Close,
    Other,
}

impl ObservationKind {
    /// Reads and read segments both begin or continue an inbound request.
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadSegment)
    }
}

/// One captured event within a chunk, ordered by capture time.
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    pub kind: ObservationKind,
    pub data: Bytes,
}

impl ObservationRecord {
    pub fn new(kind: ObservationKind, data: impl Into<Bytes>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// An event that carries no payload, such as a close.
    pub fn marker(kind: ObservationKind) -> Self {
        Self {
            kind,
            data: Bytes::new(),
        }
    }
}

/// One delivered unit of observation records for a connection.
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub key: StreamChunkKey,
    /// Capture node that produced this chunk; carried through enrichment
    /// unchanged.
    pub node_id: String,
    pub observations: Vec<ObservationRecord>,
}

impl RawChunk {
    pub fn new(
        key: StreamChunkKey,
        node_id: impl Into<String>,
        observations: Vec<ObservationRecord>,
    ) -> Self {
        Self {
            key,
            node_id: node_id.into(),
            observations,
        }
    }

    /// Number of read-type observations in this chunk.
    pub fn read_count(&self) -> u64 {
        self.observations
            .iter()
            .filter(|o| o.kind.is_read())
            .count() as u64
    }

    /// Whether the final observation is a read, or `None` for an empty
    /// chunk.
    pub fn ends_in_read(&self) -> Option<bool> {
        self.observations.last().map(|o| o.kind.is_read())
    }
}

/// A raw chunk plus progress fields snapshotted *before* the chunk's
/// observations were folded into per-connection state.
///
/// The snapshot fields describe the state entering the chunk, which is what
/// a consumer needs to correctly resume an HTTP message that straddled the
/// previous chunk boundary.
#[derive(Debug, Clone)]
pub struct EnrichedChunk {
    pub chunk: RawChunk,
    /// Whether the previously processed chunk for this connection ended in
    /// an unterminated read.
    pub last_observation_was_unterminated_read: bool,
    /// How many requests this connection had received before this chunk.
    pub prior_requests_received: u64,
}

/// The packets of one captured HTTP message plus the time its last packet
/// was observed.
#[derive(Debug, Clone)]
pub struct MessageCapture {
    pub packets: Vec<Bytes>,
    pub last_packet_at: DateTime<Utc>,
}

impl MessageCapture {
    pub fn new(packets: Vec<Bytes>, last_packet_at: DateTime<Utc>) -> Self {
        Self {
            packets,
            last_packet_at,
        }
    }
}
