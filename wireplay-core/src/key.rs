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

//! Identity types: connections, capture chunks, and correlated requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one captured network connection, stable for the
/// connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identity of one delivered capture chunk within its connection's stream.
///
/// `stream_index` increases monotonically per connection; `is_terminal`
/// marks the last chunk the connection will ever produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamChunkKey {
    pub connection_id: ConnectionId,
    pub stream_index: u64,
    pub is_terminal: bool,
}

impl StreamChunkKey {
    pub fn new(connection_id: impl Into<ConnectionId>, stream_index: u64) -> Self {
        Self {
            connection_id: connection_id.into(),
            stream_index,
            is_terminal: false,
        }
    }

    /// Key for a connection's final chunk.
    pub fn terminal(connection_id: impl Into<ConnectionId>, stream_index: u64) -> Self {
        Self {
            connection_id: connection_id.into(),
            stream_index,
            is_terminal: true,
        }
    }
}

impl fmt::Display for StreamChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.connection_id, self.stream_index)?;
        if self.is_terminal {
            f.write_str("$")?;
        }
        Ok(())
    }
}

/// Links one source transaction to its replayed target transaction.
///
/// The string form `<connection>.<request index>` is what comparison
/// records emit as `connectionId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub connection_id: ConnectionId,
    pub request_index: u64,
}

impl CorrelationKey {
    pub fn new(connection_id: impl Into<ConnectionId>, request_index: u64) -> Self {
        Self {
            connection_id: connection_id.into(),
            request_index,
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.connection_id, self.request_index)
    }
}
