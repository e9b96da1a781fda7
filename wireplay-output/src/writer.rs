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

//! NDJSON comparison-record writer.

use crate::http::{parse_http_message, MessageRecord};
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::io::Write;
use wireplay_core::{ReplayError, Result, TransactionTuple};

/// Convert one tuple into its comparison record.
///
/// Never fails outward: unparseable message bytes become
/// `{"Exception": <reason>}` objects and are logged at warning level. A
/// side with no response data omits that key entirely.
///
/// Latency semantics differ by side and are deliberately not unified:
/// `sourceResponse.response_time_ms` is the delta between the request's and
/// response's last-packet timestamps, while `targetResponse.response_time_ms`
/// is the elapsed duration the replay driver tracked.
pub fn serialize_tuple(tuple: &TransactionTuple) -> Value {
    let mut record = Map::new();

    record.insert(
        "sourceRequest".to_owned(),
        message_json(&tuple.source_request.packets, None, "sourceRequest"),
    );
    record.insert(
        "targetRequest".to_owned(),
        message_json(tuple.target_request.packets(), None, "targetRequest"),
    );

    if let Some(response) = &tuple.source_response {
        let elapsed_ms = response
            .last_packet_at
            .signed_duration_since(tuple.source_request.last_packet_at)
            .num_milliseconds();
        record.insert(
            "sourceResponse".to_owned(),
            message_json(&response.packets, Some(elapsed_ms), "sourceResponse"),
        );
    }

    if let Some(chunks) = tuple.target_response.as_deref().filter(|c| !c.is_empty()) {
        let elapsed_ms = tuple.target_response_duration.as_millis() as i64;
        record.insert(
            "targetResponse".to_owned(),
            message_json(chunks, Some(elapsed_ms), "targetResponse"),
        );
    }

    record.insert(
        "connectionId".to_owned(),
        Value::String(tuple.key.to_string()),
    );

    Value::Object(record)
}

fn message_json(packets: &[Bytes], latency_ms: Option<i64>, side: &'static str) -> Value {
    let record = parse_http_message(packets);
    if let MessageRecord::Fallback { reason } = &record {
        tracing::warn!(
            side,
            reason = %reason,
            "Emitting fallback record for unparseable http message"
        );
    }
    let record = match latency_ms {
        Some(ms) => record.with_field("response_time_ms", Value::from(ms)),
        None => record,
    };
    record.into_json()
}

/// Serializes transaction tuples and writes them, one JSON object per line,
/// to a shared output sink.
///
/// Writes go through a mutex so lines from concurrently processed tuples
/// never interleave mid-record; each line is flushed immediately,
/// durability over batching. Every record is also mirrored to the
/// `wireplay::tuple_output` tracing target for operational visibility.
pub struct TupleWriter<W> {
    sink: Mutex<W>,
}

impl<W: Write> TupleWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Serialize one tuple and append it to the sink as a single line.
    ///
    /// Sink I/O errors propagate as [`ReplayError::SinkWriteFailure`];
    /// losing a record silently is not acceptable.
    pub fn write(&self, tuple: &TransactionTuple) -> Result<()> {
        let line = serialize_tuple(tuple).to_string();
        tracing::info!(
            target: "wireplay::tuple_output",
            connection_id = %tuple.key,
            "{line}"
        );

        let mut sink = self.sink.lock();
        sink.write_all(line.as_bytes())
            .map_err(ReplayError::SinkWriteFailure)?;
        sink.write_all(b"\n").map_err(ReplayError::SinkWriteFailure)?;
        sink.flush().map_err(ReplayError::SinkWriteFailure)?;
        Ok(())
    }

    /// Take the sink back, e.g. to inspect what a test wrote.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}
