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

//! The source/target transaction tuple and its lifecycle.

use crate::key::CorrelationKey;
use crate::observation::MessageCapture;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Outcome of transforming a source request for replay against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationStatus {
    Completed,
    Error,
    Skipped,
}

/// Target request buffers owned exclusively by their tuple.
///
/// `release` frees the buffers exactly once; a second call is a no-op.
/// An unreleased value is freed by normal ownership when dropped.
#[derive(Debug)]
pub struct TransformedPackets {
    packets: Option<Vec<Bytes>>,
}

impl TransformedPackets {
    pub fn new(packets: Vec<Bytes>) -> Self {
        Self {
            packets: Some(packets),
        }
    }

    /// Byte-stream view of the transformed request; empty once released.
    pub fn packets(&self) -> &[Bytes] {
        self.packets.as_deref().unwrap_or(&[])
    }

    pub fn is_released(&self) -> bool {
        self.packets.is_none()
    }

    /// Free the owned buffers. Idempotent.
    pub fn release(&mut self) {
        self.packets = None;
    }
}

/// Lifecycle of a transaction tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleState {
    /// Source data is captured; the replayed target has not finished yet.
    AwaitingTarget,
    /// Both sides are present (or the target terminally failed); the tuple
    /// is ready to serialize.
    Complete,
    /// Target request buffers have been released.
    Closed,
}

/// One correlated source/target transaction.
///
/// Terminal outcomes other than [`TransformationStatus::Completed`] still
/// carry whatever partial data exists and still serialize.
#[derive(Debug)]
pub struct TransactionTuple {
    pub key: CorrelationKey,
    pub source_request: MessageCapture,
    pub source_response: Option<MessageCapture>,
    pub target_request: TransformedPackets,
    pub target_response: Option<Vec<Bytes>>,
    /// Elapsed time the replayed target took to respond, tracked by the
    /// replay driver. Not the same kind of interval as the source side's
    /// packet-timestamp delta; the two are never unified.
    pub target_response_duration: Duration,
    pub transformation_status: TransformationStatus,
    pub error_cause: Option<String>,
    state: TupleState,
}

impl TransactionTuple {
    /// Build a tuple with both sides already in hand.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key: CorrelationKey,
        source_request: MessageCapture,
        source_response: Option<MessageCapture>,
        target_request: TransformedPackets,
        target_response: Option<Vec<Bytes>>,
        target_response_duration: Duration,
        transformation_status: TransformationStatus,
        error_cause: Option<String>,
    ) -> Self {
        Self {
            key,
            source_request,
            source_response,
            target_request,
            target_response,
            target_response_duration,
            transformation_status,
            error_cause,
            state: TupleState::Complete,
        }
    }

    /// Build a tuple whose target side is still being replayed.
    pub fn awaiting_target(
        key: CorrelationKey,
        source_request: MessageCapture,
        source_response: Option<MessageCapture>,
        target_request: TransformedPackets,
    ) -> Self {
        Self {
            key,
            source_request,
            source_response,
            target_request,
            target_response: None,
            target_response_duration: Duration::ZERO,
            transformation_status: TransformationStatus::Completed,
            error_cause: None,
            state: TupleState::AwaitingTarget,
        }
    }

    /// Attach the replayed target response and mark the tuple complete.
    pub fn complete_with_target(&mut self, chunks: Vec<Bytes>, elapsed: Duration) {
        self.target_response = Some(chunks);
        self.target_response_duration = elapsed;
        self.state = TupleState::Complete;
    }

    /// Mark the tuple complete without target data, recording why.
    pub fn complete_with_failure(&mut self, status: TransformationStatus, cause: Option<String>) {
        self.transformation_status = status;
        self.error_cause = cause;
        self.state = TupleState::Complete;
    }

    pub fn state(&self) -> TupleState {
        self.state
    }

    /// Release the owned target request buffers. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.target_request.release();
        self.state = TupleState::Closed;
    }
}

impl fmt::Display for TransactionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionTuple{{key={}, state={:?}, status={:?}, source_packets={}, \
             source_response={}, target_released={}, target_response_chunks={}, error={}}}",
            self.key,
            self.state,
            self.transformation_status,
            self.source_request.packets.len(),
            self.source_response.is_some(),
            self.target_request.is_released(),
            self.target_response.as_ref().map(Vec::len).unwrap_or(0),
            self.error_cause.as_deref().unwrap_or("none"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_tuple() -> TransactionTuple {
        TransactionTuple::new(
            CorrelationKey::new("c1", 0),
            MessageCapture::new(vec![Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n")], Utc::now()),
            None,
            TransformedPackets::new(vec![Bytes::from_static(b"GET / HTTP/1.1\r\n\r\n")]),
            None,
            Duration::ZERO,
            TransformationStatus::Completed,
            None,
        )
    }

    #[test]
    fn close_is_idempotent() {
        let mut tuple = sample_tuple();
        assert!(!tuple.target_request.is_released());

        tuple.close();
        assert!(tuple.target_request.is_released());
        assert_eq!(tuple.state(), TupleState::Closed);

        // A second close must not error or change anything.
        tuple.close();
        assert!(tuple.target_request.is_released());
        assert_eq!(tuple.state(), TupleState::Closed);
    }

    #[test]
    fn released_packets_read_as_empty() {
        let mut packets = TransformedPackets::new(vec![Bytes::from_static(b"abc")]);
        assert_eq!(packets.packets().len(), 1);
        packets.release();
        assert!(packets.packets().is_empty());
        packets.release();
        assert!(packets.packets().is_empty());
    }

    #[test]
    fn awaiting_target_completes_with_response() {
        let mut tuple = TransactionTuple::awaiting_target(
            CorrelationKey::new("c2", 1),
            MessageCapture::new(vec![Bytes::from_static(b"req")], Utc::now()),
            None,
            TransformedPackets::new(vec![]),
        );
        assert_eq!(tuple.state(), TupleState::AwaitingTarget);

        tuple.complete_with_target(
            vec![Bytes::from_static(b"HTTP/1.1 200 OK\r\n\r\n")],
            Duration::from_millis(12),
        );
        assert_eq!(tuple.state(), TupleState::Complete);
        assert_eq!(tuple.target_response_duration, Duration::from_millis(12));
    }

    #[test]
    fn failed_target_still_reaches_complete() {
        let mut tuple = TransactionTuple::awaiting_target(
            CorrelationKey::new("c3", 0),
            MessageCapture::new(vec![Bytes::from_static(b"req")], Utc::now()),
            None,
            TransformedPackets::new(vec![]),
        );
        tuple.complete_with_failure(
            TransformationStatus::Error,
            Some("connection refused".to_owned()),
        );
        assert_eq!(tuple.state(), TupleState::Complete);
        assert_eq!(tuple.transformation_status, TransformationStatus::Error);
        assert!(tuple.target_response.is_none());
    }
}
