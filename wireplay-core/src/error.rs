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

//! Error taxonomy for the capture/replay pipeline.

use thiserror::Error;

/// Result type for capture/replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Errors that can occur while ingesting captures or emitting records.
///
/// Failures are isolated at tuple granularity: a malformed message never
/// aborts processing of other tuples.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A bounded capture source has returned every chunk it will ever
    /// return. Expected termination for bounded inputs, not a fault;
    /// callers check for it with [`ReplayError::is_exhausted`].
    #[error("capture source exhausted after {after} chunks")]
    SourceExhausted { after: u64 },

    /// The capture source failed while fetching the next chunk batch.
    #[error("capture source read failed: {0}")]
    SourceRead(#[source] std::io::Error),

    /// A header/body split or header parse failed. Recovered locally by
    /// emitting a fallback record; logged at warning level.
    #[error("malformed http message: {0}")]
    MalformedMessage(String),

    /// Concurrent misuse of a single-outstanding-request component.
    /// Fatal: surfaced through debug assertions, never silently retried.
    #[error("single-outstanding contract violated: {0}")]
    ContractViolation(&'static str),

    /// The output sink failed while writing a tuple record. Propagated,
    /// since silently dropping a record is not acceptable.
    #[error("failed to write tuple record: {0}")]
    SinkWriteFailure(#[source] std::io::Error),
}

impl ReplayError {
    /// True for the expected end-of-bounded-input condition, as opposed to
    /// any genuine failure.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::SourceExhausted { .. })
    }
}
