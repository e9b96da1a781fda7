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

//! Wireplay Core
//!
//! Data model for capture-and-replay migration verification: connection and
//! chunk identity, captured observation records, the source/target
//! transaction tuple, and the shared error taxonomy.

pub mod error;
pub mod key;
pub mod observation;
pub mod tuple;

pub use error::{ReplayError, Result};
pub use key::{ConnectionId, CorrelationKey, StreamChunkKey};
pub use observation::{
    EnrichedChunk, MessageCapture, ObservationKind, ObservationRecord, RawChunk,
};
pub use tuple::{TransactionTuple, TransformationStatus, TransformedPackets, TupleState};
