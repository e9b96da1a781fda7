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

//! Wireplay Capture Ingestion
//!
//! Converts a raw, possibly-fragmented capture stream into enriched
//! per-connection chunks. Each chunk is stamped with the progress state
//! that was in effect *before* the chunk, so downstream consumers can
//! delimit HTTP messages that span chunk boundaries.
//!
//! All per-connection state lives inside a single [`IngestPipeline`];
//! connections never share state across pipelines, so no locking is
//! involved on the ingestion path.

pub mod config;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod upgrader;

pub use config::IngestConfig;
pub use pipeline::IngestPipeline;
pub use progress::ConnectionProgressTracker;
pub use source::{BoundedSource, CaptureSource, InMemorySource, DEFAULT_CHUNK_CAP};
pub use upgrader::StreamUpgrader;
