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

//! The single-owner ingestion boundary: bounded reads plus enrichment.

use crate::config::IngestConfig;
use crate::source::{BoundedSource, CaptureSource};
use crate::upgrader::StreamUpgrader;
use wireplay_core::{EnrichedChunk, Result, StreamChunkKey};

/// Owns the bounded source and all per-connection progress state.
///
/// Every chunk for a connection flows through this one value, so progress
/// entries never need cross-task locking. Other components reach the state
/// only through [`next_batch`](Self::next_batch) and
/// [`commit`](Self::commit).
pub struct IngestPipeline<S> {
    source: BoundedSource<S>,
    upgrader: StreamUpgrader,
}

impl<S: CaptureSource> IngestPipeline<S> {
    pub fn new(source: S, config: &IngestConfig) -> Self {
        let source = match config.max_chunks {
            Some(cap) => BoundedSource::with_cap(source, cap),
            None => BoundedSource::unbounded(source),
        };
        Self {
            source,
            upgrader: StreamUpgrader::new(),
        }
    }

    /// Read the next batch from the source and enrich every chunk in
    /// arrival order.
    ///
    /// Fails with [`ReplayError::SourceExhausted`] once a bounded source
    /// has nothing more to give; that condition is the caller's signal to
    /// stop, not a fault.
    ///
    /// [`ReplayError::SourceExhausted`]: wireplay_core::ReplayError::SourceExhausted
    pub async fn next_batch(&mut self) -> Result<Vec<EnrichedChunk>> {
        let batch = self.source.read_next_chunk_batch().await?;
        tracing::debug!(chunks = batch.len(), "Upgrading capture chunk batch");
        Ok(batch
            .into_iter()
            .map(|chunk| self.upgrader.upgrade(chunk))
            .collect())
    }

    /// Acknowledge a fully processed chunk for checkpointing sources.
    pub fn commit(&mut self, key: &StreamChunkKey) {
        self.source.commit(key);
    }

    pub fn open_connections(&self) -> usize {
        self.upgrader.open_connections()
    }
}
