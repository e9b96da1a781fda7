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

//! Capture sources: the async chunk supply and its bounded adapter.

use async_trait::async_trait;
use std::collections::VecDeque;
use wireplay_core::{RawChunk, ReplayError, Result, StreamChunkKey};

/// Number of chunks a bounded source returns by default.
pub const DEFAULT_CHUNK_CAP: u64 = 1000;

/// Supplies ordered batches of raw capture chunks.
///
/// Single-outstanding contract: callers must observe the result of one
/// `read_next_chunk_batch` call before issuing the next. The exclusive
/// borrow enforces this at compile time for direct owners. An abandoned
/// in-flight call leaves the source's state unchanged for that call.
#[async_trait]
pub trait CaptureSource: Send {
    /// Read the next ordered batch of chunks.
    async fn read_next_chunk_batch(&mut self) -> Result<Vec<RawChunk>>;

    /// Acknowledge that a chunk has been fully processed, for sources that
    /// checkpoint. Sources without persistence treat this as a no-op.
    fn commit(&mut self, _key: &StreamChunkKey) {}
}

/// Deterministic source over pre-built batches, for tests and offline
/// replays of already-decoded captures.
#[derive(Debug, Default)]
pub struct InMemorySource {
    batches: VecDeque<Vec<RawChunk>>,
    returned: u64,
}

impl InMemorySource {
    pub fn new(batches: impl IntoIterator<Item = Vec<RawChunk>>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
            returned: 0,
        }
    }
}

#[async_trait]
impl CaptureSource for InMemorySource {
    async fn read_next_chunk_batch(&mut self) -> Result<Vec<RawChunk>> {
        match self.batches.pop_front() {
            Some(batch) => {
                self.returned += batch.len() as u64;
                Ok(batch)
            }
            None => Err(ReplayError::SourceExhausted {
                after: self.returned,
            }),
        }
    }
}

/// Caps the total number of chunks an inner source may return.
///
/// Once the cap is reached, every subsequent call fails with
/// [`ReplayError::SourceExhausted`] so callers can tell bounded-input
/// termination apart from an I/O failure. A batch that would overshoot the
/// cap is truncated, so the chunks ever returned sum to at most the cap.
///
/// The remaining-chunk accounting is a plain integer touched only under
/// `&mut self`; a debug-build assertion catches re-entrant misuse through
/// shared handles.
#[derive(Debug)]
pub struct BoundedSource<S> {
    inner: S,
    cap: Option<u64>,
    returned: u64,
    #[cfg(debug_assertions)]
    in_flight: std::sync::atomic::AtomicBool,
}

impl<S: CaptureSource> BoundedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_cap(inner, DEFAULT_CHUNK_CAP)
    }

    pub fn with_cap(inner: S, cap: u64) -> Self {
        Self {
            inner,
            cap: Some(cap),
            returned: 0,
            #[cfg(debug_assertions)]
            in_flight: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Pass the inner source through without any cap.
    pub fn unbounded(inner: S) -> Self {
        Self {
            inner,
            cap: None,
            returned: 0,
            #[cfg(debug_assertions)]
            in_flight: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Chunks returned so far.
    pub fn chunks_returned(&self) -> u64 {
        self.returned
    }
}

#[cfg(debug_assertions)]
struct ReentryGuard<'a>(&'a std::sync::atomic::AtomicBool);

#[cfg(debug_assertions)]
impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, std::sync::atomic::Ordering::Release);
    }
}

#[async_trait]
impl<S: CaptureSource> CaptureSource for BoundedSource<S> {
    async fn read_next_chunk_batch(&mut self) -> Result<Vec<RawChunk>> {
        #[cfg(debug_assertions)]
        let _guard = {
            let was_in_flight = self
                .in_flight
                .swap(true, std::sync::atomic::Ordering::AcqRel);
            assert!(
                !was_in_flight,
                "{}",
                ReplayError::ContractViolation(
                    "read_next_chunk_batch re-entered while a call was outstanding"
                )
            );
            ReentryGuard(&self.in_flight)
        };

        if let Some(cap) = self.cap {
            if self.returned >= cap {
                return Err(ReplayError::SourceExhausted {
                    after: self.returned,
                });
            }
        }
        let mut batch = self.inner.read_next_chunk_batch().await?;
        if let Some(cap) = self.cap {
            let remaining = (cap - self.returned) as usize;
            if batch.len() > remaining {
                tracing::debug!(
                    dropped = batch.len() - remaining,
                    "Truncating final batch at chunk cap"
                );
                batch.truncate(remaining);
            }
        }
        self.returned += batch.len() as u64;
        Ok(batch)
    }

    fn commit(&mut self, key: &StreamChunkKey) {
        self.inner.commit(key)
    }
}
