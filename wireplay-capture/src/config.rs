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

//! Ingestion configuration.

use crate::source::DEFAULT_CHUNK_CAP;
use serde::{Deserialize, Serialize};

/// Knobs for the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum number of chunks the source may ever return. `None` leaves
    /// the source unbounded.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: Option<u64>,
}

fn default_max_chunks() -> Option<u64> {
    Some(DEFAULT_CHUNK_CAP)
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
        }
    }
}

impl IngestConfig {
    pub fn unbounded() -> Self {
        Self { max_chunks: None }
    }
}
