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

//! Wireplay Output
//!
//! Turns a [`TransactionTuple`](wireplay_core::TransactionTuple) into one
//! newline-delimited JSON comparison record: raw HTTP bytes are split into
//! a flat header map plus a base64 body, source and target latencies are
//! attached, and the record is written line-by-line to a shared sink.

pub mod http;
pub mod writer;

pub use http::{parse_http_message, split_header_body, MessageRecord};
pub use writer::{serialize_tuple, TupleWriter};
