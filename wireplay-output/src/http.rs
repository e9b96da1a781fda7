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

//! HTTP byte-to-record conversion.
//!
//! Captured messages are split at the first blank-line boundary into a
//! header block and a body. The header block becomes a flat key/value map
//! in which start-line tokens and header names share one namespace; the
//! body is base64-encoded under `"body"`. The flat shape is kept for
//! compatibility with existing record consumers, so a header literally
//! named `body` is not distinguishable from the synthetic field.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde_json::{Map, Value};
use wireplay_core::{ReplayError, Result};

/// Byte length of the `\r\n\r\n` boundary between header block and body.
const BOUNDARY_LEN: usize = 4;

/// Result of converting one HTTP message's bytes into record fields.
///
/// Callers must handle both variants: a `Fallback` still produces a record
/// (`{"Exception": <reason>}`) so a malformed message never loses its
/// tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRecord {
    Parsed(Map<String, Value>),
    Fallback { reason: String },
}

impl MessageRecord {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Attach an extra field to a parsed record. Fallback records carry
    /// only their `Exception` field and are left untouched.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        if let Self::Parsed(map) = &mut self {
            map.insert(key.to_owned(), value);
        }
        self
    }

    pub fn into_json(self) -> Value {
        match self {
            Self::Parsed(map) => Value::Object(map),
            Self::Fallback { reason } => {
                let mut map = Map::new();
                map.insert("Exception".to_owned(), Value::String(reason));
                Value::Object(map)
            }
        }
    }
}

/// Split concatenated message bytes at the first `\r\n\r\n` boundary.
///
/// Returns the header block (which must decode as UTF-8) and the body
/// bytes. The body is re-derived from the concatenated chunks by skipping
/// exactly `header.len() + 4` bytes rather than by rewinding any partially
/// consumed reader, so a body that itself contains a blank-line pattern is
/// returned intact.
pub fn split_header_body(packets: &[Bytes]) -> Result<(String, Vec<u8>)> {
    let joined = concat_packets(packets);
    let boundary = find_boundary(&joined).ok_or_else(|| {
        ReplayError::MalformedMessage(
            "no blank-line boundary between headers and body".to_owned(),
        )
    })?;
    let header = std::str::from_utf8(&joined[..boundary])
        .map_err(|e| ReplayError::MalformedMessage(format!("header block is not utf-8: {e}")))?
        .to_owned();
    let body = joined[boundary + BOUNDARY_LEN..].to_vec();
    Ok((header, body))
}

/// Convert one message's packets into a flat record.
///
/// Request start lines yield `Method`, `Request-URI` and `HTTP-Version`;
/// status lines yield `HTTP-Version`, `Status-Code` and `Reason-Phrase`.
/// Subsequent `Name: value` lines land in the same map; the body goes
/// under `body` as base64. Any failure becomes a
/// [`MessageRecord::Fallback`].
pub fn parse_http_message(packets: &[Bytes]) -> MessageRecord {
    match parse_message_inner(packets) {
        Ok(map) => MessageRecord::Parsed(map),
        Err(e) => MessageRecord::Fallback {
            reason: e.to_string(),
        },
    }
}

fn parse_message_inner(packets: &[Bytes]) -> Result<Map<String, Value>> {
    let (header, body) = split_header_body(packets)?;

    let mut lines = header.split("\r\n");
    let start_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| ReplayError::MalformedMessage("empty header block".to_owned()))?;

    let mut map = parse_start_line(start_line)?;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            ReplayError::MalformedMessage(format!("header line without a colon: {line:?}"))
        })?;
        map.insert(
            name.trim().to_owned(),
            Value::String(value.trim().to_owned()),
        );
    }

    map.insert("body".to_owned(), Value::String(BASE64.encode(&body)));
    Ok(map)
}

fn parse_start_line(line: &str) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    let mut parts = line.splitn(3, ' ');

    if line.starts_with("HTTP/") {
        // Status line: HTTP-Version SP Status-Code SP Reason-Phrase
        let version = parts.next().unwrap_or_default();
        let code = parts.next().ok_or_else(|| {
            ReplayError::MalformedMessage(format!("status line missing status code: {line:?}"))
        })?;
        let reason = parts.next().unwrap_or_default();
        map.insert("HTTP-Version".to_owned(), Value::String(version.to_owned()));
        map.insert("Status-Code".to_owned(), Value::String(code.to_owned()));
        map.insert(
            "Reason-Phrase".to_owned(),
            Value::String(reason.to_owned()),
        );
    } else {
        // Request line: Method SP Request-URI SP HTTP-Version
        let method = parts.next().unwrap_or_default();
        let uri = parts.next().ok_or_else(|| {
            ReplayError::MalformedMessage(format!("request line missing uri: {line:?}"))
        })?;
        let version = parts.next().ok_or_else(|| {
            ReplayError::MalformedMessage(format!("request line missing http version: {line:?}"))
        })?;
        map.insert("Method".to_owned(), Value::String(method.to_owned()));
        map.insert("Request-URI".to_owned(), Value::String(uri.to_owned()));
        map.insert("HTTP-Version".to_owned(), Value::String(version.to_owned()));
    }

    Ok(map)
}

fn concat_packets(packets: &[Bytes]) -> Vec<u8> {
    let total: usize = packets.iter().map(Bytes::len).sum();
    let mut joined = Vec::with_capacity(total);
    for packet in packets {
        joined.extend_from_slice(packet);
    }
    joined
}

fn find_boundary(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(BOUNDARY_LEN)
        .position(|window| window == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packets(raw: &'static [u8]) -> Vec<Bytes> {
        vec![Bytes::from_static(raw)]
    }

    #[test]
    fn splits_at_the_first_boundary_even_when_body_contains_one() {
        let (header, body) = split_header_body(&packets(
            b"POST /x HTTP/1.1\r\nHost: a\r\n\r\nline one\r\n\r\nline two",
        ))
        .unwrap();
        assert_eq!(header, "POST /x HTTP/1.1\r\nHost: a");
        assert_eq!(body, b"line one\r\n\r\nline two");
    }

    #[test]
    fn split_works_across_packet_fragments() {
        let fragments = vec![
            Bytes::from_static(b"GET / HT"),
            Bytes::from_static(b"TP/1.1\r\nHost: a\r"),
            Bytes::from_static(b"\n\r\nhello"),
        ];
        let (header, body) = split_header_body(&fragments).unwrap();
        assert_eq!(header, "GET / HTTP/1.1\r\nHost: a");
        assert_eq!(body, b"hello");
    }

    #[test]
    fn missing_boundary_is_malformed() {
        let err = split_header_body(&packets(b"GET / HTTP/1.1\r\nHost: a\r\n")).unwrap_err();
        assert!(matches!(err, ReplayError::MalformedMessage(_)));
    }

    #[test]
    fn request_start_line_and_headers_share_one_flat_namespace() {
        let record = parse_http_message(&packets(
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Trace: 42\r\n\r\n",
        ));
        let MessageRecord::Parsed(map) = record else {
            panic!("expected a parsed record");
        };
        assert_eq!(map["Method"], "GET");
        assert_eq!(map["Request-URI"], "/index.html");
        assert_eq!(map["HTTP-Version"], "HTTP/1.1");
        assert_eq!(map["Host"], "example.com");
        assert_eq!(map["X-Trace"], "42");
        assert_eq!(map["body"], BASE64.encode(b""));
    }

    #[test]
    fn status_line_fields_are_extracted() {
        let record =
            parse_http_message(&packets(b"HTTP/1.1 404 Not Found\r\nServer: s\r\n\r\ngone"));
        let MessageRecord::Parsed(map) = record else {
            panic!("expected a parsed record");
        };
        assert_eq!(map["HTTP-Version"], "HTTP/1.1");
        assert_eq!(map["Status-Code"], "404");
        assert_eq!(map["Reason-Phrase"], "Not Found");
        assert_eq!(map["body"], BASE64.encode(b"gone"));
    }

    #[test]
    fn binary_body_is_base64_round_trippable() {
        let raw: &[u8] = b"HTTP/1.1 200 OK\r\n\r\n\x00\x01\xfe\xff";
        let record = parse_http_message(&[Bytes::copy_from_slice(raw)]);
        let MessageRecord::Parsed(map) = record else {
            panic!("expected a parsed record");
        };
        let decoded = BASE64
            .decode(map["body"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, b"\x00\x01\xfe\xff");
    }

    #[test]
    fn malformed_messages_fall_back_instead_of_failing() {
        // No boundary at all.
        assert!(parse_http_message(&packets(b"garbage")).is_fallback());
        // Request line with too few tokens.
        assert!(parse_http_message(&packets(b"GET\r\n\r\n")).is_fallback());
        // Header block that is not utf-8.
        assert!(parse_http_message(&[Bytes::from_static(b"\xff\xfe\r\n\r\n")]).is_fallback());
    }

    #[test]
    fn fallback_json_contains_only_an_exception_field() {
        let record = parse_http_message(&packets(b"garbage"));
        let json = record.into_json();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object["Exception"]
            .as_str()
            .unwrap()
            .contains("blank-line boundary"));
    }

    #[test]
    fn with_field_does_not_touch_fallbacks() {
        let fallback = MessageRecord::Fallback {
            reason: "x".to_owned(),
        }
        .with_field("response_time_ms", Value::from(5));
        let json = fallback.into_json();
        assert_eq!(json.as_object().unwrap().len(), 1);

        let parsed = parse_http_message(&packets(b"HTTP/1.1 200 OK\r\n\r\n"))
            .with_field("response_time_ms", Value::from(5));
        assert_eq!(parsed.into_json()["response_time_ms"], 5);
    }
}
