//! `Range` header parsing and byte-window resolution.
//!
//! Only the single-range form `bytes=<start>-[<end>]` is accepted. Suffix
//! ranges (`bytes=-N`), other units and multi-range requests are rejected as
//! malformed. Bounds are validated against the file size before any length is
//! computed; nothing is clamped.

/// A parsed `bytes=<start>-[<end>]` request.
///
/// `end` is `None` for open-ended requests such as `bytes=500-`. An explicit
/// `bytes=0-0` yields `end: Some(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

/// Why a range header could not be honoured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The header does not follow the single-range grammar.
    #[error("malformed range header: {0}")]
    Malformed(&'static str),

    /// The header parsed but the window lies outside the file.
    #[error(
        "range {start}-{} not satisfiable for size {size}",
        .end.map(|e| e.to_string()).unwrap_or_default()
    )]
    NotSatisfiable {
        start: u64,
        end: Option<u64>,
        size: u64,
    },
}

impl ByteRange {
    /// Parse a raw `Range` header value.
    pub fn parse(value: &str) -> Result<Self, RangeError> {
        let value = value.trim();
        let (unit, spec) = value
            .split_once('=')
            .ok_or(RangeError::Malformed("missing '='"))?;

        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return Err(RangeError::Malformed("unsupported range unit"));
        }

        let spec = spec.trim();
        if spec.contains(',') {
            return Err(RangeError::Malformed("multiple ranges are not supported"));
        }

        let (start_str, end_str) = spec
            .split_once('-')
            .ok_or(RangeError::Malformed("missing '-'"))?;

        if start_str.is_empty() {
            return Err(RangeError::Malformed("suffix ranges are not supported"));
        }

        let start = parse_position(start_str)?;
        let end = if end_str.is_empty() {
            None
        } else {
            Some(parse_position(end_str)?)
        };

        Ok(Self { start, end })
    }
}

/// Parse a byte position: ASCII digits only, no sign, no whitespace.
fn parse_position(s: &str) -> Result<u64, RangeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed("byte position is not a non-negative integer"));
    }
    s.parse()
        .map_err(|_| RangeError::Malformed("byte position out of range"))
}

/// Whether the response carries the whole file or a window of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Full,
    Partial,
}

/// The outcome of resolving a range request against a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamResponse {
    pub status: StreamStatus,
    pub offset: u64,
    pub length: u64,
    pub size: u64,
}

impl StreamResponse {
    /// A response covering the whole file.
    pub fn full(size: u64) -> Self {
        Self {
            status: StreamStatus::Full,
            offset: 0,
            length: size,
            size,
        }
    }

    /// Inclusive index of the last byte served, `None` for an empty body.
    pub fn last_byte(&self) -> Option<u64> {
        (self.length > 0).then(|| self.offset + self.length - 1)
    }

    /// `Content-Range` header value for partial responses.
    pub fn content_range(&self) -> Option<String> {
        match (self.status, self.last_byte()) {
            (StreamStatus::Partial, Some(last)) => {
                Some(format!("bytes {}-{}/{}", self.offset, last, self.size))
            }
            _ => None,
        }
    }
}

/// Resolve an optional raw `Range` header against a file of `size` bytes.
///
/// An absent or blank header yields a full response. Any present header must
/// parse and satisfy `start < size` and `start <= end <= size - 1`.
pub fn resolve(range_header: Option<&str>, size: u64) -> Result<StreamResponse, RangeError> {
    let Some(value) = range_header.filter(|v| !v.trim().is_empty()) else {
        return Ok(StreamResponse::full(size));
    };

    let range = ByteRange::parse(value)?;
    let unsatisfiable = RangeError::NotSatisfiable {
        start: range.start,
        end: range.end,
        size,
    };

    if range.start >= size {
        return Err(unsatisfiable);
    }

    // `size >= 1` here, so `size - 1` cannot underflow.
    let end = range.end.unwrap_or(size - 1);
    if end < range.start || end > size - 1 {
        return Err(unsatisfiable);
    }

    Ok(StreamResponse {
        status: StreamStatus::Partial,
        offset: range.start,
        length: end - range.start + 1,
        size,
    })
}

/// `Content-Range` value sent with a 416 response.
pub fn unsatisfied_content_range(size: u64) -> String {
    format!("bytes */{size}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(offset: u64, length: u64, size: u64) -> StreamResponse {
        StreamResponse {
            status: StreamStatus::Partial,
            offset,
            length,
            size,
        }
    }

    #[test]
    fn parse_closed_range() {
        let r = ByteRange::parse("bytes=10-20").unwrap();
        assert_eq!(r, ByteRange { start: 10, end: Some(20) });
    }

    #[test]
    fn parse_open_range() {
        let r = ByteRange::parse("bytes=500-").unwrap();
        assert_eq!(r, ByteRange { start: 500, end: None });
    }

    #[test]
    fn parse_zero_end_is_present() {
        let r = ByteRange::parse("bytes=0-0").unwrap();
        assert_eq!(r.end, Some(0));
    }

    #[test]
    fn parse_tolerates_outer_whitespace_and_unit_case() {
        let r = ByteRange::parse("  Bytes= 5-9 ").unwrap();
        assert_eq!(r, ByteRange { start: 5, end: Some(9) });
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "",
            "bytes",
            "bytes=",
            "bytes=-",
            "bytes=-500",
            "bytes=abc-def",
            "bytes=1-x",
            "bytes=+1-2",
            "bytes=1 -2",
            "bytes=5",
            "items=0-10",
            "0-10",
            "bytes=99999999999999999999-",
        ] {
            assert!(
                matches!(ByteRange::parse(bad), Err(RangeError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn parse_rejects_multi_range() {
        assert_eq!(
            ByteRange::parse("bytes=0-99,200-299"),
            Err(RangeError::Malformed("multiple ranges are not supported"))
        );
    }

    #[test]
    fn no_header_is_full() {
        assert_eq!(resolve(None, 1000).unwrap(), StreamResponse::full(1000));
        assert_eq!(resolve(Some(""), 1000).unwrap(), StreamResponse::full(1000));
        assert_eq!(resolve(Some("   "), 1000).unwrap(), StreamResponse::full(1000));
    }

    #[test]
    fn full_response_has_no_content_range() {
        assert_eq!(StreamResponse::full(1000).content_range(), None);
    }

    #[test]
    fn open_range_from_zero_is_partial() {
        let r = resolve(Some("bytes=0-"), 1000).unwrap();
        assert_eq!(r, partial(0, 1000, 1000));
        assert_eq!(r.content_range().unwrap(), "bytes 0-999/1000");
    }

    #[test]
    fn closed_range_to_last_byte() {
        let r = resolve(Some("bytes=500-999"), 1000).unwrap();
        assert_eq!(r, partial(500, 500, 1000));
        assert_eq!(r.content_range().unwrap(), "bytes 500-999/1000");
    }

    #[test]
    fn zero_zero_is_one_byte() {
        let r = resolve(Some("bytes=0-0"), 1000).unwrap();
        assert_eq!(r, partial(0, 1, 1000));
        assert_eq!(r.content_range().unwrap(), "bytes 0-0/1000");
    }

    #[test]
    fn open_range_covers_to_end() {
        let r = resolve(Some("bytes=998-"), 1000).unwrap();
        assert_eq!(r, partial(998, 2, 1000));
    }

    #[test]
    fn last_byte_only() {
        let r = resolve(Some("bytes=999-999"), 1000).unwrap();
        assert_eq!(r, partial(999, 1, 1000));
    }

    #[test]
    fn start_equal_to_size_is_unsatisfiable() {
        for header in ["bytes=1000-", "bytes=1000-1000", "bytes=1000-1500"] {
            assert_eq!(
                resolve(Some(header), 1000).unwrap_err(),
                RangeError::NotSatisfiable {
                    start: 1000,
                    end: ByteRange::parse(header).unwrap().end,
                    size: 1000
                }
            );
        }
    }

    #[test]
    fn start_beyond_size_is_unsatisfiable() {
        assert!(matches!(
            resolve(Some("bytes=5000-"), 1000),
            Err(RangeError::NotSatisfiable { .. })
        ));
    }

    #[test]
    fn end_before_start_is_unsatisfiable() {
        assert!(matches!(
            resolve(Some("bytes=10-5"), 1000),
            Err(RangeError::NotSatisfiable { .. })
        ));
    }

    #[test]
    fn end_past_last_byte_is_not_clamped() {
        assert!(matches!(
            resolve(Some("bytes=0-1000"), 1000),
            Err(RangeError::NotSatisfiable { .. })
        ));
    }

    #[test]
    fn any_range_on_empty_file_is_unsatisfiable() {
        assert!(resolve(Some("bytes=0-"), 0).is_err());
        assert!(resolve(Some("bytes=0-0"), 0).is_err());
        assert_eq!(resolve(None, 0).unwrap(), StreamResponse::full(0));
    }

    #[test]
    fn malformed_header_propagates() {
        assert!(matches!(
            resolve(Some("bytes=0-99,200-299"), 1000),
            Err(RangeError::Malformed(_))
        ));
        assert!(matches!(
            resolve(Some("bytes=-100"), 1000),
            Err(RangeError::Malformed(_))
        ));
    }

    #[test]
    fn resolution_is_idempotent() {
        let a = resolve(Some("bytes=100-199"), 1000).unwrap();
        let b = resolve(Some("bytes=100-199"), 1000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_valid_window_has_consistent_length() {
        let size = 17;
        for start in 0..size {
            for end in start..size {
                let r = resolve(Some(format!("bytes={start}-{end}").as_str()), size).unwrap();
                assert_eq!(r.offset, start);
                assert_eq!(r.length, end - start + 1);
                assert_eq!(r.last_byte(), Some(end));
            }
        }
    }

    #[test]
    fn unsatisfied_header_value() {
        assert_eq!(unsatisfied_content_range(1000), "bytes */1000");
    }

    #[test]
    fn error_display() {
        let err = RangeError::NotSatisfiable {
            start: 1000,
            end: None,
            size: 1000,
        };
        assert_eq!(err.to_string(), "range 1000- not satisfiable for size 1000");
    }
}
