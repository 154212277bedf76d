//! `Range` header parsing for artifact streaming.
//!
//! Only single `bytes=` ranges are honoured. Anything unparsable is ignored
//! and the whole file is served.

/// Outcome of matching a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range: serve everything with 200
    Full,
    /// Inclusive byte span to serve with 206
    Partial { start: u64, end: u64 },
    /// Well-formed but outside the file: 416
    Unsatisfiable,
}

impl ByteRange {
    /// Number of bytes the response body carries.
    pub fn len(&self, size: u64) -> u64 {
        match *self {
            ByteRange::Full => size,
            ByteRange::Partial { start, end } => end - start + 1,
            ByteRange::Unsatisfiable => 0,
        }
    }

    pub fn is_empty(&self, size: u64) -> bool {
        self.len(size) == 0
    }
}

/// Resolve a `Range` header value for a file of `size` bytes.
pub fn parse_range(header: Option<&str>, size: u64) -> ByteRange {
    let spec = match header.and_then(|h| h.trim().strip_prefix("bytes=")) {
        Some(spec) => spec.trim(),
        None => return ByteRange::Full,
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let (start, end) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return ByteRange::Full,
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // Suffix form: the last N bytes
        let suffix: u64 = match end.parse() {
            Ok(n) => n,
            Err(_) => return ByteRange::Full,
        };
        if suffix == 0 || size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: size.saturating_sub(suffix),
            end: size - 1,
        };
    }

    let start: u64 = match start.parse() {
        Ok(n) => n,
        Err(_) => return ByteRange::Full,
    };
    let end: Option<u64> = if end.is_empty() {
        None
    } else {
        match end.parse() {
            Ok(n) => Some(n),
            Err(_) => return ByteRange::Full,
        }
    };

    if start >= size {
        return ByteRange::Unsatisfiable;
    }
    let last = size - 1;
    let end = end.map(|e| e.min(last)).unwrap_or(last);
    if end < start {
        return ByteRange::Full;
    }
    ByteRange::Partial { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header() {
        assert_eq!(parse_range(None, 1000), ByteRange::Full);
    }

    #[test]
    fn test_closed_range() {
        let range = parse_range(Some("bytes=100-199"), 1000);
        assert_eq!(range, ByteRange::Partial { start: 100, end: 199 });
        assert_eq!(range.len(1000), 100);
    }

    #[test]
    fn test_open_ended_range() {
        assert_eq!(
            parse_range(Some("bytes=900-"), 1000),
            ByteRange::Partial { start: 900, end: 999 }
        );
    }

    #[test]
    fn test_end_clamped() {
        assert_eq!(
            parse_range(Some("bytes=500-5000"), 1000),
            ByteRange::Partial { start: 500, end: 999 }
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range(Some("bytes=-100"), 1000),
            ByteRange::Partial { start: 900, end: 999 }
        );
        assert_eq!(
            parse_range(Some("bytes=-5000"), 1000),
            ByteRange::Partial { start: 0, end: 999 }
        );
        assert_eq!(parse_range(Some("bytes=-0"), 1000), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_start_past_end() {
        assert_eq!(parse_range(Some("bytes=1000-"), 1000), ByteRange::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=0-"), 0), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_malformed_ignored() {
        for header in ["items=0-10", "bytes=abc-def", "bytes=10", "bytes=0-1,5-9", "bytes=50-10"] {
            assert_eq!(parse_range(Some(header), 1000), ByteRange::Full, "{}", header);
        }
    }
}
