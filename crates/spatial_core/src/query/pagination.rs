//! Pagination bound normalization.
//!
//! # Invariants
//! - `limit` always lies in `[MIN_LIMIT, MAX_LIMIT]`.
//! - `offset` is never negative.
//! - Normalization never fails; unusable input falls back to defaults.

pub const DEFAULT_LIMIT: i64 = 100;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 1000;
pub const DEFAULT_OFFSET: i64 = 0;

/// Normalized `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Derives a usable page from raw query parameters.
    pub fn normalize(raw_limit: Option<&str>, raw_offset: Option<&str>) -> Self {
        Self {
            limit: normalize_limit(raw_limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: raw_offset
                .and_then(parse_leading_int)
                .unwrap_or(DEFAULT_OFFSET)
                .max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

/// Parses a raw limit, substituting `default` when absent or unparseable,
/// then clamps it to `[MIN_LIMIT, max]`.
pub fn normalize_limit(raw: Option<&str>, default: i64, max: i64) -> i64 {
    raw.and_then(parse_leading_int)
        .unwrap_or(default)
        .clamp(MIN_LIMIT, max.max(MIN_LIMIT))
}

/// Reads an optionally signed run of leading digits, ignoring surrounding
/// whitespace and any trailing characters. Saturates instead of overflowing.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = unsigned
        .bytes()
        .take_while(u8::is_ascii_digit)
        .collect::<Vec<_>>();
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.iter().fold(0_i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::{normalize_limit, parse_leading_int, Page, MAX_LIMIT, MIN_LIMIT};

    #[test]
    fn absent_values_use_defaults() {
        assert_eq!(Page::normalize(None, None), Page { limit: 100, offset: 0 });
    }

    #[test]
    fn limit_is_clamped_to_range() {
        assert_eq!(Page::normalize(Some("0"), None).limit, 1);
        assert_eq!(Page::normalize(Some("-20"), None).limit, 1);
        assert_eq!(Page::normalize(Some("5000"), None).limit, 1000);
        assert_eq!(Page::normalize(Some("250"), None).limit, 250);
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        assert_eq!(
            Page::normalize(Some("many"), Some("later")),
            Page { limit: 100, offset: 0 }
        );
        assert_eq!(Page::normalize(Some(""), Some("")), Page::default());
    }

    #[test]
    fn negative_offset_is_raised_to_zero() {
        assert_eq!(Page::normalize(None, Some("-7")).offset, 0);
        assert_eq!(Page::normalize(None, Some("40")).offset, 40);
    }

    #[test]
    fn leading_integer_semantics() {
        assert_eq!(parse_leading_int(" 25abc"), Some(25));
        assert_eq!(parse_leading_int("7.9"), Some(7));
        assert_eq!(parse_leading_int("+3"), Some(3));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn bounds_hold_for_arbitrary_inputs() {
        let samples = [
            None,
            Some(""),
            Some("abc"),
            Some("-9223372036854775808"),
            Some("-1"),
            Some("0"),
            Some("1"),
            Some("999"),
            Some("1000"),
            Some("1001"),
            Some("18446744073709551616"),
            Some("  12  "),
        ];
        for raw_limit in samples {
            for raw_offset in samples {
                let page = Page::normalize(raw_limit, raw_offset);
                assert!((MIN_LIMIT..=MAX_LIMIT).contains(&page.limit), "{page:?}");
                assert!(page.offset >= 0, "{page:?}");
            }
        }
    }

    #[test]
    fn custom_default_is_still_clamped() {
        assert_eq!(normalize_limit(None, 1, MAX_LIMIT), 1);
        assert_eq!(normalize_limit(Some("3"), 1, MAX_LIMIT), 3);
        assert_eq!(normalize_limit(Some("30"), 1, 20), 20);
    }
}
