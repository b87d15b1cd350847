//! Scan code classification
//!
//! A scan source supplies decoded text with no guaranteed format beyond
//! "either a self-contained order payload or a short identifier". The
//! classification is explicit rather than decode-failure-as-control-flow:
//! a code that looks like a payload but fails to parse is a parse error,
//! never silently retried as a lookup key.

/// A decoded scan code, classified by shape
///
/// Classification is purely syntactic. What a [`Key`](ScanCode::Key) means
/// depends on engine state: an order lookup key while idle, an item SKU
/// while an order is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCode<'a> {
    /// Self-contained JSON order payload, scannable in one code
    Inline(&'a str),
    /// Short identifier: order lookup key or item SKU
    Key(&'a str),
}

impl<'a> ScanCode<'a> {
    /// Classify a raw scan code
    ///
    /// Leading/trailing whitespace is stripped first; scanners commonly
    /// append a newline. A code whose first character is `{` is an inline
    /// payload, anything else is a key.
    pub fn classify(raw: &'a str) -> Self {
        let code = raw.trim();
        if code.starts_with('{') {
            Self::Inline(code)
        } else {
            Self::Key(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payloads_classify_as_inline() {
        let code = r#"{"orderId":"ORD-1","customer":"ACME","date":"2026-08-29","items":[]}"#;
        assert_eq!(ScanCode::classify(code), ScanCode::Inline(code));
    }

    #[test]
    fn identifiers_classify_as_keys() {
        assert_eq!(ScanCode::classify("ORD-1"), ScanCode::Key("ORD-1"));
        assert_eq!(ScanCode::classify("SKU-A"), ScanCode::Key("SKU-A"));
        assert_eq!(ScanCode::classify(""), ScanCode::Key(""));
    }

    #[test]
    fn whitespace_is_stripped_before_classification() {
        assert_eq!(ScanCode::classify("  ORD-1\n"), ScanCode::Key("ORD-1"));
        assert_eq!(ScanCode::classify(" {\"a\":1}\r\n"), ScanCode::Inline("{\"a\":1}"));
    }

    #[test]
    fn malformed_braces_still_classify_as_inline() {
        // Garbage that starts like a payload must surface as a parse error
        // downstream, not fall back to a key lookup
        assert!(matches!(ScanCode::classify("{not json"), ScanCode::Inline(_)));
    }
}
