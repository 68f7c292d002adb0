//! Byte-literal pattern matching with single-byte wildcards.
//!
//! The feature signatures are machine-code idioms with relocated operand
//! bytes, so the matcher needs a wildcard that matches *every* byte value.
//! Text-oriented pattern engines exclude line terminators or NUL under
//! their wildcards; this one treats the haystack as the raw binary it is.
//!
//! Pattern language: every byte stands for itself, `.` (0x2E) matches any
//! byte, and `\` escapes the following byte (so `\.` is a literal 0x2E and
//! `\\` a literal backslash).

/// One compiled pattern element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok {
    /// Match exactly this byte.
    Lit(u8),
    /// Match any of the 256 byte values.
    Any,
}

/// A compiled wildcard byte pattern.
#[derive(Debug, Clone)]
pub struct BytePattern {
    toks: Vec<Tok>,
}

impl BytePattern {
    /// Compile a pattern from its byte-string source.
    ///
    /// A trailing lone `\` is taken literally.
    pub fn compile(src: &[u8]) -> Self {
        let mut toks = Vec::with_capacity(src.len());
        let mut i = 0;
        while i < src.len() {
            match src[i] {
                b'\\' if i + 1 < src.len() => {
                    toks.push(Tok::Lit(src[i + 1]));
                    i += 2;
                }
                b'.' => {
                    toks.push(Tok::Any);
                    i += 1;
                }
                b => {
                    toks.push(Tok::Lit(b));
                    i += 1;
                }
            }
        }
        Self { toks }
    }

    /// Number of haystack bytes one match covers.
    pub fn len(&self) -> usize {
        self.toks.len()
    }

    /// True for the empty pattern (matches at offset 0 of anything).
    pub fn is_empty(&self) -> bool {
        self.toks.is_empty()
    }

    /// Offset of the first match, if any.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        if haystack.len() < self.toks.len() {
            return None;
        }
        (0..=haystack.len() - self.toks.len()).find(|&at| self.matches_at(haystack, at))
    }

    fn matches_at(&self, haystack: &[u8], at: usize) -> bool {
        self.toks
            .iter()
            .zip(&haystack[at..])
            .all(|(tok, &b)| match tok {
                Tok::Lit(lit) => *lit == b,
                Tok::Any => true,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_bytes_match_themselves() {
        let p = BytePattern::compile(b"\x8d\x16\xd4");
        assert_eq!(p.find(&[0x00, 0x8d, 0x16, 0xd4, 0x60]), Some(1));
        assert_eq!(p.find(&[0x8d, 0x16, 0xd5]), None);
    }

    #[test]
    fn wildcard_matches_all_256_values() {
        let p = BytePattern::compile(b"\xa9.\x8d");
        for b in 0..=255u8 {
            let hay = [0xa9, b, 0x8d];
            assert_eq!(p.find(&hay), Some(0), "wildcard must match 0x{b:02x}");
        }
    }

    #[test]
    fn wildcard_spans_line_terminators_and_nul() {
        let p = BytePattern::compile(b"\x20.\x60");
        assert_eq!(p.find(&[0x20, 0x0a, 0x60]), Some(0));
        assert_eq!(p.find(&[0x20, 0x0d, 0x60]), Some(0));
        assert_eq!(p.find(&[0x20, 0x00, 0x60]), Some(0));
    }

    #[test]
    fn escaped_dot_is_literal() {
        let p = BytePattern::compile(b"\\.\x01");
        assert_eq!(p.find(&[0x2e, 0x01]), Some(0));
        assert_eq!(p.find(&[0x55, 0x01]), None, "escaped dot must not wildcard");
    }

    #[test]
    fn escaped_backslash_is_literal() {
        let p = BytePattern::compile(b"\\\\.");
        assert_eq!(p.len(), 2);
        assert_eq!(p.find(&[b'\\', 0xff]), Some(0));
    }

    #[test]
    fn pattern_longer_than_haystack_never_matches() {
        let p = BytePattern::compile(b"\x01\x02\x03");
        assert_eq!(p.find(&[0x01, 0x02]), None);
    }
}
