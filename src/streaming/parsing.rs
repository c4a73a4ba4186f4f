//! Line-level helpers shared by the BED and VCF readers.

use memchr::memchr_iter;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() || bytes.len() > 20 {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Split a line on tabs without allocating.
#[inline]
pub fn split_tabs(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut last = 0;
    let mut tabs = memchr_iter(b'\t', line);
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match tabs.next() {
            Some(pos) => {
                let field = &line[last..pos];
                last = pos + 1;
                Some(field)
            }
            None => {
                done = true;
                Some(&line[last..])
            }
        }
    })
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty()
        || line[0] == b'#'
        || line.starts_with(b"track")
        || line.starts_with(b"browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"12a"), None);
        assert_eq!(parse_u64_fast(b"-1"), None);
        assert_eq!(parse_u64_fast(b"99999999999999999999"), None);
    }

    #[test]
    fn test_split_tabs() {
        let fields: Vec<&[u8]> = split_tabs(b"chr1\t10\t20\t\tname").collect();
        assert_eq!(
            fields,
            vec![&b"chr1"[..], b"10", b"20", b"", b"name"]
        );
        assert_eq!(split_tabs(b"single").count(), 1);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"# comment"));
        assert!(should_skip_line(b"track name=x"));
        assert!(should_skip_line(b"browser position chr1"));
        assert!(!should_skip_line(b"chr1\t1\t2"));
    }
}
