//! Turn a before/after string pair into an [`Operation`].
//!
//! The diff assumes the strings differ by a single contiguous edit: one
//! retained prefix, one deleted span, one inserted span, one retained suffix.
//! That covers typing, backspace, paste and cut in O(n) with no alignment
//! search. Two disjoint changes come out as one delete+insert spanning
//! everything between them.

use crate::op::Operation;
use std::borrow::Cow;

/// Compute the operation that turns `before` into `after`.
///
/// Returns the empty operation iff the strings are equal.
///
/// ```
/// use input_sync_core::diff::diff;
/// use input_sync_core::op::Operation;
///
/// let op = diff("hello world", "hello there world");
/// assert_eq!(op, Operation::new().retain(6).insert("there "));
/// ```
pub fn diff(before: &str, after: &str) -> Operation {
    if before == after {
        return Operation::new();
    }

    let before: Vec<char> = before.chars().collect();
    let after: Vec<char> = after.chars().collect();

    let prefix = common_prefix_len(&before, &after);
    // The suffix may not reach back into the prefix of either string.
    let suffix = common_suffix_len(&before, &after)
        .min(before.len() - prefix)
        .min(after.len() - prefix);

    let removed = before.len() - suffix - prefix;
    let inserted: String = after[prefix..after.len() - suffix].iter().collect();

    Operation::new()
        .retain(prefix)
        .delete(removed)
        .insert(inserted)
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix_len(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Rewrite `\r\n` and lone `\r` line endings to `\n`.
///
/// Borrows the input when it has no carriage returns.
pub fn normalize_newlines(s: &str) -> Cow<'_, str> {
    if !s.contains('\r') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip(a: &str, b: &str) {
        let op = diff(a, b);
        assert_eq!(op.apply(a).unwrap(), b, "diff({:?}, {:?}) = {}", a, b, op);
    }

    #[test]
    fn test_identity_is_empty() {
        assert!(diff("", "").is_empty());
        assert!(diff("same", "same").is_empty());
    }

    #[test]
    fn test_insert_in_middle() {
        assert_eq!(
            diff("hello world", "hello there world"),
            Operation::new().retain(6).insert("there ")
        );
    }

    #[test]
    fn test_insert_into_empty() {
        assert_eq!(diff("", "foobar"), Operation::new().insert("foobar"));
    }

    #[test]
    fn test_append_and_prepend() {
        assert_eq!(diff("foo", "foobar"), Operation::new().retain(3).insert("bar"));
        assert_eq!(diff("bar", "foobar"), Operation::new().insert("foo"));
    }

    #[test]
    fn test_backspace() {
        assert_eq!(diff("abcd", "abd"), Operation::new().retain(2).delete(1));
        assert_eq!(diff("abc", ""), Operation::new().delete(3));
    }

    #[test]
    fn test_replace_selection() {
        assert_eq!(
            diff("the cat sat", "the dog sat"),
            Operation::new().retain(4).delete(3).insert("dog")
        );
    }

    #[test]
    fn test_repeated_chars_do_not_overlap() {
        // Prefix "aa" and suffix "aa" would overlap without the bound.
        assert_eq!(diff("aa", "aaa"), Operation::new().retain(2).insert("a"));
        assert_eq!(diff("aaa", "aa"), Operation::new().retain(2).delete(1));
        assert_round_trip("abab", "ab");
        assert_round_trip("xx", "xxxx");
    }

    #[test]
    fn test_disjoint_edits_span_the_gap() {
        // Two separate changes become one wide replace.
        assert_eq!(
            diff("a-b-c", "A-b-C"),
            Operation::new().delete(5).insert("A-b-C")
        );
        assert_eq!(
            diff("xa-b-cx", "xA-b-Cx"),
            Operation::new().retain(1).delete(5).insert("A-b-C")
        );
    }

    #[test]
    fn test_multibyte_chars() {
        assert_eq!(
            diff("naïve café", "naïve bistro café"),
            Operation::new().retain(6).insert("bistro ")
        );
        assert_round_trip("🙂🙂", "🙂x🙂");
    }

    #[test]
    fn test_round_trip_samples() {
        let samples = ["", "a", "ab", "abc", "hello", "hallo", "aaaa", "line\nbreak", "ëü"];
        for a in samples {
            for b in samples {
                assert_round_trip(a, b);
            }
        }
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb"), "a\nb");
        assert_eq!(normalize_newlines("a\rb\r\n\rc"), "a\nb\n\nc");
        assert!(matches!(normalize_newlines("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_line_ending_style_is_not_an_edit() {
        let before = normalize_newlines("one\r\ntwo");
        let after = normalize_newlines("one\ntwo");
        assert!(diff(&before, &after).is_empty());
    }
}
