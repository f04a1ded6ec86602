//! Natural ordering of numbered file names.
//!
//! Recordings are commonly named with a dotted numeric prefix, for example
//! `1-intro.mp4`, `2.1-setup.mp4`, `2.10-details.mp4`, `10-closing.mp4`.
//! Plain lexicographic ordering puts `10` before `2`, which scrambles the
//! intended sequence. This module compares the numeric prefixes component by
//! component instead, so `2.9` sorts before `2.10` and `10` after `2`.
//!
//! Names without a numeric prefix always sort after numbered ones. Two
//! unnumbered names compare equal, which preserves their insertion order
//! under a stable sort.

use std::cmp::Ordering;

/// Parses the leading dotted numeric prefix of a file name.
///
/// The prefix is a run of digits optionally followed by further `.digits`
/// groups. Parsing stops at the first character that does not continue the
/// pattern; a name that does not start with a digit has no prefix. Components
/// saturate at `u64::MAX` rather than failing on absurdly long digit runs.
///
/// # Example
///
/// ```
/// use framebind::numeric_prefix;
///
/// assert_eq!(numeric_prefix("2.10-clip.mp4"), Some(vec![2, 10]));
/// assert_eq!(numeric_prefix("7_final.mp4"), Some(vec![7]));
/// assert_eq!(numeric_prefix("intro.mp4"), None);
/// ```
pub fn numeric_prefix(name: &str) -> Option<Vec<u64>> {
    let bytes = name.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let mut components = Vec::new();
    let mut position = 0;
    loop {
        let mut value: u64 = 0;
        while position < bytes.len() && bytes[position].is_ascii_digit() {
            value = value
                .saturating_mul(10)
                .saturating_add(u64::from(bytes[position] - b'0'));
            position += 1;
        }
        components.push(value);

        // A dot continues the prefix only when another digit follows it.
        let continues = bytes.get(position) == Some(&b'.')
            && bytes.get(position + 1).is_some_and(u8::is_ascii_digit);
        if !continues {
            break;
        }
        position += 1;
    }

    Some(components)
}

/// Compares two file names by their dotted numeric prefixes.
///
/// Prefixes are compared component by component; when one prefix is a strict
/// prefix of the other, the shorter one sorts first (`2` before `2.1`).
/// A numbered name sorts before an unnumbered one, and two unnumbered names
/// compare equal so that a stable sort keeps their original relative order.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
///
/// use framebind::compare_display_names;
///
/// assert_eq!(compare_display_names("2-b.mp4", "10-a.mp4"), Ordering::Less);
/// assert_eq!(compare_display_names("2.mp4", "2.1.mp4"), Ordering::Less);
/// assert_eq!(compare_display_names("notes.mp4", "1.mp4"), Ordering::Greater);
/// ```
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    match (numeric_prefix(a), numeric_prefix(b)) {
        // Slice ordering on u64 components is exactly componentwise with a
        // shorter-prefix-first tiebreak.
        (Some(prefix_a), Some(prefix_b)) => prefix_a.cmp(&prefix_b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
