//! Dotted numeric version comparison.

use std::cmp::Ordering;

/// Compare two dotted version strings component by component.
///
/// Missing trailing components count as `0`, so `"1.0"` equals `"1.0.0"`.
/// Components compare as integers (`"2.10.0" > "2.9.0"`). A component that
/// does not parse as an unsigned integer also counts as `0`, which keeps the
/// ordering total for malformed input.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = parse_components(a);
    let right = parse_components(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn parse_components(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}
