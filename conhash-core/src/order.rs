//! A best effort natural ordering for displaying node identifiers

use std::cmp::Ordering;

/// Split off the leading run of digits or non digits from a string
fn next_run(input: &str) -> (&str, &str) {
    let digits = input.starts_with(|c: char| c.is_ascii_digit());
    let end = input
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(input.len());
    input.split_at(end)
}

/// Compare two runs of ascii digits by numeric value without parsing them
fn cmp_numeric(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

/// Compare node identifiers so numeric parts sort by value
///
/// `192.168.0.9:11211` sorts before `192.168.0.10:11211`. Identifiers that
/// compare equal this way fall back to a plain string comparison.
///
/// # Arguments
///
/// * `left` - The first identifier
/// * `right` - The second identifier
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let (mut rest_left, mut rest_right) = (left, right);
    loop {
        match (rest_left.is_empty(), rest_right.is_empty()) {
            (true, true) => return left.cmp(right),
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => (),
        }
        let (run_left, tail_left) = next_run(rest_left);
        let (run_right, tail_right) = next_run(rest_right);
        let numeric_left = run_left.starts_with(|c: char| c.is_ascii_digit());
        let numeric_right = run_right.starts_with(|c: char| c.is_ascii_digit());
        let order = match (numeric_left, numeric_right) {
            (true, true) => cmp_numeric(run_left, run_right),
            _ => run_left.cmp(run_right),
        };
        if order != Ordering::Equal {
            return order;
        }
        rest_left = tail_left;
        rest_right = tail_right;
    }
}
