//! Fuzzy answer matching.
//!
//! A guess is accepted when, after normalization, it equals the answer, is
//! contained in it, matches a common rewrite of a "Last, First" author name,
//! or is within typo distance of it.

use crate::constants::SIMILARITY_THRESHOLD;
use crate::normalize::normalize;

/// Classic unit-cost edit distance over Unicode scalar values.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in dp[0].iter_mut().enumerate() {
        *cell = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1]
            } else {
                1 + dp[i - 1][j - 1].min(dp[i - 1][j]).min(dp[i][j - 1])
            };
        }
    }
    dp[m][n]
}

/// `(max_len - distance) / max_len`; two empty strings are identical.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Rewrites of a raw `Last, First` author: `First Last`, `Last`, `F Last`, `F. Last`.
///
/// Empty when `actual` has no comma.
#[must_use]
pub fn author_variants(actual: &str) -> Vec<String> {
    let Some((last, first)) = actual.split_once(',') else {
        return Vec::new();
    };
    let (last, first) = (last.trim(), first.trim());
    let mut variants = vec![format!("{first} {last}"), last.to_string()];
    if let Some(initial) = first.chars().next() {
        variants.push(format!("{initial} {last}"));
        variants.push(format!("{initial}. {last}"));
    }
    variants
}

/// Whether `guess` should be accepted for `actual`.
///
/// A guess that normalizes to nothing is never accepted.
#[must_use]
pub fn is_match(guess: &str, actual: &str) -> bool {
    let guess_norm = normalize(guess);
    if guess_norm.is_empty() {
        return false;
    }
    let actual_norm = normalize(actual);

    if guess_norm == actual_norm {
        return true;
    }
    if actual_norm.contains(&guess_norm) {
        return true;
    }
    // The comma only survives in the raw answer.
    if author_variants(actual)
        .iter()
        .any(|variant| normalize(variant) == guess_norm)
    {
        return true;
    }
    similarity(&guess_norm, &actual_norm) > SIMILARITY_THRESHOLD
}
