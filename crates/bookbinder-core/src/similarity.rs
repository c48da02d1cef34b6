//! Token-order-insensitive fuzzy comparison of two strings.
//!
//! Both inputs lose the punctuation in [`STRIPPED_CHARS`], are lowercased,
//! split into alphanumeric tokens and re-joined in sorted order. The sorted
//! strings are then compared with the indel ratio `2 * LCS / (len_a + len_b)`
//! over characters, the same measure as a token-sort ratio. The result is an
//! integer in `0..=100`.

/// Characters removed outright before tokenizing.
pub const STRIPPED_CHARS: &[char] = &['.', ':', '_', '-', '\'', '[', ']'];

/// Similarity of `a` and `b` in `0..=100`.
///
/// Returns 0 when either side normalizes to nothing. The ratio is rounded
/// half-to-even. Unlike a plain token-sort ratio, 100 is reserved for inputs
/// whose sorted token strings are identical: different strings whose ratio
/// rounds up to 100 score 99, so they never pass an exact-match test.
pub fn score(a: &str, b: &str) -> u8 {
    let left = token_sort(a);
    let right = token_sort(b);

    if left.is_empty() || right.is_empty() {
        return 0;
    }
    if left == right {
        return 100;
    }

    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let common = lcs_len(&left, &right);
    let ratio = (2 * common) as f64 / (left.len() + right.len()) as f64;
    ((ratio * 100.0).round_ties_even() as u8).min(99)
}

/// Length of the longest common subsequence of `a` and `b`.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub fn is_exact_match(a: &str, b: &str) -> bool {
    score(a, b) == 100
}

/// Normalized, sorted token form of `input`.
pub fn token_sort(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    let cleaned: String = stripped
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
