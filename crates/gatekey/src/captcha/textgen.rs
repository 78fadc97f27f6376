//! Random challenge text.

use rand::Rng;

/// Draw `length` characters uniformly from `allowed_chars`.
///
/// An empty charset or zero length yields an empty string.
pub fn random_text(rng: &mut impl Rng, length: usize, allowed_chars: &str) -> String {
    let charset: Vec<char> = allowed_chars.chars().collect();
    if charset.is_empty() {
        return String::new();
    }

    (0..length)
        .map(|_| charset[rng.random_range(0..charset.len())])
        .collect()
}
