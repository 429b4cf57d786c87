//! Source similarity for rename matching
//!
//! Positional character match over normalized text: the share of positions
//! at which both strings hold the same character, relative to the longer
//! string. Cheap, and biased toward pairs of similar length sharing a
//! prefix. An inserted or removed prefix shifts every later position and
//! drops the score sharply.

use arbor_core::normalize_source;

pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize_source(a);
    let b = normalize_source(b);
    positional_ratio(&a, &b)
}

fn positional_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let matching = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    matching as f64 / longest as f64
}
