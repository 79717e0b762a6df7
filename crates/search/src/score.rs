use crate::url::tokenize;
use std::collections::HashSet;

pub const JACCARD_WEIGHT: f32 = 0.7;
pub const PREFIX_WEIGHT: f32 = 0.3;

/// Number of leading characters compared for the prefix bonus.
pub const PREFIX_CHARS: usize = 4;

/// Lexical similarity between two slugs in `[0, 1]`.
///
/// `0.7 * jaccard(tokens) + 0.3 * prefix_bonus`, where the prefix bonus
/// compares the first four characters of the raw slugs. Not symmetric in
/// general: only the positional prefix of each slug is considered.
pub fn heuristic_score(old_slug: &str, new_slug: &str) -> f32 {
    let old_tokens: HashSet<&str> = tokenize(old_slug).into_iter().collect();
    let new_tokens: HashSet<&str> = tokenize(new_slug).into_iter().collect();
    if old_tokens.is_empty() || new_tokens.is_empty() {
        return 0.0;
    }

    let prefix = if shares_prefix(old_slug, new_slug) {
        1.0
    } else {
        0.0
    };

    JACCARD_WEIGHT * jaccard(&old_tokens, &new_tokens) + PREFIX_WEIGHT * prefix
}

pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

fn shares_prefix(a: &str, b: &str) -> bool {
    a.chars().take(PREFIX_CHARS).eq(b.chars().take(PREFIX_CHARS))
}
