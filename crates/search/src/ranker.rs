use crate::pool::{CandidatePool, PoolEntry};
use crate::score::heuristic_score;
use crate::url::UrlShape;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const SAME_PRIMARY_BOOST: f32 = 0.3;
const CATEGORY_BOOST: f32 = 0.25;
const SHARED_SEGMENT_BOOST: f32 = 0.1;
const MAX_SEGMENT_ROOTS: usize = 2;

/// How candidates are ordered before being offered to the oracle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Slug similarity plus segment and category boosts, with segment-root fallbacks.
    #[default]
    SegmentAware,
    /// Slug similarity only.
    SlugOnly,
}

impl RankPolicy {
    pub fn default_k(self) -> usize {
        match self {
            Self::SegmentAware => 20,
            Self::SlugOnly => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SegmentAware => "segment_aware",
            Self::SlugOnly => "slug_only",
        }
    }
}

impl fmt::Display for RankPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "segment_aware" => Ok(Self::SegmentAware),
            "slug_only" | "minimal" => Ok(Self::SlugOnly),
            other => Err(format!(
                "unknown ranking policy '{other}' (expected segment_aware or slug_only)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankerConfig {
    pub policy: RankPolicy,
    /// Maximum shortlist length.
    pub k: usize,
}

impl RankerConfig {
    pub fn for_policy(policy: RankPolicy) -> Self {
        Self {
            policy,
            k: policy.default_k(),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self::for_policy(RankPolicy::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub url: &'a str,
    pub score: f32,
}

/// Narrows the full candidate pool to a bounded shortlist per old URL.
#[derive(Debug, Clone, Default)]
pub struct CandidateRanker {
    config: RankerConfig,
}

impl CandidateRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RankerConfig {
        self.config
    }

    /// Every pool member scored against `old_url`, best first.
    /// Equal scores keep pool order.
    pub fn scored<'p>(&self, old_url: &str, pool: &'p CandidatePool) -> Vec<ScoredCandidate<'p>> {
        let old = UrlShape::parse(old_url);
        let mut scored: Vec<ScoredCandidate<'p>> = pool
            .entries()
            .iter()
            .map(|entry| ScoredCandidate {
                url: entry.url.as_str(),
                score: self.score_entry(&old, entry),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }

    /// Shortlist of at most `k` URLs for `old_url`.
    pub fn top_k(&self, old_url: &str, pool: &CandidatePool) -> Vec<String> {
        let k = self.config.k;
        let mut candidates: Vec<String> = self
            .scored(old_url, pool)
            .into_iter()
            .take(k)
            .map(|c| c.url.to_string())
            .collect();

        if self.config.policy == RankPolicy::SegmentAware {
            let old = UrlShape::parse(old_url);
            for root in segment_roots(pool, old.primary_segment()) {
                if !candidates.iter().any(|c| c == root) {
                    candidates.push(root.to_string());
                }
            }
            candidates.truncate(k);
        }

        log::debug!(
            "Ranked {} candidates for '{}' ({}), top: {:?}",
            candidates.len(),
            old_url,
            self.config.policy,
            candidates.first()
        );
        candidates
    }

    fn score_entry(&self, old: &UrlShape, entry: &PoolEntry) -> f32 {
        let slug_score = heuristic_score(old.slug(), entry.shape.slug());
        match self.config.policy {
            RankPolicy::SlugOnly => slug_score,
            RankPolicy::SegmentAware => {
                boosted_score(old, &entry.shape, entry.is_category, slug_score)
            }
        }
    }
}

/// Slug score adjusted for URL structure, capped at 1.0.
pub fn segment_aware_score(old: &UrlShape, candidate: &UrlShape, slug_score: f32) -> f32 {
    let is_category = crate::category::shape_is_category_or_brand(candidate);
    boosted_score(old, candidate, is_category, slug_score)
}

fn boosted_score(old: &UrlShape, candidate: &UrlShape, is_category: bool, slug_score: f32) -> f32 {
    let mut score = slug_score;

    let old_primary = old.primary_segment();
    if !old_primary.is_empty() && old_primary == candidate.primary_segment() {
        score += SAME_PRIMARY_BOOST;
    }

    if is_category {
        score += CATEGORY_BOOST;
    }

    let old_segments: HashSet<&str> = old.segments().iter().map(String::as_str).collect();
    let common = candidate
        .segments()
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&old_segments)
        .count();
    if common > 1 {
        score += SHARED_SEGMENT_BOOST * common as f32;
    }

    score.min(1.0)
}

/// First few single-segment pages under `primary` (e.g. `/blog`), in pool order.
fn segment_roots<'p>(pool: &'p CandidatePool, primary: &'p str) -> impl Iterator<Item = &'p str> {
    pool.entries()
        .iter()
        .filter(move |entry| {
            !primary.is_empty()
                && entry.shape.depth() == 1
                && entry.shape.primary_segment() == primary
        })
        .map(|entry| entry.url.as_str())
        .take(MAX_SEGMENT_ROOTS)
}
