mod category;
mod pool;
mod ranker;
mod score;
pub mod url;

pub use category::{is_category_or_brand_page, shape_is_category_or_brand, CATEGORY_KEYWORDS};
pub use pool::{CandidatePool, PoolEntry};
pub use ranker::{
    segment_aware_score, CandidateRanker, RankPolicy, RankerConfig, ScoredCandidate,
};
pub use score::{heuristic_score, jaccard};
pub use url::{primary_segment, segments, slug, tokenize, UrlShape};
