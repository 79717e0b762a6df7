mod annotate;
mod batch;
mod decision;
mod prompt;

pub use annotate::{annotate_duplicates, DuplicateSummary};
pub use batch::{
    build_record, BatchConfig, BatchRunner, DEFAULT_MIN_CONFIDENCE, DEFAULT_TEST_LIMIT,
    DEFAULT_THROTTLE,
};
pub use decision::{coerce_reply, DecisionEngine, DEFAULT_MAX_OUTPUT_TOKENS};
pub use prompt::{build_prompt, Prompt};
