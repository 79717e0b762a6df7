use remap_oracle::ChatOracle;
use remap_protocol::{MatchResult, ResultRecord, RunMode};
use remap_search::{is_category_or_brand_page, primary_segment, CandidatePool, CandidateRanker};
use std::time::Duration;

use crate::annotate::annotate_duplicates;
use crate::decision::DecisionEngine;

pub const DEFAULT_TEST_LIMIT: usize = 20;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub mode: RunMode,
    /// Rows processed in test mode.
    pub test_limit: usize,
    pub min_confidence: f64,
    /// Pause between rows, spacing out oracle requests.
    pub throttle: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Test,
            test_limit: DEFAULT_TEST_LIMIT,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            throttle: DEFAULT_THROTTLE,
        }
    }
}

/// Drives rank → decide → record for every old URL, then annotates duplicates.
pub struct BatchRunner<O> {
    ranker: CandidateRanker,
    engine: DecisionEngine<O>,
    config: BatchConfig,
}

impl<O: ChatOracle> BatchRunner<O> {
    pub fn new(ranker: CandidateRanker, engine: DecisionEngine<O>, config: BatchConfig) -> Self {
        Self {
            ranker,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn engine(&self) -> &DecisionEngine<O> {
        &self.engine
    }

    /// Input rows this run will process, after the test-mode cap.
    pub fn select_rows<'a>(&self, old_urls: &'a [String]) -> &'a [String] {
        match self.config.mode {
            RunMode::Full => old_urls,
            RunMode::Test => &old_urls[..old_urls.len().min(self.config.test_limit)],
        }
    }

    pub async fn run(&self, old_urls: &[String], pool: &CandidatePool) -> Vec<ResultRecord> {
        self.run_with(old_urls, pool, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_row` after each row is resolved.
    pub async fn run_with<F>(
        &self,
        old_urls: &[String],
        pool: &CandidatePool,
        mut on_row: F,
    ) -> Vec<ResultRecord>
    where
        F: FnMut(usize, &ResultRecord),
    {
        let rows = self.select_rows(old_urls);
        log::info!(
            "Matching {} of {} old URLs against {} candidates ({} mode)",
            rows.len(),
            old_urls.len(),
            pool.len(),
            self.config.mode.as_str()
        );

        let mut records = Vec::with_capacity(rows.len());
        for (idx, old_url) in rows.iter().enumerate() {
            let record = self.process_row(old_url, pool).await;
            on_row(idx, &record);
            records.push(record);

            if !self.config.throttle.is_zero() {
                tokio::time::sleep(self.config.throttle).await;
            }
        }

        let summary = annotate_duplicates(&mut records);
        log::info!(
            "Done: {} rows, {} repeated old URLs, {} repeated destinations, {} below {:?}",
            records.len(),
            summary.source_duplicates,
            summary.dest_duplicates,
            records.iter().filter(|r| r.low_confidence).count(),
            self.config.min_confidence
        );
        records
    }

    pub async fn process_row(&self, old_url: &str, pool: &CandidatePool) -> ResultRecord {
        let candidates = self.ranker.top_k(old_url, pool);
        let result = self.engine.decide(old_url, candidates).await;
        build_record(old_url, result, self.config.min_confidence)
    }
}

/// Output row for one decision, before duplicate annotation.
pub fn build_record(old_url: &str, result: MatchResult, min_confidence: f64) -> ResultRecord {
    let low_confidence = result.confidence < min_confidence;
    let rationale = if low_confidence {
        format!("{} | below_min_confidence<{min_confidence:?}>", result.rationale)
            .trim()
            .to_string()
    } else {
        result.rationale
    };

    ResultRecord {
        old_url: old_url.to_string(),
        old_segment: primary_segment(old_url),
        new_segment: primary_segment(&result.best_new_url),
        is_category_page: is_category_or_brand_page(&result.best_new_url),
        best_new_url: result.best_new_url,
        confidence: result.confidence,
        low_confidence,
        rationale,
        candidates: result.candidates,
        source_dup_of: None,
        dest_dup_of: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(best: &str, confidence: f64) -> MatchResult {
        MatchResult {
            best_new_url: best.to_string(),
            confidence,
            rationale: "same topic".to_string(),
            candidates: vec![best.to_string()],
        }
    }

    #[test]
    fn low_confidence_is_noted_in_rationale() {
        let record = build_record("/blog/a", result("/blog/b", 0.3), 0.5);
        assert!(record.low_confidence);
        assert_eq!(record.rationale, "same topic | below_min_confidence<0.5>");

        let record = build_record("/blog/a", result("/blog/b", 0.5), 0.5);
        assert!(!record.low_confidence);
        assert_eq!(record.rationale, "same topic");
    }

    #[test]
    fn note_is_trimmed_when_rationale_is_empty() {
        let mut res = result("/b", 0.0);
        res.rationale.clear();
        let record = build_record("/a", res, 1.0);
        assert_eq!(record.rationale, "| below_min_confidence<1.0>");
    }

    #[test]
    fn display_fields_follow_chosen_url() {
        let record = build_record("/blog/old-post", result("/shop/phones", 0.9), 0.5);
        assert_eq!(record.old_segment, "blog");
        assert_eq!(record.new_segment, "shop");
        assert!(record.is_category_page);

        let record = build_record("/", result("", 0.0), 0.5);
        assert_eq!(record.old_segment, "");
        assert_eq!(record.new_segment, "");
        assert!(!record.is_category_page);
    }
}
