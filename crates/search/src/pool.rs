use crate::category::shape_is_category_or_brand;
use crate::url::UrlShape;
use std::collections::HashSet;

/// A candidate URL with its shape and classification computed up front.
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub url: String,
    pub shape: UrlShape,
    pub is_category: bool,
}

impl PoolEntry {
    fn new(url: String) -> Self {
        let shape = UrlShape::parse(&url);
        let is_category = shape_is_category_or_brand(&shape);
        Self {
            url,
            shape,
            is_category,
        }
    }
}

/// Unique new-site URLs in first-seen order. Built once per run.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entries: Vec<PoolEntry>,
}

impl CandidatePool {
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for url in urls {
            let url = url.into();
            if url.is_empty() || !seen.insert(url.clone()) {
                continue;
            }
            entries.push(PoolEntry::new(url));
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }
}
