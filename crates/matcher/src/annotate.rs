use remap_protocol::{ResultRecord, RowReference};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateSummary {
    pub source_duplicates: usize,
    pub dest_duplicates: usize,
}

/// Marks rows whose old URL or chosen new URL already appeared earlier.
///
/// Every reference points at the first occurrence. Previous annotations are
/// discarded, so running this twice gives the same result.
pub fn annotate_duplicates(records: &mut [ResultRecord]) -> DuplicateSummary {
    let mut first_for_old: HashMap<String, usize> = HashMap::new();
    let mut first_for_new: HashMap<String, usize> = HashMap::new();
    let mut summary = DuplicateSummary::default();

    for (idx, record) in records.iter_mut().enumerate() {
        record.source_dup_of = None;
        record.dest_dup_of = None;

        match first_for_old.get(&record.old_url) {
            Some(&first) => {
                record.source_dup_of = Some(RowReference::new(first));
                summary.source_duplicates += 1;
            }
            None => {
                first_for_old.insert(record.old_url.clone(), idx);
            }
        }

        if record.best_new_url.is_empty() {
            continue;
        }
        match first_for_new.get(&record.best_new_url) {
            Some(&first) => {
                record.dest_dup_of = Some(RowReference::new(first));
                summary.dest_duplicates += 1;
            }
            None => {
                first_for_new.insert(record.best_new_url.clone(), idx);
            }
        }
    }

    summary
}
