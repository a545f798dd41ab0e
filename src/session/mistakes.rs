use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::session::question::Question;

/// Largest number of records pulled into one mistake review.
pub const REVIEW_LIMIT: usize = 20;
/// Error count at which a mistake is reported as "hard".
pub const HARD_MISTAKE_THRESHOLD: u32 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub question_id: String,
    pub question: Question,
    pub error_count: u32,
    pub last_incorrect: DateTime<Utc>,
}

/// Question id to record, in insertion order. Review ties are broken by this
/// order, so removals must use `shift_remove`.
pub type MistakeLog = IndexMap<String, MistakeRecord>;

/// Create the record or bump its count, refreshing the snapshot and timestamp.
pub fn record_incorrect(log: &mut MistakeLog, question: &Question, now: DateTime<Utc>) {
    let error_count = log.get(&question.id).map_or(0, |r| r.error_count) + 1;
    log.insert(
        question.id.clone(),
        MistakeRecord {
            question_id: question.id.clone(),
            question: question.clone(),
            error_count,
            last_incorrect: now,
        },
    );
}

/// A correct answer during mistake review. Returns true if the log changed.
pub fn record_review_correct(log: &mut MistakeLog, question_id: &str) -> bool {
    match log.get_mut(question_id) {
        Some(record) if record.error_count > 1 => {
            record.error_count -= 1;
            true
        }
        Some(_) => {
            log.shift_remove(question_id);
            true
        }
        None => false,
    }
}

/// Records ordered by error count, highest first; ties keep log order.
pub fn ranked(log: &MistakeLog) -> Vec<&MistakeRecord> {
    let mut records: Vec<&MistakeRecord> = log.values().collect();
    records.sort_by(|a, b| b.error_count.cmp(&a.error_count));
    records
}

/// Question snapshots for a mistake review session.
pub fn review_selection(log: &MistakeLog) -> Vec<Question> {
    ranked(log)
        .into_iter()
        .take(REVIEW_LIMIT)
        .map(|r| r.question.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::session::question::sample;

    fn log_with(counts: &[(&str, u32)]) -> MistakeLog {
        let mut log = MistakeLog::new();
        for (id, count) in counts {
            log.insert(
                id.to_string(),
                MistakeRecord {
                    question_id: id.to_string(),
                    question: sample(id, 0),
                    error_count: *count,
                    last_incorrect: Utc::now(),
                },
            );
        }
        log
    }

    #[test]
    fn incorrect_creates_then_increments() {
        let mut log = MistakeLog::new();
        let q = sample("q1", 0);
        let t0 = Utc::now();
        record_incorrect(&mut log, &q, t0);
        assert_eq!(log["q1"].error_count, 1);

        let t1 = t0 + Duration::minutes(5);
        record_incorrect(&mut log, &q, t1);
        assert_eq!(log["q1"].error_count, 2);
        assert_eq!(log["q1"].last_incorrect, t1);
    }

    #[test]
    fn review_correct_decrements_or_deletes() {
        let mut log = log_with(&[("one", 1), ("three", 3)]);
        assert!(record_review_correct(&mut log, "one"));
        assert!(!log.contains_key("one"));

        assert!(record_review_correct(&mut log, "three"));
        assert_eq!(log["three"].error_count, 2);

        assert!(!record_review_correct(&mut log, "missing"));
    }

    #[test]
    fn review_orders_by_count_and_keeps_tie_order() {
        let log = log_with(&[("A", 5), ("B", 2), ("C", 5)]);
        let ids: Vec<String> = review_selection(&log).into_iter().map(|q| q.id).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);
    }

    #[test]
    fn review_is_capped() {
        let counts: Vec<(String, u32)> = (0..30).map(|i| (format!("q{i}"), 1)).collect();
        let borrowed: Vec<(&str, u32)> = counts.iter().map(|(id, c)| (id.as_str(), *c)).collect();
        let log = log_with(&borrowed);
        let selection = review_selection(&log);
        assert_eq!(selection.len(), REVIEW_LIMIT);
        assert_eq!(selection[0].id, "q0");
    }

    #[test]
    fn deletion_preserves_order_of_the_rest() {
        let mut log = log_with(&[("A", 1), ("B", 4), ("C", 4)]);
        record_review_correct(&mut log, "A");
        let keys: Vec<&String> = log.keys().collect();
        assert_eq!(keys, vec!["B", "C"]);
    }
}
