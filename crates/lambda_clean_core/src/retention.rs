use std::collections::VecDeque;

use crate::model::{FunctionName, Retention, RetentionDecision, VersionId};

/// Sliding window over one function's versions, oldest first.
///
/// Holds at most `keep + 1` versions at any time. Every version pushed past
/// the first `keep` evicts the oldest buffered one as a `Delete` decision;
/// whatever is still buffered when the listing ends is kept.
#[derive(Debug)]
pub struct RetentionWindow {
    function: FunctionName,
    keep: usize,
    // Grows with the listing; `keep` is caller-supplied and may be huge.
    buffered: VecDeque<VersionId>,
}

impl RetentionWindow {
    pub fn new(function: FunctionName, keep: usize) -> Self {
        Self {
            function,
            keep,
            buffered: VecDeque::new(),
        }
    }

    /// Returns a `Delete` decision for the evicted version when the window
    /// overflows.
    pub fn push(&mut self, version: VersionId) -> Option<RetentionDecision> {
        self.buffered.push_back(version);
        if self.buffered.len() > self.keep {
            self.buffered.pop_front().map(|evicted| RetentionDecision {
                function: self.function.clone(),
                version: evicted,
                retention: Retention::Delete,
            })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.buffered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }

    /// `Keep` decisions for the surviving versions, in ascending order.
    pub fn finish(self) -> Vec<RetentionDecision> {
        let function = self.function;
        self.buffered
            .into_iter()
            .map(|version| RetentionDecision {
                function: function.clone(),
                version,
                retention: Retention::Keep,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(range: std::ops::RangeInclusive<u32>) -> Vec<VersionId> {
        range
            .map(|n| VersionId::published(n.to_string()).expect("numeric version"))
            .collect()
    }

    fn classify(versions: Vec<VersionId>, keep: usize) -> Vec<RetentionDecision> {
        let mut window = RetentionWindow::new(FunctionName::new("svc-a"), keep);
        let mut decisions: Vec<_> = versions
            .into_iter()
            .filter_map(|version| window.push(version))
            .collect();
        decisions.extend(window.finish());
        decisions
    }

    fn split(decisions: &[RetentionDecision]) -> (Vec<String>, Vec<String>) {
        let pick = |retention| {
            decisions
                .iter()
                .filter(|decision| decision.retention == retention)
                .map(|decision| decision.version.to_string())
                .collect::<Vec<_>>()
        };
        (pick(Retention::Delete), pick(Retention::Keep))
    }

    #[test]
    fn deletes_oldest_and_keeps_newest_for_every_keep_size() {
        for total in 0..=8u32 {
            for keep in 0..=10usize {
                let input = if total == 0 {
                    Vec::new()
                } else {
                    versions(1..=total)
                };
                let decisions = classify(input.clone(), keep);
                let (deleted, kept) = split(&decisions);

                let total = total as usize;
                let expected_deleted = total.saturating_sub(keep);
                assert_eq!(deleted.len(), expected_deleted, "total={total} keep={keep}");
                assert_eq!(kept.len(), total.min(keep), "total={total} keep={keep}");
                assert_eq!(decisions.len(), total);

                let names: Vec<String> = input.iter().map(ToString::to_string).collect();
                assert_eq!(deleted, names[..expected_deleted].to_vec());
                assert_eq!(kept, names[expected_deleted..].to_vec());
            }
        }
    }

    #[test]
    fn keep_zero_deletes_every_version() {
        let decisions = classify(versions(1..=3), 0);
        assert!(decisions
            .iter()
            .all(|decision| decision.retention == Retention::Delete));
        assert_eq!(decisions.len(), 3);
    }

    #[test]
    fn unbounded_keep_retains_everything_without_preallocating() {
        let decisions = classify(versions(1..=4), usize::MAX);
        let (deleted, kept) = split(&decisions);

        assert!(deleted.is_empty());
        assert_eq!(kept, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn window_never_exceeds_keep_plus_one() {
        let mut window = RetentionWindow::new(FunctionName::new("svc-a"), 2);
        let mut peak = 0;
        for version in versions(1..=20) {
            window.push(version);
            peak = peak.max(window.len());
        }
        assert!(peak <= 3);
        assert_eq!(
            window
                .finish()
                .iter()
                .map(|decision| decision.version.to_string())
                .collect::<Vec<_>>(),
            vec!["19", "20"]
        );
    }

    #[test]
    fn decisions_carry_the_function_name() {
        let mut window = RetentionWindow::new(FunctionName::new("svc-b"), 1);
        window.push(versions(1..=1).remove(0));
        let evicted = window
            .push(versions(2..=2).remove(0))
            .expect("second version evicts the first");

        assert_eq!(evicted.function.as_str(), "svc-b");
        assert_eq!(evicted.version.as_str(), "1");
        assert_eq!(evicted.retention, Retention::Delete);
    }

    #[test]
    fn empty_listing_yields_no_decisions() {
        let window = RetentionWindow::new(FunctionName::new("svc-a"), 2);
        assert!(window.is_empty());
        assert!(classify(Vec::new(), 2).is_empty());
    }
}
