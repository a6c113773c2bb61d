use crate::logging::append_run_log;
use crate::types::Verdict;
use serde_json::json;
use std::collections::HashMap;

/// Per-test outcome recorded when a test reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub failed: bool,
}

/// Everything one run learns. Built empty, filled as tests complete, consumed
/// once by the reporter and the persister.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResult {
    pub newly_passed_count: usize,
    pub fixed_tests: Vec<String>,
    pub regression_count: usize,
    pub broken_tests: Vec<String>,
    pub discovered_tests: Vec<String>,
    pub discovered_failures: Vec<String>,
    pub(crate) outcomes: HashMap<String, OutcomeRecord>,
}

impl SessionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self, test_id: &str) -> Option<OutcomeRecord> {
        self.outcomes.get(test_id).copied()
    }

    /// Returns false when `test_id` already has an outcome this run.
    pub fn record_outcome(&mut self, test_id: &str, failed: bool) -> bool {
        if self.outcomes.contains_key(test_id) {
            return false;
        }
        self.outcomes
            .insert(test_id.to_string(), OutcomeRecord { failed });
        true
    }

    pub fn record_verdict(&mut self, test_id: &str, verdict: Verdict) {
        match verdict {
            Verdict::Fixed => {
                self.newly_passed_count += 1;
                self.fixed_tests.push(test_id.to_string());
            }
            Verdict::Regression => {
                self.regression_count += 1;
                self.broken_tests.push(test_id.to_string());
            }
            Verdict::None => {}
        }
    }

    /// Records a test the baseline has never seen. The failure flag comes from
    /// the outcome recorded earlier for the same test.
    pub fn record_discovery(&mut self, test_id: &str) {
        if self.discovered_tests.iter().any(|seen| seen == test_id) {
            return;
        }
        let failed = self.outcome(test_id).is_some_and(|record| record.failed);
        self.discovered_tests.push(test_id.to_string());
        if failed {
            self.discovered_failures.push(test_id.to_string());
        }
        append_run_log(
            "debug",
            "session.discovered",
            json!({ "test": test_id, "failed": failed }),
        );
    }

    pub fn has_changes(&self) -> bool {
        !self.discovered_tests.is_empty()
            || !self.discovered_failures.is_empty()
            || !self.fixed_tests.is_empty()
    }
}
