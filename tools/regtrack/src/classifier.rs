use crate::baseline::Baseline;
use crate::logging::append_run_log;
use crate::session::SessionResult;
use crate::types::Verdict;
use serde_json::json;

pub fn decide(baseline: &Baseline, test_id: &str, passed: bool) -> Verdict {
    let expected_to_fail = baseline.is_expected_to_fail(test_id);
    if passed && expected_to_fail {
        return Verdict::Fixed;
    }
    if !passed && !expected_to_fail && baseline.is_known(test_id) {
        return Verdict::Regression;
    }
    Verdict::None
}

/// Records the outcome of `test_id` and feeds the resulting verdict into
/// `session`. Only the first outcome reported for a test counts.
pub fn classify(
    baseline: &Baseline,
    session: &mut SessionResult,
    test_id: &str,
    passed: bool,
) -> Verdict {
    if !session.record_outcome(test_id, !passed) {
        append_run_log(
            "warn",
            "classifier.duplicate_outcome",
            json!({ "test": test_id, "passed": passed }),
        );
        return Verdict::None;
    }

    let verdict = decide(baseline, test_id, passed);
    session.record_verdict(test_id, verdict);
    if verdict != Verdict::None {
        append_run_log(
            "debug",
            "classifier.verdict",
            json!({ "test": test_id, "verdict": verdict.as_str() }),
        );
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::{classify, decide};
    use crate::baseline::Baseline;
    use crate::session::SessionResult;
    use crate::types::Verdict;

    fn baseline(known: &[&str], failing: &[&str]) -> Baseline {
        Baseline {
            all_known_tests: known.iter().map(|s| s.to_string()).collect(),
            expected_to_fail: failing.iter().map(|s| s.to_string()).collect(),
            ..Baseline::default()
        }
    }

    #[test]
    fn decision_table() {
        let base = baseline(&["good", "bad"], &["bad"]);
        let cases = [
            ("bad", true, Verdict::Fixed),
            ("bad", false, Verdict::None),
            ("good", false, Verdict::Regression),
            ("good", true, Verdict::None),
            ("unknown", false, Verdict::None),
            ("unknown", true, Verdict::None),
        ];
        for (test, passed, expected) in cases {
            assert_eq!(decide(&base, test, passed), expected, "{test} passed={passed}");
        }
    }

    #[test]
    fn fixed_test_is_counted_once() {
        let base = baseline(&["mod::test_x"], &["mod::test_x"]);
        let mut session = SessionResult::new();

        assert_eq!(classify(&base, &mut session, "mod::test_x", true), Verdict::Fixed);
        assert_eq!(classify(&base, &mut session, "mod::test_x", true), Verdict::None);

        assert_eq!(session.newly_passed_count, 1);
        assert_eq!(session.fixed_tests, vec!["mod::test_x"]);
    }

    #[test]
    fn regression_is_counted_once() {
        let base = baseline(&["mod::test_y"], &[]);
        let mut session = SessionResult::new();

        assert_eq!(
            classify(&base, &mut session, "mod::test_y", false),
            Verdict::Regression
        );
        assert_eq!(classify(&base, &mut session, "mod::test_y", false), Verdict::None);

        assert_eq!(session.regression_count, 1);
        assert_eq!(session.broken_tests, vec!["mod::test_y"]);
    }

    #[test]
    fn classification_records_failure_flag() {
        let base = Baseline::default();
        let mut session = SessionResult::new();
        classify(&base, &mut session, "fresh", false);
        assert!(session.outcome("fresh").is_some_and(|record| record.failed));
        assert_eq!(session.regression_count, 0);
    }
}
