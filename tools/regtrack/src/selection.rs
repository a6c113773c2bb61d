use crate::baseline::Baseline;
use crate::types::{Selection, SelectionMode};

pub fn should_run(mode: SelectionMode, baseline: &Baseline, test_id: &str) -> Selection {
    match mode {
        SelectionMode::All => Selection::DontCare,
        SelectionMode::RegressionOnly => {
            if baseline.is_expected_to_fail(test_id) {
                Selection::No
            } else {
                Selection::DontCare
            }
        }
        SelectionMode::NewOnly => {
            if baseline.is_expected_to_fail(test_id) {
                Selection::DontCare
            } else {
                Selection::No
            }
        }
    }
}

/// Filters a candidate list down to the tests `mode` lets through, keeping
/// the input order.
pub fn select<'a>(
    mode: SelectionMode,
    baseline: &Baseline,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    candidates
        .into_iter()
        .filter(|test_id| should_run(mode, baseline, test_id).allows())
        .collect()
}
