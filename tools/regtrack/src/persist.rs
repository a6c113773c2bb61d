use crate::baseline::{self, Baseline};
use crate::errors::RegressError;
use crate::logging::append_run_log;
use crate::runtime::FileSystem;
use crate::session::SessionResult;
use serde_json::json;
use std::path::Path;

/// Folds `session` into `baseline` in place. Returns whether anything changed.
///
/// Discoveries land before fixes are removed, and a fix may only remove an
/// entry that was present before this merge.
pub fn merge(baseline: &mut Baseline, session: &SessionResult) -> Result<bool, RegressError> {
    let mut changed = false;

    if !session.discovered_tests.is_empty() {
        baseline
            .all_known_tests
            .extend(session.discovered_tests.iter().cloned());
        changed = true;
    }

    let mut preexisting_failures = baseline.expected_to_fail.len();
    if !session.discovered_failures.is_empty() {
        baseline
            .expected_to_fail
            .extend(session.discovered_failures.iter().cloned());
        changed = true;
    }

    if !session.fixed_tests.is_empty() {
        for fixed in &session.fixed_tests {
            let position = baseline.expected_to_fail[..preexisting_failures]
                .iter()
                .position(|failing| failing == fixed)
                .ok_or_else(|| {
                    RegressError::InconsistentState(format!(
                        "fixed test `{fixed}` is not an expected failure"
                    ))
                })?;
            baseline.expected_to_fail.remove(position);
            preexisting_failures -= 1;
        }
        changed = true;
    }

    Ok(changed)
}

/// Merges `session` into `baseline` and writes the store when the merge
/// changed something. The store is left untouched otherwise.
pub fn merge_and_save(
    fs: &dyn FileSystem,
    path: &Path,
    baseline: &mut Baseline,
    session: &SessionResult,
) -> Result<bool, RegressError> {
    let changed = merge(baseline, session)?;
    if !changed {
        append_run_log(
            "info",
            "store.unchanged",
            json!({ "path": path.display().to_string() }),
        );
        return Ok(false);
    }
    baseline::save(fs, path, baseline)?;
    Ok(true)
}
