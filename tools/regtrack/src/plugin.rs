//! The hook surface a host test runner drives, and the regression tracker
//! that implements it.

use crate::baseline::Baseline;
use crate::classifier::classify;
use crate::config::{register_options, resolve_run_config, CliOverrides, RunConfig};
use crate::errors::RegressError;
use crate::logging::append_run_log;
use crate::persist::merge_and_save;
use crate::report::render_report;
use crate::runtime::{FileSystem, Terminal};
use crate::selection::should_run;
use crate::session::SessionResult;
use crate::types::{Selection, TestSubject};
use clap::Command;
use serde_json::json;
use std::path::Path;

/// Callbacks invoked by a host test runner. Outcome hooks run strictly after
/// the test they describe has finished, one test at a time.
pub trait RunnerPlugin {
    fn on_options_registration(&self, command: Command) -> Result<Command, RegressError>;
    fn on_configure(&mut self, options: &CliOverrides, process_cwd: &Path)
        -> Result<(), RegressError>;
    fn on_select_test(&self, test: &TestSubject) -> Selection;
    fn on_test_success(&mut self, test: &TestSubject);
    fn on_test_failure(&mut self, test: &TestSubject, detail: Option<&str>);
    fn on_test_error(&mut self, test: &TestSubject, detail: Option<&str>);
    fn on_test_complete(&mut self, test: &TestSubject);
    fn on_report(&mut self, terminal: &dyn Terminal) -> Result<(), RegressError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fixed: usize,
    pub regressions: usize,
    pub discovered: usize,
    pub store_written: bool,
}

pub struct RegressionPlugin {
    baseline: Baseline,
    session: SessionResult,
    config: RunConfig,
}

impl RegressionPlugin {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            baseline,
            session: SessionResult::new(),
            config: RunConfig::default(),
        }
    }

    pub fn with_config(baseline: Baseline, config: RunConfig) -> Self {
        Self {
            config,
            ..Self::new(baseline)
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn session(&self) -> &SessionResult {
        &self.session
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Ends the run: folds the session into the baseline and writes the store
    /// unless writing is disabled. Consumes the session.
    pub fn finish(mut self, fs: &dyn FileSystem) -> Result<(RunSummary, Baseline), RegressError> {
        let mut summary = RunSummary {
            fixed: self.session.newly_passed_count,
            regressions: self.session.regression_count,
            discovered: self.session.discovered_tests.len(),
            store_written: false,
        };
        if self.config.write {
            summary.store_written = merge_and_save(
                fs,
                &self.config.store_path,
                &mut self.baseline,
                &self.session,
            )?;
        } else if self.session.has_changes() {
            append_run_log(
                "info",
                "store.write_suppressed",
                json!({ "path": self.config.store_path.display().to_string() }),
            );
        }
        Ok((summary, self.baseline))
    }

    fn record_outcome(&mut self, test: &TestSubject, passed: bool) {
        let Some(test_id) = tracked_id(test) else {
            return;
        };
        classify(&self.baseline, &mut self.session, test_id, passed);
    }
}

/// Placeholders never reach the classifier.
fn tracked_id(test: &TestSubject) -> Option<&str> {
    match test {
        TestSubject::Test(id) => Some(id),
        TestSubject::Placeholder { reason } => {
            append_run_log(
                "debug",
                "plugin.placeholder_ignored",
                json!({ "reason": reason }),
            );
            None
        }
    }
}

impl RunnerPlugin for RegressionPlugin {
    fn on_options_registration(&self, command: Command) -> Result<Command, RegressError> {
        register_options(command, &self.baseline.static_options)
    }

    fn on_configure(
        &mut self,
        options: &CliOverrides,
        process_cwd: &Path,
    ) -> Result<(), RegressError> {
        self.config = resolve_run_config(options, process_cwd)?;
        append_run_log(
            "info",
            "plugin.configured",
            json!({
                "write": self.config.write,
                "mode": self.config.mode.as_str(),
                "store_path": self.config.store_path.display().to_string(),
            }),
        );
        Ok(())
    }

    fn on_select_test(&self, test: &TestSubject) -> Selection {
        let Some(test_id) = test.test_id() else {
            return Selection::DontCare;
        };
        let selection = should_run(self.config.mode, &self.baseline, test_id);
        if selection == Selection::No {
            append_run_log(
                "debug",
                "selection.excluded",
                json!({ "test": test_id, "mode": self.config.mode.as_str() }),
            );
        }
        selection
    }

    fn on_test_success(&mut self, test: &TestSubject) {
        self.record_outcome(test, true);
    }

    fn on_test_failure(&mut self, test: &TestSubject, _detail: Option<&str>) {
        self.record_outcome(test, false);
    }

    fn on_test_error(&mut self, test: &TestSubject, _detail: Option<&str>) {
        self.record_outcome(test, false);
    }

    fn on_test_complete(&mut self, test: &TestSubject) {
        let Some(test_id) = tracked_id(test) else {
            return;
        };
        if !self.baseline.is_known(test_id) {
            self.session.record_discovery(test_id);
        }
    }

    fn on_report(&mut self, terminal: &dyn Terminal) -> Result<(), RegressError> {
        let rendered = render_report(&self.session);
        for line in rendered.lines() {
            terminal.write_line(line)?;
        }
        Ok(())
    }
}
