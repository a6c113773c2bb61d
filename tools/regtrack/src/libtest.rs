//! Host adapter for libtest's JSON event stream
//! (`cargo test -- -Z unstable-options --format json`, or nextest's
//! libtest-json output).

use crate::errors::RegressError;
use crate::logging::append_run_log;
use crate::plugin::RunnerPlugin;
use crate::types::{Selection, TestSubject};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct LibtestRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEvent {
    Started,
    Passed,
    Failed,
    Errored,
    Ignored,
}

impl TestEvent {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "started" => Some(Self::Started),
            "ok" => Some(Self::Passed),
            "failed" | "timeout" => Some(Self::Failed),
            "error" => Some(Self::Errored),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub executed: usize,
    pub deselected: usize,
    pub ignored: usize,
    pub placeholders: usize,
}

pub fn parse_record(line: &str, line_no: usize) -> Result<LibtestRecord, RegressError> {
    serde_json::from_str(line).map_err(|err| {
        RegressError::EventStream(format!(
            "line {line_no}: {err}; input={}",
            line.chars().take(256).collect::<String>()
        ))
    })
}

/// Feeds every test record in `input` to `plugin`. Lines that are not JSON
/// objects are skipped.
pub fn drive(plugin: &mut dyn RunnerPlugin, input: &str) -> Result<StreamStats, RegressError> {
    let mut stats = StreamStats::default();
    let mut admitted: HashMap<String, bool> = HashMap::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if !line.starts_with('{') {
            continue;
        }
        let record = parse_record(line, index + 1)?;
        if record.kind != "test" {
            continue;
        }
        let Some(event) = record.event.as_deref().and_then(TestEvent::parse) else {
            continue;
        };

        let subject = match record.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => TestSubject::test(name),
            _ => TestSubject::placeholder(
                record
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("unnamed test event `{}`", event_name(event))),
            ),
        };

        if let TestSubject::Test(id) = &subject {
            let allowed = match admitted.get(id) {
                Some(allowed) => *allowed,
                None => {
                    let allowed = plugin.on_select_test(&subject) != Selection::No;
                    if !allowed {
                        stats.deselected += 1;
                    }
                    admitted.insert(id.clone(), allowed);
                    allowed
                }
            };
            if !allowed {
                continue;
            }
        }

        let detail = record.stdout.as_deref().or(record.message.as_deref());
        match event {
            TestEvent::Started => continue,
            TestEvent::Ignored => {
                stats.ignored += 1;
                continue;
            }
            TestEvent::Passed => plugin.on_test_success(&subject),
            TestEvent::Failed => plugin.on_test_failure(&subject, detail),
            TestEvent::Errored => plugin.on_test_error(&subject, detail),
        }
        plugin.on_test_complete(&subject);
        match subject {
            TestSubject::Test(_) => stats.executed += 1,
            TestSubject::Placeholder { .. } => stats.placeholders += 1,
        }
    }

    append_run_log(
        "info",
        "libtest.stream.finished",
        json!({
            "executed": stats.executed,
            "deselected": stats.deselected,
            "ignored": stats.ignored,
            "placeholders": stats.placeholders,
        }),
    );
    Ok(stats)
}

fn event_name(event: TestEvent) -> &'static str {
    match event {
        TestEvent::Started => "started",
        TestEvent::Passed => "ok",
        TestEvent::Failed => "failed",
        TestEvent::Errored => "error",
        TestEvent::Ignored => "ignored",
    }
}

/// Test names from a `--list --format terse` listing (`name: test` lines).
/// Benchmarks and other noise are dropped.
pub fn parse_test_listing(input: &str) -> Vec<&str> {
    input
        .lines()
        .filter_map(|line| line.trim().strip_suffix(": test"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{drive, parse_test_listing};
    use crate::baseline::Baseline;
    use crate::config::RunConfig;
    use crate::errors::RegressError;
    use crate::plugin::RegressionPlugin;
    use crate::types::SelectionMode;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn plugin(known: &[&str], failing: &[&str], mode: SelectionMode) -> RegressionPlugin {
        RegressionPlugin::with_config(
            Baseline {
                all_known_tests: ids(known),
                expected_to_fail: ids(failing),
                ..Baseline::default()
            },
            RunConfig {
                mode,
                ..RunConfig::default()
            },
        )
    }

    const STREAM: &str = r#"   Compiling demo v0.1.0
running 3 tests
{ "type": "suite", "event": "started", "test_count": 4 }
{ "type": "test", "event": "started", "name": "suite::a" }
{ "type": "test", "event": "started", "name": "suite::b" }
{ "type": "test", "name": "suite::a", "event": "ok" }
{ "type": "test", "name": "suite::b", "event": "failed", "stdout": "panicked" }
{ "type": "test", "event": "started", "name": "suite::c" }
{ "type": "test", "name": "suite::c", "event": "ignored" }
{ "type": "test", "name": "suite::d", "event": "timeout" }
{ "type": "suite", "event": "failed", "passed": 1, "failed": 2 }
"#;

    #[test]
    fn stream_drives_classification_and_discovery() {
        let mut plugin = plugin(&["suite::a", "suite::b"], &["suite::a"], SelectionMode::All);

        let stats = drive(&mut plugin, STREAM).expect("drive");

        assert_eq!(stats.executed, 3);
        assert_eq!(stats.ignored, 1);
        assert_eq!(plugin.session().fixed_tests, ids(&["suite::a"]));
        assert_eq!(plugin.session().broken_tests, ids(&["suite::b"]));
        assert_eq!(plugin.session().discovered_tests, ids(&["suite::d"]));
        assert_eq!(plugin.session().discovered_failures, ids(&["suite::d"]));
    }

    #[test]
    fn deselected_tests_are_not_classified() {
        let mut plugin = plugin(
            &["suite::a", "suite::b"],
            &["suite::a"],
            SelectionMode::RegressionOnly,
        );

        let stats = drive(&mut plugin, STREAM).expect("drive");

        assert_eq!(stats.deselected, 1);
        assert!(plugin.session().fixed_tests.is_empty());
        assert_eq!(plugin.session().broken_tests, ids(&["suite::b"]));
    }

    #[test]
    fn unnamed_failures_are_placeholders() {
        let mut plugin = plugin(&["suite::a"], &[], SelectionMode::All);
        let input = r#"{"type":"test","event":"error","message":"could not compile"}
{"type":"test","event":"failed","name":""}
"#;

        let stats = drive(&mut plugin, input).expect("drive");

        assert_eq!(stats.placeholders, 2);
        assert_eq!(stats.executed, 0);
        assert!(plugin.session().discovered_tests.is_empty());
        assert!(plugin.session().broken_tests.is_empty());
    }

    #[test]
    fn truncated_json_line_is_an_error() {
        let mut plugin = plugin(&[], &[], SelectionMode::All);
        let err = drive(&mut plugin, "{\"type\":\"test\",\"event\":").expect_err("malformed");
        assert!(matches!(err, RegressError::EventStream(_)));
        assert!(format!("{err}").contains("line 1"));
    }

    #[test]
    fn listing_keeps_only_tests() {
        let listing = "suite::a: test\nsuite::bench_x: benchmark\n\n2 tests, 1 benchmark\nsuite::b: test\n";
        assert_eq!(parse_test_listing(listing), vec!["suite::a", "suite::b"]);
    }
}
