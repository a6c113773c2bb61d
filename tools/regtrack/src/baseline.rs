//! The persisted baseline: which tests exist and which are expected to fail.
//!
//! On disk this is a TOML document with three top-level bindings:
//!
//! ```toml
//! tests = ["suite::a", "suite::b"]
//! should_fail = ["suite::b"]
//!
//! [options]
//! reg = "true"
//! ```

use crate::errors::RegressError;
use crate::logging::append_run_log;
use crate::runtime::FileSystem;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_STORE_FILE: &str = "reg_settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(rename = "tests")]
    pub all_known_tests: Vec<String>,
    #[serde(rename = "should_fail")]
    pub expected_to_fail: Vec<String>,
    #[serde(rename = "options")]
    pub static_options: IndexMap<String, String>,
}

impl Baseline {
    pub fn is_known(&self, test_id: &str) -> bool {
        self.all_known_tests.iter().any(|known| known == test_id)
    }

    pub fn is_expected_to_fail(&self, test_id: &str) -> bool {
        self.expected_to_fail.iter().any(|failing| failing == test_id)
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.static_options.get(key).map(String::as_str)
    }

    /// Checks the structural invariants a well-formed store always satisfies.
    pub fn validate(&self) -> Result<(), RegressError> {
        let known = unique_set("tests", &self.all_known_tests)?;
        unique_set("should_fail", &self.expected_to_fail)?;
        if let Some(orphan) = self
            .expected_to_fail
            .iter()
            .find(|id| !known.contains(id.as_str()))
        {
            return Err(RegressError::StoreFormat(format!(
                "should_fail entry `{orphan}` is not listed in tests"
            )));
        }
        Ok(())
    }
}

fn unique_set<'a>(binding: &str, ids: &'a [String]) -> Result<HashSet<&'a str>, RegressError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(RegressError::StoreFormat(format!(
                "duplicate entry `{id}` in {binding}"
            )));
        }
    }
    Ok(seen)
}

pub fn parse_store(text: &str) -> Result<Baseline, RegressError> {
    let baseline: Baseline =
        toml::from_str(text).map_err(|e| RegressError::StoreFormat(e.to_string()))?;
    baseline.validate()?;
    Ok(baseline)
}

pub fn render_store(baseline: &Baseline) -> Result<String, RegressError> {
    toml::to_string_pretty(baseline).map_err(|e| RegressError::StoreFormat(e.to_string()))
}

/// Reads the store at `path`, creating it with empty bindings first when it
/// does not exist yet.
pub fn load_or_init(fs: &dyn FileSystem, path: &Path) -> Result<Baseline, RegressError> {
    if !fs.exists(path) {
        ensure_parent_dir(fs, path)?;
        fs.write_string(path, &render_store(&Baseline::default())?)?;
        append_run_log(
            "info",
            "store.initialized",
            json!({ "path": path.display().to_string() }),
        );
    }

    let text = fs.read_to_string(path)?;
    let baseline = parse_store(&text).map_err(|err| match err {
        RegressError::StoreFormat(detail) => {
            RegressError::StoreFormat(format!("{}: {detail}", path.display()))
        }
        other => other,
    })?;
    append_run_log(
        "info",
        "store.loaded",
        json!({
            "path": path.display().to_string(),
            "known": baseline.all_known_tests.len(),
            "expected_to_fail": baseline.expected_to_fail.len(),
            "options": baseline.static_options.len(),
        }),
    );
    Ok(baseline)
}

/// Overwrites the whole store with `baseline`.
pub fn save(fs: &dyn FileSystem, path: &Path, baseline: &Baseline) -> Result<(), RegressError> {
    let rendered = render_store(baseline)?;
    ensure_parent_dir(fs, path)?;
    fs.write_string(path, &rendered)?;
    append_run_log(
        "info",
        "store.written",
        json!({
            "path": path.display().to_string(),
            "known": baseline.all_known_tests.len(),
            "expected_to_fail": baseline.expected_to_fail.len(),
        }),
    );
    Ok(())
}

fn ensure_parent_dir(fs: &dyn FileSystem, path: &Path) -> Result<(), RegressError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs.create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{load_or_init, parse_store, render_store, save, Baseline};
    use crate::errors::RegressError;
    use crate::runtime::{FakeFileSystem, FileSystem};
    use std::path::Path;

    fn sample() -> Baseline {
        let mut baseline = Baseline {
            all_known_tests: vec![
                "suite::zeta".to_string(),
                "suite::alpha".to_string(),
                "suite::mid".to_string(),
            ],
            expected_to_fail: vec!["suite::mid".to_string(), "suite::zeta".to_string()],
            ..Baseline::default()
        };
        baseline
            .static_options
            .insert("reg".to_string(), "true".to_string());
        baseline
            .static_options
            .insert("file".to_string(), "state/reg.toml".to_string());
        baseline
    }

    #[test]
    fn reload_preserves_order_and_options() {
        let original = sample();
        let text = render_store(&original).expect("render");
        let reloaded = parse_store(&text).expect("parse");
        assert_eq!(reloaded, original);
        assert_eq!(reloaded.all_known_tests[0], "suite::zeta");
        assert_eq!(reloaded.expected_to_fail[0], "suite::mid");
    }

    #[test]
    fn rendered_store_uses_the_three_bindings() {
        let text = render_store(&sample()).expect("render");
        assert!(text.contains("tests = ["));
        assert!(text.contains("should_fail = ["));
        assert!(text.contains("[options]"));
    }

    #[test]
    fn empty_store_round_trips() {
        let text = render_store(&Baseline::default()).expect("render");
        assert_eq!(parse_store(&text).expect("parse"), Baseline::default());
    }

    #[test]
    fn missing_store_is_created_empty() {
        let fs = FakeFileSystem::default();
        let path = Path::new("/work/reg_settings.toml");

        let baseline = load_or_init(&fs, path).expect("load");

        assert_eq!(baseline, Baseline::default());
        assert!(fs.exists(path));
        assert_eq!(fs.writes().len(), 1);
    }

    #[test]
    fn existing_store_is_read_without_writing() {
        let text = render_store(&sample()).expect("render");
        let fs = FakeFileSystem::with_file("/work/reg_settings.toml", text);

        let baseline = load_or_init(&fs, Path::new("/work/reg_settings.toml")).expect("load");

        assert_eq!(baseline, sample());
        assert!(fs.writes().is_empty());
    }

    #[test]
    fn syntax_errors_are_store_format_errors() {
        let fs = FakeFileSystem::with_file("/s.toml", "tests = [\"a\"\nshould_fail = ");
        let err = load_or_init(&fs, Path::new("/s.toml")).expect_err("malformed");
        assert!(matches!(err, RegressError::StoreFormat(_)));
        assert!(format!("{err}").contains("/s.toml"));
    }

    #[test]
    fn missing_binding_is_rejected() {
        let err = parse_store("tests = []\n[options]\n").expect_err("no should_fail");
        assert!(matches!(err, RegressError::StoreFormat(_)));
    }

    #[test]
    fn expected_failures_must_be_known() {
        let err = parse_store("tests = [\"a\"]\nshould_fail = [\"b\"]\n[options]\n")
            .expect_err("orphan");
        assert!(format!("{err}").contains("`b` is not listed in tests"));
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let err = parse_store("tests = [\"a\", \"a\"]\nshould_fail = []\n[options]\n")
            .expect_err("duplicate");
        assert!(format!("{err}").contains("duplicate entry `a` in tests"));
    }

    #[test]
    fn save_overwrites_whole_file() {
        let fs = FakeFileSystem::with_file("/s.toml", "stale contents");
        save(&fs, Path::new("/s.toml"), &sample()).expect("save");
        let written = fs.contents("/s.toml").expect("written");
        assert!(!written.contains("stale"));
        assert_eq!(parse_store(&written).expect("parse"), sample());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let fs = FakeFileSystem::default();
        let path = Path::new("/work/archive/reg.toml");

        save(&fs, path, &sample()).expect("save");

        assert_eq!(
            parse_store(&fs.contents(path).expect("written")).expect("parse"),
            sample()
        );
    }

    #[test]
    fn unreadable_store_surfaces_io_error() {
        let fs = FakeFileSystem::with_file("/work/reg_settings.toml", "");
        fs.set_fail_next(RegressError::Io("permission denied".to_string()));

        let err = load_or_init(&fs, Path::new("/work/reg_settings.toml")).expect_err("io");
        assert!(matches!(err, RegressError::Io(_)));
    }

    #[test]
    fn hand_written_option_order_survives_a_rewrite() {
        let text = "tests = []\nshould_fail = []\n\n[options]\nreg = \"true\"\nfile = \"a.toml\"\nno-write = \"false\"\n";
        let rendered = render_store(&parse_store(text).expect("parse")).expect("render");

        let reg = rendered.find("reg =").expect("reg");
        let file = rendered.find("file =").expect("file");
        let no_write = rendered.find("no-write =").expect("no-write");
        assert!(reg < file && file < no_write, "{rendered}");
    }
}
