use crate::baseline::DEFAULT_STORE_FILE;
use crate::errors::RegressError;
use crate::logging::append_run_log;
use crate::types::SelectionMode;
use clap::Command;
use indexmap::IndexMap;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Store option keys that pin the default of a command-line flag: the key,
/// the id of the argument it pins, and whether that argument is a switch.
pub const PINNABLE_OPTIONS: &[(&str, &str, bool)] = &[
    ("no-write", "no_write", true),
    ("reg", "reg", true),
    ("new", "new", true),
    ("file", "file", false),
];

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub no_write: bool,
    pub reg: bool,
    pub new: bool,
    pub file: Option<PathBuf>,
    pub events: Option<PathBuf>,
    pub list_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub write: bool,
    pub mode: SelectionMode,
    pub store_path: PathBuf,
    pub events_path: Option<PathBuf>,
    pub list_selected: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            write: true,
            mode: SelectionMode::All,
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            events_path: None,
            list_selected: false,
        }
    }
}

pub fn default_store_path(process_cwd: &Path) -> PathBuf {
    process_cwd.join(DEFAULT_STORE_FILE)
}

/// Where the store is read from: the explicit `--file`, or the default file
/// in the working directory.
pub fn resolve_store_path(process_cwd: &Path, file: Option<&Path>) -> PathBuf {
    match file {
        Some(path) => absolutize_path(process_cwd, path),
        None => default_store_path(process_cwd),
    }
}

/// Re-registers `command` with the flag defaults recorded in the store's
/// `options` table. Keys that pin nothing are left alone.
pub fn register_options(
    mut command: Command,
    options: &IndexMap<String, String>,
) -> Result<Command, RegressError> {
    for (key, arg_id, is_switch) in PINNABLE_OPTIONS {
        let Some(value) = options.get(*key) else {
            continue;
        };
        if *is_switch && value != "true" && value != "false" {
            return Err(RegressError::Config(format!(
                "store option `{key}` must be \"true\" or \"false\", got \"{value}\""
            )));
        }
        let pinned = value.clone();
        command = command.mut_arg(*arg_id, |arg| arg.default_value(pinned));
        append_run_log(
            "debug",
            "config.option.pinned",
            json!({ "option": key, "value": value }),
        );
    }
    Ok(command)
}

pub fn resolve_run_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
) -> Result<RunConfig, RegressError> {
    validate_overrides(overrides)?;

    let mode = if overrides.reg {
        SelectionMode::RegressionOnly
    } else if overrides.new {
        SelectionMode::NewOnly
    } else {
        SelectionMode::All
    };

    Ok(RunConfig {
        write: !overrides.no_write,
        mode,
        store_path: resolve_store_path(process_cwd, overrides.file.as_deref()),
        events_path: overrides
            .events
            .as_ref()
            .map(|path| absolutize_path(process_cwd, path)),
        list_selected: overrides.list_selected,
    })
}

fn validate_overrides(overrides: &CliOverrides) -> Result<(), RegressError> {
    if overrides.reg && overrides.new {
        return Err(RegressError::Config(
            "--reg and --new are mutually exclusive".to_string(),
        ));
    }
    Ok(())
}

pub fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}
