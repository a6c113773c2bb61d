pub mod baseline;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod libtest;
pub mod logging;
pub mod persist;
pub mod plugin;
pub mod report;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod types;

use baseline::load_or_init;
use clap::{error::ErrorKind, CommandFactory, FromArgMatches, Parser};
use config::{absolutize_path, resolve_store_path, CliOverrides};
use errors::RegressError;
use logging::{append_run_log, init_run_log};
use plugin::{RegressionPlugin, RunnerPlugin};
use runtime::ProductionRuntime;
use serde_json::json;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "regtrack", version)]
#[command(about = "Track expected test failures across runs and flag regressions and fixes")]
pub struct Cli {
    /// Don't write results back to the store
    #[arg(short = 'W', long = "no-write", default_value_t = false)]
    pub no_write: bool,
    /// Only run tests that are not expected to fail
    #[arg(short = 'r', long, default_value_t = false)]
    pub reg: bool,
    /// Only run tests that are expected to fail
    #[arg(short = 'n', long, default_value_t = false)]
    pub new: bool,
    /// Path to the store file
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Read libtest JSON events from FILE instead of stdin
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,
    /// Read a `--list --format terse` listing and print the tests to run
    #[arg(long, default_value_t = false)]
    pub list_selected: bool,
    /// Append structured run events to FILE
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            no_write: cli.no_write,
            reg: cli.reg,
            new: cli.new,
            file: cli.file.clone(),
            events: cli.events.clone(),
            list_selected: cli.list_selected,
        }
    }
}

pub fn run() -> Result<i32, RegressError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| RegressError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[OsString],
    cwd: &Path,
    runtime: &ProductionRuntime,
) -> Result<i32, RegressError> {
    let Some(initial) = parse_cli(Cli::command(), args, runtime)? else {
        return Ok(0);
    };
    if let Some(log) = &initial.log {
        init_run_log(absolutize_path(cwd, log));
    }

    let load_path = resolve_store_path(cwd, initial.file.as_deref());
    let baseline = load_or_init(runtime.file_system.as_ref(), &load_path)?;
    let mut plugin = RegressionPlugin::new(baseline);

    let command = plugin.on_options_registration(Cli::command())?;
    let Some(cli) = parse_cli(command, args, runtime)? else {
        return Ok(0);
    };
    plugin.on_configure(&CliOverrides::from(&cli), cwd)?;

    let input = match &plugin.config().events_path {
        Some(path) => runtime.file_system.read_to_string(path)?,
        None if runtime.terminal.stdin_is_tty() => {
            return Err(RegressError::Cli(
                "no event stream: pipe libtest JSON into stdin or pass --events FILE"
                    .to_string(),
            ))
        }
        None => runtime.terminal.read_input()?,
    };

    if plugin.config().list_selected {
        let selected = selection::select(
            plugin.config().mode,
            plugin.baseline(),
            libtest::parse_test_listing(&input),
        );
        for name in &selected {
            runtime.terminal.write_line(name)?;
        }
        append_run_log(
            "info",
            "selection.listed",
            json!({ "selected": selected.len(), "mode": plugin.config().mode.as_str() }),
        );
        return Ok(0);
    }

    let stats = libtest::drive(&mut plugin, &input)?;
    plugin.on_report(runtime.terminal.as_ref())?;
    let (summary, _baseline) = plugin.finish(runtime.file_system.as_ref())?;
    append_run_log(
        "info",
        "run.finished",
        json!({
            "executed": stats.executed,
            "deselected": stats.deselected,
            "fixed": summary.fixed,
            "regressions": summary.regressions,
            "discovered": summary.discovered,
            "store_written": summary.store_written,
        }),
    );
    Ok(0)
}

fn parse_cli(
    command: clap::Command,
    args: &[OsString],
    runtime: &ProductionRuntime,
) -> Result<Option<Cli>, RegressError> {
    let matches = match command.try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                runtime.terminal.write_line(error.to_string().trim_end())?;
                return Ok(None);
            }
            _ => return Err(RegressError::Cli(error.to_string())),
        },
    };
    Cli::from_arg_matches(&matches)
        .map(Some)
        .map_err(|e| RegressError::Cli(e.to_string()))
}

pub fn render_help() -> Result<String, RegressError> {
    let mut cmd = Cli::command();
    let mut buffer = Vec::new();
    cmd.write_long_help(&mut buffer)
        .map_err(|e| RegressError::Io(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| RegressError::Io(e.to_string()))
}
