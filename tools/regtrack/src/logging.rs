use crate::errors::RegressError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), RegressError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RegressError::Io(e.to_string()))?;
            }
        }
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| RegressError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RegressError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| RegressError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| RegressError::Io(e.to_string()))?;
        Ok(())
    }
}

static RUN_LOGGER: OnceLock<Mutex<Option<Arc<JsonlLogger>>>> = OnceLock::new();

fn logger_slot() -> &'static Mutex<Option<Arc<JsonlLogger>>> {
    RUN_LOGGER.get_or_init(|| Mutex::new(None))
}

/// Route every later `append_run_log` call to `path`.
pub fn init_run_log(path: impl AsRef<Path>) {
    if let Ok(mut slot) = logger_slot().lock() {
        *slot = Some(Arc::new(JsonlLogger::new(path)));
    }
}

pub fn clear_run_log() {
    if let Ok(mut slot) = logger_slot().lock() {
        *slot = None;
    }
}

/// Append one event to the run log. No-op when no run log is installed;
/// write failures never interrupt the run.
pub fn append_run_log(level: &str, event_type: &str, payload: Value) {
    let logger = match logger_slot().lock() {
        Ok(slot) => slot.clone(),
        Err(_) => return,
    };
    if let Some(logger) = logger {
        let _ = logger.append(&LogEvent {
            level,
            event_type,
            payload,
        });
    }
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}
