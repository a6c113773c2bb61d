use crate::errors::RegressError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, RegressError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RegressError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), RegressError>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait Terminal: Send + Sync {
    fn stdin_is_tty(&self) -> bool;
    fn write_line(&self, line: &str) -> Result<(), RegressError>;
    /// Drains the whole input stream (stdin in production).
    fn read_input(&self) -> Result<String, RegressError>;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, RegressError> {
        std::fs::read_to_string(path)
            .map_err(|e| RegressError::Io(format!("{}: {e}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RegressError> {
        std::fs::write(path, contents)
            .map_err(|e| RegressError::Io(format!("{}: {e}", path.display())))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), RegressError> {
        std::fs::create_dir_all(path).map_err(|e| RegressError::Io(e.to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn stdin_is_tty(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stdin())
    }

    fn write_line(&self, line: &str) -> Result<(), RegressError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| RegressError::Io(e.to_string()))
    }

    fn read_input(&self) -> Result<String, RegressError> {
        use std::io::Read;
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| RegressError::Io(e.to_string()))?;
        Ok(buffer)
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<HashSet<PathBuf>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<RegressError>>>,
}

impl FakeFileSystem {
    /// A file system holding `path`, with every ancestor directory present.
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs.add_dirs(parent);
        }
        fs.files
            .lock()
            .expect("files lock")
            .insert(path, contents.into());
        fs
    }

    pub fn set_fail_next(&self, error: RegressError) {
        *self.fail_next.lock().expect("fail lock") = Some(error);
    }

    /// Every path passed to `write_string`, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .expect("files lock")
            .get(path.as_ref())
            .cloned()
    }

    fn add_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.lock().expect("dirs lock");
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn has_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty()
            || path.parent().is_none()
            || self.dirs.lock().expect("dirs lock").contains(path)
    }

    fn maybe_fail(&self) -> Result<(), RegressError> {
        if let Some(err) = self.fail_next.lock().expect("fail lock").take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, RegressError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| RegressError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RegressError> {
        self.maybe_fail()?;
        if let Some(parent) = path.parent() {
            if !self.has_dir(parent) {
                return Err(RegressError::Io(format!(
                    "{}: No such file or directory",
                    path.display()
                )));
            }
        }
        self.writes
            .lock()
            .expect("writes lock")
            .push(path.to_path_buf());
        self.files
            .lock()
            .expect("files lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), RegressError> {
        self.maybe_fail()?;
        self.add_dirs(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().expect("files lock").contains_key(path)
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    pub is_tty: bool,
    input: Arc<Mutex<String>>,
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn with_input(input: impl Into<String>) -> Self {
        Self {
            input: Arc::new(Mutex::new(input.into())),
            ..Self::default()
        }
    }

    /// An interactive terminal with nothing piped in.
    pub fn interactive() -> Self {
        Self {
            is_tty: true,
            ..Self::default()
        }
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn output(&self) -> String {
        self.written_lines()
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }
}

impl Terminal for FakeTerminal {
    fn stdin_is_tty(&self) -> bool {
        self.is_tty
    }

    fn write_line(&self, line: &str) -> Result<(), RegressError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(line.to_string());
        Ok(())
    }

    fn read_input(&self) -> Result<String, RegressError> {
        Ok(std::mem::take(&mut *self.input.lock().expect("input lock")))
    }
}
