// src/utils/env.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Process-wide ambient state the resolvers depend on: environment variables
/// and file contents.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// The real process environment and filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// A fixed set of variables and in-memory files. Paths not registered with
/// [`StaticEnvironment::file`] fall through to the real filesystem only when
/// [`StaticEnvironment::with_filesystem`] was requested.
#[derive(Debug, Default, Clone)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
    files: HashMap<PathBuf, Vec<u8>>,
    filesystem: bool,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn with_filesystem(mut self) -> Self {
        self.filesystem = true;
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Some(contents) = self.files.get(path) {
            return Ok(contents.clone());
        }
        if self.filesystem {
            return fs::read(path);
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        ))
    }
}
