// src/utils/logging.rs
use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

/// Diagnostic sink handed to every resolver.
///
/// Resolution never reports *why* it produced nothing through its return
/// value, so everything worth knowing ends up here.
pub trait Logger {
    fn log(&mut self, message: &str);
    fn debug_log(&mut self, message: &str);
    fn warn(&mut self, message: &str) {
        self.log(&format!("[WARN] {}", message));
    }
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: String,
    debug: bool,
}

impl FileLogger {
    pub fn new(log_file: &str, debug: bool) -> std::io::Result<Self> {
        if let Some(parent) = Path::new(log_file).parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(FileLogger {
            log_file: log_file.to_string(),
            debug,
        })
    }

    fn write_to_file(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
    }
}

impl Logger for FileLogger {
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write_to_file(message) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&format!("[DEBUG] {}", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

/// Writes warnings (and debug lines when enabled) to stderr.
#[derive(Debug, Default)]
pub struct StderrLogger {
    debug: bool,
}

impl StderrLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for StderrLogger {
    fn log(&mut self, message: &str) {
        if self.debug {
            eprintln!("{}", message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            eprintln!("[DEBUG] {}", message);
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

// MultiLogger allows logging to multiple destinations
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, logger: Box<dyn Logger>) -> Self {
        self.loggers.push(logger);
        self
    }
}

impl Logger for MultiLogger {
    fn log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.debug_log(message);
        }
    }

    fn warn(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.warn(message);
        }
    }
}

/// Keeps every line in memory, tagged with its level.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    pub entries: Vec<String>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.strip_prefix("WARN: "))
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&mut self, message: &str) {
        self.entries.push(format!("INFO: {}", message));
    }

    fn debug_log(&mut self, message: &str) {
        self.entries.push(format!("DEBUG: {}", message));
    }

    fn warn(&mut self, message: &str) {
        self.entries.push(format!("WARN: {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[test]
    fn test_file_logger_skips_debug_lines_unless_enabled() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("logs").join("resolve.log");
        let path_str = path.to_str().unwrap();

        let mut quiet = FileLogger::new(path_str, false)?;
        quiet.log("first");
        quiet.debug_log("hidden");
        quiet.warn("careful");

        let mut verbose = FileLogger::new(path_str, true)?;
        verbose.debug_log("shown");

        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains(": first"));
        assert!(contents.contains("[WARN] careful"));
        assert!(contents.contains("[DEBUG] shown"));
        assert!(!contents.contains("hidden"));
        Ok(())
    }

    #[test]
    fn test_multi_logger_fans_out() {
        struct Shared(Rc<RefCell<MemoryLogger>>);
        impl Logger for Shared {
            fn log(&mut self, message: &str) {
                self.0.borrow_mut().log(message);
            }
            fn debug_log(&mut self, message: &str) {
                self.0.borrow_mut().debug_log(message);
            }
            fn warn(&mut self, message: &str) {
                self.0.borrow_mut().warn(message);
            }
        }

        let first = Rc::new(RefCell::new(MemoryLogger::new()));
        let second = Rc::new(RefCell::new(MemoryLogger::new()));
        let mut multi = MultiLogger::new()
            .with(Box::new(Shared(Rc::clone(&first))))
            .with(Box::new(Shared(Rc::clone(&second))));
        multi.log("a");
        multi.warn("b");
        multi.debug_log("c");

        for sink in [&first, &second] {
            assert_eq!(
                sink.borrow().entries,
                vec!["INFO: a", "WARN: b", "DEBUG: c"]
            );
        }
    }

    #[test]
    fn test_memory_logger_warnings() {
        let mut logger = MemoryLogger::new();
        logger.log("plain");
        logger.warn("token file unreadable");
        assert_eq!(logger.warnings(), vec!["token file unreadable"]);
        assert!(logger.contains("plain"));
    }
}
