use anyhow::Result;
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

// Log targets of this crate start with the library name
const OWN_TARGET: &str = "chatsync";

// Dependencies only get to report warnings and errors
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

// The terminal belongs to the UI while the app runs, so log lines go to a file.
pub struct SimpleLogger {
    log_file: Option<Mutex<File>>,
    level: LevelFilter,
}

impl SimpleLogger {
    pub fn new(log_file_path: Option<&Path>, level: LevelFilter) -> Result<Self> {
        let log_file = match log_file_path {
            Some(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => None,
        };

        Ok(SimpleLogger { log_file, level })
    }

    fn limit_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET) {
            self.level
        } else {
            self.level.min(DEPENDENCY_LEVEL)
        }
    }

    fn write_line(&self, line: &str) {
        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.write_all(line.as_bytes());
                }
            }
            None => print!("{}", line),
        }
    }
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{} {:<5} {}:{} {}\n",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.line().unwrap_or(0),
            record.args()
        );
        self.write_line(&line);
    }

    fn flush(&self) {
        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.flush();
                }
            }
            None => {
                let _ = std::io::stdout().flush();
            }
        }
    }
}

pub fn setup_logging(log_file: Option<&Path>, level: LevelFilter) -> Result<()> {
    let logger = SimpleLogger::new(log_file, level)?;
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;

    log::info!("Logging initialized at level: {}", level);
    log::info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if level >= Level::Debug {
        log::debug!("Dependency logs limited to {}", DEPENDENCY_LEVEL);
    }

    Ok(())
}
