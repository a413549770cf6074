use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tracing_subscriber::fmt::MakeWriter;

use crate::platform::{NativePlatform, Platform};

pub const LOG_LEVEL_ENV: &str = "LEADRELAY_LOG";

/// Appends formatted events to the data-dir log file, optionally echoing them to stderr.
#[derive(Clone)]
pub(crate) struct LogFileMakeWriter {
    file: Arc<Mutex<File>>,
    mirror_stderr: bool,
}

impl<'a> MakeWriter<'a> for LogFileMakeWriter {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter {
            file: self.file.clone(),
            mirror_stderr: self.mirror_stderr,
        }
    }
}

pub(crate) struct LogFileWriter {
    file: Arc<Mutex<File>>,
    mirror_stderr: bool,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut file) = self.file.lock() {
            file.write_all(buf)?;
        }
        if self.mirror_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut file) = self.file.lock() {
            file.flush()?;
        }
        if self.mirror_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

/// `LEADRELAY_LOG` directives such as `debug` or `leadrelay=debug,warn`; `info` when unset or invalid.
pub(crate) fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber writing to `<data_dir>/logs/leadrelay.log`.
pub fn init(data_dir: &Path, verbose: bool) -> Result<()> {
    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;
    NativePlatform::restrict_dir_permissions(data_dir);

    let log_path = logs_dir.join("leadrelay.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;
    NativePlatform::restrict_file_permissions(&log_path);

    let make_writer = LogFileMakeWriter {
        file: Arc::new(Mutex::new(file)),
        mirror_stderr: verbose,
    };
    let filter = build_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_directives_and_falls_back_to_info() {
        assert!(build_filter(Some("leadrelay=debug,warn")).to_string().contains("leadrelay=debug"));
        assert_eq!(build_filter(Some("leadrelay=loud")).to_string(), "info");
        assert_eq!(build_filter(None).to_string(), "info");
    }

    #[test]
    fn writer_appends_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let make_writer = LogFileMakeWriter {
            file: Arc::new(Mutex::new(file)),
            mirror_stderr: false,
        };
        make_writer.make_writer().write_all(b"first\n").unwrap();
        make_writer.make_writer().write_all(b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
