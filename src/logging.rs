use std::any::Any;
use std::path::{Path, PathBuf};

pub const LOG_SUBDIR: &str = "logs";
pub const LOG_FILE_BASENAME: &str = "daybyday";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 100 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 30;

/// Rotated logs get their own directory so they never sit among the value files.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_SUBDIR)
}

/// Starts the file logger. Keep the returned handle alive until exit so the
/// last lines are flushed.
#[cfg(feature = "app")]
pub fn init_logging(
    data_dir: &Path,
    log_spec: &str,
) -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    use flexi_logger::{detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};

    let dir = log_dir(data_dir);
    std::fs::create_dir_all(&dir)?;

    // A CLI run is short; stderr keeps stdout clean for command output.
    let echo = if cfg!(debug_assertions) {
        Duplicate::Warn
    } else {
        Duplicate::None
    };
    let handle = Logger::try_with_str(log_spec)?
        .log_to_file(FileSpec::default().directory(&dir).basename(LOG_FILE_BASENAME))
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(echo)
        .start()?;

    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_default();
        log::error!(
            "panic at {location}: {}\n{}",
            panic_text(info.payload()),
            std::backtrace::Backtrace::capture()
        );
        eprintln!("daybyday crashed: {}", panic_text(info.payload()));
    }));

    log::debug!("logging to {} with {log_spec}", dir.display());
    Ok(handle)
}

#[cfg_attr(not(feature = "app"), allow(dead_code))]
fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic"
    }
}
