use once_cell::sync::OnceCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging at `info`, or `debug` when enabled in the settings.
/// `RUST_LOG` is only honoured together with debug logging. When `file` is
/// given, output is mirrored into it.
pub fn init(debug: bool, file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let Some(path) = file else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        return;
    };

    let Some((dir, name)) = file_target(&path) else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        return;
    };
    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
}

/// Directory and file name of a log path. `None` when the path names no file.
fn file_target(path: &Path) -> Option<(PathBuf, OsString)> {
    let name = path.file_name()?.to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_logs_into_working_dir() {
        assert_eq!(
            file_target(Path::new("widgetopia.log")),
            Some((PathBuf::from("."), OsString::from("widgetopia.log")))
        );
        assert_eq!(
            file_target(Path::new("/var/log/widgetopia.log")),
            Some((PathBuf::from("/var/log"), OsString::from("widgetopia.log")))
        );
    }

    #[test]
    fn paths_without_a_file_name_are_rejected() {
        assert_eq!(file_target(Path::new("/")), None);
        assert_eq!(file_target(Path::new("logs/..")), None);
    }
}
