use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{warn, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const ENV_LOG_FILE: &str = "LOG_FILE";
pub const DEFAULT_LOG_FILE: &str = "chat.log";

const DEFAULT_FILTER: &str = "info,yagpt_relay=debug";

/// Initialize logging to stdout and, when it can be opened, an append-mode log file.
/// Reads `RUST_LOG` and `LOG_FILE`, so load `.env` before calling.
pub fn init() -> Result<()> {
    let log_path = std::env::var(ENV_LOG_FILE).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file = if log_path.is_empty() {
        Ok(None)
    } else {
        open_log_file(Path::new(&log_path)).map(Some)
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    match file {
        Ok(Some(file)) => {
            registry.with(file_layer(file)).try_init()?;
        }
        Ok(None) => {
            registry.try_init()?;
        }
        Err(e) => {
            registry.try_init()?;
            warn!("Cannot open log file {}: {}; logging to stdout only", log_path, e);
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Plain-text layer for the log file; colors stay on the console only.
fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_log(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "yagpt-relay-{}-{}.log",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_log_file_is_appended() {
        let path = temp_log("append");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unwritable_log_path_errors() {
        assert!(open_log_file(Path::new("/nonexistent-dir/chat.log")).is_err());
    }

    #[test]
    fn test_log_file_has_no_color_codes() {
        let path = temp_log("plain");
        let subscriber =
            tracing_subscriber::registry().with(file_layer(open_log_file(&path).unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("relay failed for chat {}", 42);
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("relay failed for chat 42"));
        assert!(content.contains("WARN"));
        assert!(!content.contains('\u{1b}'));
        std::fs::remove_file(&path).unwrap();
    }
}
