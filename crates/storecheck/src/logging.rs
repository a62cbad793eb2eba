//! `tracing` subscriber setup.
//!
//! Output goes to stderr so JSON written to stdout stays clean. `RUST_LOG`
//! overrides the verbosity-derived filter.

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One compact line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Filter directive for a verbosity level
///
/// 0 shows warnings, 1 (`-v`) shows the per-page and per-product narration,
/// 2 and above show everything including skipped elements.
#[must_use]
pub const fn filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,chromiumoxide=error",
        1 => "info,chromiumoxide=warn",
        2 => "debug,chromiumoxide=info",
        _ => "trace",
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init_tracing(verbosity: u8, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .with_level(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_levels() {
        assert!(filter_for(0).starts_with("warn"));
        assert!(filter_for(1).starts_with("info"));
        assert!(filter_for(2).starts_with("debug"));
        assert_eq!(filter_for(9), "trace");
    }

    #[test]
    fn test_filters_parse() {
        for level in 0..4 {
            assert!(EnvFilter::try_new(filter_for(level)).is_ok());
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(0, LogFormat::Compact);
        init_tracing(2, LogFormat::Json);
    }
}
