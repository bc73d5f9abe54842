//! Tracing setup shared by the service and the offline tools.
use std::{env, io::IsTerminal};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `LOG_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else the `LOG_LEVEL` env var, with
///   `ACQUISITION_LOG_LEVEL` and `JOIN_LOG_LEVEL` overriding it for the
///   offline tools' modules
///
/// Call once at startup, before any logging macros are invoked.
pub fn init_tracing() {
    // ---
    let span_events = match env::var("LOG_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = level_from_env("LOG_LEVEL", "info");
        let acquisition = level_from_env("ACQUISITION_LOG_LEVEL", level);
        let join = level_from_env("JOIN_LOG_LEVEL", level);
        EnvFilter::new(filter_directives(level, acquisition, join))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}

/// Read a level name from `var`, falling back to `default` when unset or unknown.
fn level_from_env(var: &str, default: &'static str) -> &'static str {
    parse_level(env::var(var).ok().as_deref()).unwrap_or(default)
}

fn parse_level(value: Option<&str>) -> Option<&'static str> {
    match value {
        Some("trace") => Some("trace"),
        Some("debug") => Some("debug"),
        Some("info") => Some("info"),
        Some("warn") => Some("warn"),
        Some("error") => Some("error"),
        _ => None,
    }
}

/// Default filter: one global level, per-module levels for the offline
/// tools, and quieter HTTP client internals.
fn filter_directives(level: &str, acquisition: &str, join: &str) -> String {
    format!(
        "{level},seismic_impact::acquisition={acquisition},\
         seismic_impact::join={join},hyper=warn,reqwest=warn"
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_level() {
        // ---
        assert_eq!(parse_level(Some("debug")), Some("debug"));
        assert_eq!(parse_level(Some("loud")), None);
        assert_eq!(parse_level(None), None);
    }

    #[test]
    fn test_filter_directives_per_module() {
        // ---
        let directives = filter_directives("info", "debug", "warn");
        assert_eq!(
            directives,
            "info,seismic_impact::acquisition=debug,seismic_impact::join=warn,hyper=warn,reqwest=warn"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
