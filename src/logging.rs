use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Returns false when a subscriber was
/// already installed (tests, embedding applications), which is not an error.
pub fn init_tracing(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(target: "system", "Tracing initialized at '{}'", default_level);
    }
    installed
}

/// Convenience macros for common operations
#[macro_export]
macro_rules! trace_filter {
    ($active:expr, $derived:expr, $raw:expr) => {
        tracing::debug!(
            target: "filter",
            "Applied {} column filter(s): {} of {} rows remain",
            $active,
            $derived,
            $raw
        );
    };
}

#[macro_export]
macro_rules! trace_sort {
    ($column:expr, $ascending:expr, $rows:expr) => {
        tracing::debug!(
            target: "sort",
            "Sorted by '{}' {} ({} rows visible)",
            $column,
            if $ascending { "ASC" } else { "DESC" },
            $rows
        );
    };
}

#[macro_export]
macro_rules! trace_export {
    ($rows:expr, $format:expr) => {
        tracing::info!(target: "export", "Export requested: {} rows as {}", $rows, $format);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }
}
