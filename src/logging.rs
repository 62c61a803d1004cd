use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter, e.g. `TIDY_TREE_LOG=debug`.
pub const LOG_ENV: &str = "TIDY_TREE_LOG";

/// Installs the global tracing subscriber, writing diagnostics to stderr.
///
/// `verbosity` is the number of `-v` flags: warnings only by default, then
/// info, debug and trace. `TIDY_TREE_LOG` takes precedence when set.
pub fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("tidy_tree={level}")));

    // Ignore the error if a subscriber is already installed (tests, embedding).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
