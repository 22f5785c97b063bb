// Logging setup. All diagnostics go to stderr through tracing so the CSV
// output files stay untouched; --debug raises the default level.

use tracing_subscriber::EnvFilter;

// RUST_LOG wins when set, otherwise the --debug flag picks the level.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init so tests or embedding callers that already installed a subscriber don't panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
