use tracing::Level;

/// Install a fmt subscriber at the given level.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
