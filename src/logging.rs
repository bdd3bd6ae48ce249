use tracing_subscriber::filter::LevelFilter;

/// Installs the global fmt subscriber for embedding hosts.
///
/// Library code only emits `tracing` events; hosts that already install
/// their own subscriber should skip this.
pub fn init() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();
}

/// Same as [`init`] but tolerates an already-installed subscriber, which
/// makes it safe to call from multiple tests.
pub fn try_init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .try_init();
}
