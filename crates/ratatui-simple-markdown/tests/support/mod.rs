use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

static TEST_SETUP: Once = Once::new();

/// Installs a test-writer subscriber once per test binary; `RUST_LOG` overrides the `trace` default.
pub fn init_test_logging() {
    TEST_SETUP.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
    });
}
