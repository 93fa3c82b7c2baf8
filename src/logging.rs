// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Meant for binaries embedding the crate; calling it twice is a no-op.
pub fn init() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .try_init();
}

/// Subscriber writing through the test harness so output only shows for failures.
#[cfg(test)]
pub(crate) fn init_test() {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sp500data=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
