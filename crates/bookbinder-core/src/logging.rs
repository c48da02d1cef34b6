use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install a stderr `fmt` subscriber.
///
/// `BOOKBINDER_LOG` overrides `default_filter`. Returns false when a global
/// subscriber is already set.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = std::env::var("BOOKBINDER_LOG").unwrap_or_else(|_| default_filter.to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(EnvFilter::new(filter))
        .try_init()
        .is_ok()
}
