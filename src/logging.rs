use tracing_subscriber::EnvFilter;

/// Initialize tracing for the binaries.
///
/// Defaults to `info` for this crate and `warn` elsewhere, `RUST_LOG` overrides it.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,ncd_classifier=info,evaluate=info"));

    // a second initialisation (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
