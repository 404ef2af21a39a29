use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset or cannot be parsed.
pub const DEFAULT_FILTER: &str = "inkpress=debug,tower_http=info,info";

/// Initializes the global tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing_subscriber() {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();
}
