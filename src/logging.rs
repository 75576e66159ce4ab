//! Logging setup and shared status icons.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix for successful steps.
pub const SUCCESS_ICON: &str = "✅";

/// Prefix for failures and missing configuration.
pub const ERROR_ICON: &str = "❌";

/// Prefix for waiting, retrying and fallback steps.
pub const WAIT_ICON: &str = "⏳";

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "chat_completion=info";

/// Install a `tracing` subscriber that writes formatted events to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to `chat_completion=info`.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
