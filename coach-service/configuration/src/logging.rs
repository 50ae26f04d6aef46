use tracing_subscriber::EnvFilter;

use crate::CoachConfig;

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over the
/// configured level; repeated calls are no-ops.
pub fn setup_logging(config: &CoachConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.logging.ansi)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(level = %config.logging.level, "logging initialized");
    }
}
