pub mod api;
pub mod availability;
pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod models;
pub mod patients;
pub mod profile;
pub mod queue;
pub mod validation;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the built-in
/// filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("MedPortal starting v{}", config::APP_VERSION);
    }
}
