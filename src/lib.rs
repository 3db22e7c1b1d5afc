pub mod care_state;
pub mod config;
pub mod daily_status;
pub mod db;
pub mod dose_log;
pub mod inventory;
pub mod models;
pub mod requests;
pub mod roster;
pub mod seed;
pub mod services;
pub mod session;

pub use care_state::{CareError, CareSnapshot, CareState};
pub use session::{Notice, PillCareSession, SessionError};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if result.is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
