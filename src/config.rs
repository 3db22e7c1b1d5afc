use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "PillCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Capacity assumed by refills and stock bars when a medication has no total.
pub const DEFAULT_TOTAL_PILLS: u32 = 30;

/// Pills-remaining level at or below which a medication counts as low stock.
pub const DEFAULT_REFILL_THRESHOLD: u32 = 5;

/// Pills taken per day when the medication does not say.
pub const DEFAULT_DAILY_DOSAGE: u32 = 1;

/// Retries after the first failed insight call.
pub const INSIGHT_MAX_RETRIES: u32 = 3;

/// Linear backoff step between insight retries (1.5s, 3s, 4.5s).
pub const INSIGHT_BACKOFF_STEP: Duration = Duration::from_millis(1500);

/// Get the application data directory
/// ~/PillCare/ on all platforms, falling back to the working directory
/// when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// SQLite file holding the local snapshot slots and the medication collections.
pub fn snapshot_db_path() -> PathBuf {
    app_data_dir().join("pillcare.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,pillcare_lib=debug"
}
