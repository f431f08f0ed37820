//! healthdash - Derived-metrics engine for a personal health dashboard
//!
//! healthdash turns raw health samples (step counts, body weight, active energy
//! and staged sleep intervals) into the series a dashboard charts: per-day
//! rollups, weekday averages, weekday-averaged weight changes and nightly sleep
//! scores. All calendar math runs against one explicit fixed-offset
//! [`Calendar`].
//!
//! ## Modules
//!
//! - **Derivations**: `aggregate`, `rollup`, `sleep`, `selection`
//! - **Data boundary**: `store` (health-source trait and in-memory snapshot), `input`
//! - **Dashboard**: `pipeline` and `config`, plus C bindings in `ffi`

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod rollup;
pub mod selection;
pub mod sleep;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregate::{average, average_by_weekday, daily_differentials, differences};
pub use calendar::{Calendar, DateInterval};
pub use config::DashboardConfig;
pub use error::{ComputeError, HealthStoreError};
pub use input::parse_metric_value;
pub use pipeline::{dashboard_to_json, DashboardProcessor, DashboardSeries};
pub use selection::{find_by_calendar_day, select_by_cumulative_value};
pub use sleep::score_nights;
pub use store::{HealthSnapshot, HealthStore, SnapshotStore};
pub use types::{ChartPoint, HealthMetricKind, NightScore, Sample, SleepInterval, SleepStage, WeekdayPoint};

/// healthdash version reported by the CLI and FFI layer
pub const HEALTHDASH_VERSION: &str = env!("CARGO_PKG_VERSION");
