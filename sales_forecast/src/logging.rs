//! Tracing setup for the binaries
//!
//! Logs go to stderr so stdout stays reserved for machine-readable output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "SALES_FORECAST_LOG_JSON";
const DEFAULT_FILTER: &str = "sales_forecast=info,forest_math=info,warn";

/// Install the global subscriber.
///
/// `RUST_LOG` controls filtering; `SALES_FORECAST_LOG_JSON=1` emits JSON lines.
/// Calling this more than once is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };

    // Already installed by an embedding process
    let _ = result;
}
