//! Log setup for the gateway.

use clap::ValueEnum;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::{Error, ErrorDetails};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gateway=info,mutawwif_internal=info"))
}

/// Set up logging for the whole process. Must run before any `tracing` call.
pub fn setup_observability(log_format: LogFormat) -> Result<(), Error> {
    let base = tracing_subscriber::fmt::layer();
    let log_layer = match log_format {
        LogFormat::Pretty => base.boxed(),
        LogFormat::Json => base.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(log_layer.with_filter(default_env_filter()))
        .try_init()
        .map_err(|e| {
            Error::new_without_logging(ErrorDetails::AppState {
                message: format!("Failed to initialize logging: {e}"),
            })
        })
}
