use std::io;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let layer = if json {
        fmt::Layer::new()
            .with_writer(io::stderr)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        fmt::Layer::new()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
