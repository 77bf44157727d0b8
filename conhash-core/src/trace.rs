//! Enables trace logging for rings to stdout

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::Layer as LayerFmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::conf::{Conf, Tracing};
use crate::errors::RingError;

/// Setup local tracing to stdout
fn setup_local(conf: &Tracing) -> Filtered<LayerFmt<Registry>, LevelFilter, Registry> {
    tracing_subscriber::fmt::layer().with_filter(conf.level.to_filter())
}

/// Setup basic tracing
///
/// This fails if a global subscriber was already installed.
///
/// # Arguments
///
/// * `conf` - The config to pull our trace level from
pub fn setup(conf: &Conf) -> Result<(), RingError> {
    // setup our local tracer
    let local = setup_local(&conf.tracing);
    // setup our registry
    tracing_subscriber::registry().with(local).try_init()?;
    Ok(())
}
