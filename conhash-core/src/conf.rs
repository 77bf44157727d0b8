//! The config for a consistent hash ring

use config::{Config, ConfigError, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::digest::DigestKind;
use crate::nodes::{NodeSpec, DEFAULT_WEIGHT};
use crate::ring::DEFAULT_INTERLEAVE;

/// Help serde default the number of replica seeds per unit of weight
fn default_interleave() -> u32 {
    DEFAULT_INTERLEAVE
}

/// Help serde default a nodes weight
fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

/// The settings for placing nodes on the ring
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RingSettings {
    /// The number of replica seeds per unit of node weight
    #[serde(default = "default_interleave")]
    pub interleave: u32,
    /// The digest used to place nodes and keys
    #[serde(default)]
    pub digest: DigestKind,
}

impl Default for RingSettings {
    /// Builds the default ring settings
    fn default() -> Self {
        RingSettings {
            interleave: default_interleave(),
            digest: DigestKind::default(),
        }
    }
}

/// A node to place on the ring at startup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    /// The identifier for this node
    pub name: String,
    /// This nodes relative capacity
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// The different levels to log tracing info at
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub enum TraceLevel {
    /// Log everything include high verbosity low priority info
    #[serde(alias = "trace")]
    Trace,
    /// Log low priority debug infomation and up
    #[serde(alias = "debug")]
    Debug,
    /// Log standard priority information and up
    #[default]
    #[serde(alias = "info")]
    Info,
    /// Log only warning and Errors
    #[serde(alias = "warn")]
    Warn,
    /// Log only errors
    #[serde(alias = "error")]
    Error,
    /// Do not log anything
    #[serde(alias = "off")]
    Off,
}

impl TraceLevel {
    /// Convert this [`TraceLevel`] to a [`LevelFilter`]
    pub fn to_filter(&self) -> LevelFilter {
        match self {
            TraceLevel::Trace => LevelFilter::TRACE,
            TraceLevel::Debug => LevelFilter::DEBUG,
            TraceLevel::Info => LevelFilter::INFO,
            TraceLevel::Warn => LevelFilter::WARN,
            TraceLevel::Error => LevelFilter::ERROR,
            TraceLevel::Off => LevelFilter::OFF,
        }
    }
}

/// The tracing settings for a ring
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracing {
    // The level to log traces at
    #[serde(default)]
    pub level: TraceLevel,
}

/// The config for building a ring
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Conf {
    /// The ring placement settings to use
    #[serde(default)]
    pub ring: RingSettings,
    /// The nodes to start the ring with
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    /// The tracing settings to use
    #[serde(default)]
    pub tracing: Tracing,
}

impl Conf {
    /// Build a config from our environment and a config file
    ///
    /// Environment variables look like `CONHASH_RING__INTERLEAVE`.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the config file, it does not need to exist
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        // build our config sources
        let conf = Config::builder()
            // start with the settings in our config file
            .add_source(config::File::with_name(path).required(false))
            // overlay our env vars on top
            .add_source(
                config::Environment::with_prefix("conhash")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        conf.try_deserialize()
    }

    /// Build a config from a yaml string
    ///
    /// # Arguments
    ///
    /// * `raw` - The yaml to parse
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(config::File::from_str(raw, FileFormat::Yaml))
            .build()?;
        conf.try_deserialize()
    }

    /// Get the nodes to start a ring with
    pub fn node_spec(&self) -> NodeSpec {
        // an empty node list is an empty ring
        if self.nodes.is_empty() {
            return NodeSpec::Empty;
        }
        NodeSpec::weighted(
            self.nodes
                .iter()
                .map(|entry| (entry.name.clone(), entry.weight)),
        )
    }
}
