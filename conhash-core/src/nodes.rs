//! The shapes nodes can be handed to a ring in
//!
//! Nodes may be given as a map of identifier to weight, a list of identifiers,
//! a single identifier, or nothing at all. Every shape is resolved into one
//! canonical list of `(identifier, weight)` pairs before a ring is touched.

use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

use crate::errors::RingError;

/// The weight a node gets when none is given
pub const DEFAULT_WEIGHT: u32 = 1;

/// The nodes to add to a ring
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeSpec {
    /// Nodes with explicit weights
    Weighted(Vec<(String, u32)>),
    /// Nodes that all get the default weight
    List(Vec<String>),
    /// A single node with the default weight
    Single(String),
    /// No nodes at all
    #[default]
    Empty,
}

impl NodeSpec {
    /// Build a weighted spec keeping the order nodes were given in
    ///
    /// # Arguments
    ///
    /// * `nodes` - The nodes and their weights
    pub fn weighted<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        NodeSpec::Weighted(
            nodes
                .into_iter()
                .map(|(name, weight)| (name.into(), weight))
                .collect(),
        )
    }

    /// Resolve this spec into a validated list of nodes and weights
    ///
    /// Nothing is returned unless every node in this spec is valid.
    pub fn resolve(self) -> Result<Vec<(String, u32)>, RingError> {
        // flatten every shape into node/weight pairs
        let resolved = match self {
            NodeSpec::Weighted(nodes) => nodes,
            NodeSpec::List(names) => names
                .into_iter()
                .map(|name| (name, DEFAULT_WEIGHT))
                .collect(),
            NodeSpec::Single(name) => vec![(name, DEFAULT_WEIGHT)],
            NodeSpec::Empty => Vec::new(),
        };
        // validate everything before handing it back
        for (name, weight) in &resolved {
            if name.is_empty() {
                return Err(RingError::invalid("node identifiers can not be empty"));
            }
            if *weight == 0 {
                return Err(RingError::invalid(format!(
                    "node {name} must have a positive weight"
                )));
            }
        }
        Ok(resolved)
    }
}

impl From<&str> for NodeSpec {
    fn from(name: &str) -> Self {
        NodeSpec::Single(name.to_owned())
    }
}

impl From<String> for NodeSpec {
    fn from(name: String) -> Self {
        NodeSpec::Single(name)
    }
}

impl<S: Into<String>> From<Vec<S>> for NodeSpec {
    fn from(names: Vec<S>) -> Self {
        NodeSpec::List(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for NodeSpec {
    fn from(names: [S; N]) -> Self {
        NodeSpec::List(names.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for NodeSpec {
    fn from(names: &[S]) -> Self {
        NodeSpec::List(names.iter().map(|name| name.as_ref().to_owned()).collect())
    }
}

impl<S: Into<String>> From<BTreeMap<S, u32>> for NodeSpec {
    fn from(nodes: BTreeMap<S, u32>) -> Self {
        NodeSpec::weighted(nodes)
    }
}

impl<S: Into<String>> From<HashMap<S, u32>> for NodeSpec {
    /// Hash maps have no stable order so nodes are sorted by identifier
    fn from(nodes: HashMap<S, u32>) -> Self {
        let mut nodes = nodes
            .into_iter()
            .map(|(name, weight)| (name.into(), weight))
            .collect::<Vec<(String, u32)>>();
        nodes.sort();
        NodeSpec::Weighted(nodes)
    }
}

impl<T: Into<NodeSpec>> From<Option<T>> for NodeSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(NodeSpec::Empty, Into::into)
    }
}

impl From<()> for NodeSpec {
    fn from(_: ()) -> Self {
        NodeSpec::Empty
    }
}

/// Describe the shape of a dynamic value for error messages
fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Pull a node identifier out of a dynamic value
fn identifier(value: Value) -> Result<String, RingError> {
    match value {
        Value::String(name) => Ok(name),
        other => Err(RingError::invalid(format!(
            "node identifiers must be strings, not {}",
            shape(&other)
        ))),
    }
}

impl TryFrom<Value> for NodeSpec {
    type Error = RingError;

    /// Validate a dynamically typed node spec
    ///
    /// # Arguments
    ///
    /// * `value` - A mapping, sequence, string, or null
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(NodeSpec::Empty),
            Value::String(name) => Ok(NodeSpec::Single(name)),
            Value::Sequence(items) => Ok(NodeSpec::List(
                items
                    .into_iter()
                    .map(identifier)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Value::Mapping(map) => {
                let mut nodes = Vec::with_capacity(map.len());
                for (name, weight) in map {
                    let name = identifier(name)?;
                    // weights must be positive integers that fit in a u32
                    let weight = weight
                        .as_u64()
                        .and_then(|weight| u32::try_from(weight).ok())
                        .ok_or_else(|| {
                            RingError::invalid(format!(
                                "weight for node {name} must be a positive integer"
                            ))
                        })?;
                    nodes.push((name, weight));
                }
                Ok(NodeSpec::Weighted(nodes))
            }
            other => Err(RingError::invalid(format!(
                "nodes must be a mapping, sequence, or string, not {}",
                shape(&other)
            ))),
        }
    }
}

/// The nodes to delete from a ring
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeList(pub Vec<String>);

impl<S: Into<String>> From<Vec<S>> for NodeList {
    fn from(names: Vec<S>) -> Self {
        NodeList(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for NodeList {
    fn from(names: [S; N]) -> Self {
        NodeList(names.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for NodeList {
    fn from(names: &[S]) -> Self {
        NodeList(names.iter().map(|name| name.as_ref().to_owned()).collect())
    }
}

impl TryFrom<Value> for NodeList {
    type Error = RingError;

    /// Validate a dynamically typed list of nodes to delete
    ///
    /// # Arguments
    ///
    /// * `value` - A sequence of node identifiers
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Sequence(items) => Ok(NodeList(
                items
                    .into_iter()
                    .map(identifier)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            other => Err(RingError::invalid(format!(
                "nodes to delete must be a sequence, not {}",
                shape(&other)
            ))),
        }
    }
}
