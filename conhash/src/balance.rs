//! Reports how evenly a ring spreads keys across its nodes

use conhash_core::order::natural_cmp;
use owo_colors::OwoColorize;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::ReportError;

/// A change in share smaller than this many points is just noise
const NOISE_POINTS: f64 = 0.5;

/// Print a nodes share of keys with colors
macro_rules! print_share {
    ($name:expr, $prior:expr, $current:expr) => {
        // get how many points this nodes share moved
        let change = $current - $prior;
        let diff = if change.abs() <= NOISE_POINTS {
            format!("{:+.2} pts", change).bright_blue().to_string()
        } else if change > 0.0 {
            // this node is running hotter then before
            format!("{:+.2} pts", change).bright_red().to_string()
        } else {
            format!("{:+.2} pts", change).bright_green().to_string()
        };
        // print our share and the change
        println!("{}: {:.2}% ({})", $name, $current, diff);
    };
}

/// The number of keys a single node owned
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct NodeShare {
    /// The node these keys landed on
    pub node: String,
    /// The number of keys this node owned
    pub hits: u64,
}

/// How a run of keys was spread across a ring
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct BalanceReport {
    /// The total number of keys placed on a node
    pub total: u64,
    /// The number of keys that found no node
    pub unplaced: u64,
    /// Each nodes hits in natural node order
    pub shares: Vec<NodeShare>,
}

impl BalanceReport {
    /// Get the percent of placed keys a node owned
    ///
    /// # Arguments
    ///
    /// * `node` - The node to get the share for
    pub fn share(&self, node: &str) -> Option<f64> {
        // no placed keys means no node has a share
        if self.total == 0 {
            return None;
        }
        self.shares
            .iter()
            .find(|share| share.node == node)
            .map(|share| share.hits as f64 * 100.0 / self.total as f64)
    }

    /// Get the gap in points between the busiest and idlest nodes
    pub fn spread(&self) -> f64 {
        let mut hits = self.shares.iter().map(|share| share.hits);
        // get the first node to seed our min and max
        let Some(first) = hits.next() else {
            return 0.0;
        };
        let (min, max) = hits.fold((first, first), |(min, max), hit| {
            (min.min(hit), max.max(hit))
        });
        (max - min) as f64 * 100.0 / self.total as f64
    }
}

/// Tracks which node each key in a run lands on
pub struct Balance {
    /// The number of keys each node owned this run
    hits: HashMap<String, u64>,
    /// The number of keys that found no node
    unplaced: u64,
    /// The path to write our report to
    path: PathBuf,
    /// The report from the last saved run
    prior: Option<BalanceReport>,
}

impl Balance {
    /// Create a new balance tracker and load the last report from disk if it exists
    ///
    /// # Arguments
    ///
    /// * `path` - The path to load and save reports at
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        // try to load our last report from disk
        let prior = Self::load(path.as_ref())?;
        Ok(Balance {
            hits: HashMap::new(),
            unplaced: 0,
            path: path.as_ref().to_path_buf(),
            prior,
        })
    }

    /// Load a report from disk if one exists
    ///
    /// # Arguments
    ///
    /// * `path` - The path to load a report from
    fn load(path: &Path) -> Result<Option<BalanceReport>, ReportError> {
        // check if we have a prior report
        if !path.try_exists()? {
            return Ok(None);
        }
        // load our prior report from disk
        let raw = std::fs::read(path)?;
        // copy it into an aligned buffer so it can be accessed
        let mut buff = AlignedVec::<16>::with_capacity(raw.len());
        buff.extend_from_slice(&raw);
        // unarchive our report
        let archive = rkyv::access::<ArchivedBalanceReport, rkyv::rancor::Error>(&buff[..])?;
        // deserialize our prior report
        let prior = rkyv::deserialize::<BalanceReport, rkyv::rancor::Error>(archive)?;
        Ok(Some(prior))
    }

    /// Get the report from the last saved run
    pub fn prior(&self) -> Option<&BalanceReport> {
        self.prior.as_ref()
    }

    /// Record which node a key landed on
    ///
    /// # Arguments
    ///
    /// * `node` - The node that owns this key if the ring had any
    pub fn record(&mut self, node: Option<&str>) {
        match node {
            Some(node) => match self.hits.get_mut(node) {
                Some(hits) => *hits += 1,
                None => {
                    self.hits.insert(node.to_owned(), 1);
                }
            },
            None => self.unplaced += 1,
        }
    }

    /// Build a report from the keys recorded so far
    pub fn report(&self) -> BalanceReport {
        let mut shares = self
            .hits
            .iter()
            .map(|(node, hits)| NodeShare {
                node: node.clone(),
                hits: *hits,
            })
            .collect::<Vec<NodeShare>>();
        shares.sort_by(|left, right| natural_cmp(&left.node, &right.node));
        BalanceReport {
            total: self.hits.values().sum(),
            unplaced: self.unplaced,
            shares,
        }
    }

    /// Print a report and how it differs from our prior report
    ///
    /// # Arguments
    ///
    /// * `report` - The report to print
    pub fn print(&self, report: &BalanceReport) {
        for share in &report.shares {
            let current = report.share(&share.node).unwrap_or_default();
            // if we have prior results then also log the difference
            match self.prior.as_ref().map(|prior| prior.share(&share.node)) {
                Some(prior) => {
                    print_share!(share.node, prior.unwrap_or_default(), current);
                }
                None => println!("{}: {:.2}%", share.node, current),
            }
        }
        // nodes that are gone have nothing to compare against
        if let Some(prior) = &self.prior {
            for gone in prior
                .shares
                .iter()
                .filter(|old| !report.shares.iter().any(|new| new.node == old.node))
            {
                println!("{}: {}", gone.node, "removed".bright_yellow());
            }
        }
        println!("spread: {:.2} pts", report.spread());
        if report.unplaced > 0 {
            println!("unplaced: {}", report.unplaced.bright_red());
        }
    }

    /// Build our report, print it, and write it to disk if needed
    ///
    /// # Arguments
    ///
    /// * `write` - Whether to save this report for future runs
    pub fn finish(&self, write: bool) -> Result<BalanceReport, ReportError> {
        // build and print our report
        let report = self.report();
        self.print(&report);
        // write a new report to disk if requested
        if write {
            // serialize our latest report
            let archived = rkyv::to_bytes::<rkyv::rancor::Error>(&report)?;
            // write our archived report to disk
            std::fs::write(&self.path, archived)?;
        }
        Ok(report)
    }
}
