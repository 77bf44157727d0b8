//! The command line args for the balance tool

use clap::Parser;
use std::path::PathBuf;

/// Check how evenly a consistent hash ring spreads keys
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// The path to the config file for the ring
    #[clap(short, long, default_value = "conhash.yml")]
    pub conf: String,
    /// The number of keys to place on the ring
    #[clap(short, long, default_value_t = 100_000)]
    pub keys: usize,
    /// The path to load the prior balance report from
    #[clap(short, long, default_value = "balance.rkyv")]
    pub report: PathBuf,
    /// Save this run as the new balance report
    #[clap(short, long)]
    pub write: bool,
    /// A node to add afterwards to see how many keys it would take
    #[clap(short, long)]
    pub add: Option<String>,
}
