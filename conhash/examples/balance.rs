//! Places a run of keys on a ring and reports how evenly they spread

use clap::Parser;
use conhash::args::Args;
use conhash::balance::Balance;
use conhash::{trace, Conf, ConsistentHash};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // get our command line args
    let args = Args::parse();
    // load our config
    let conf = Conf::new(&args.conf)?;
    // setup tracing
    trace::setup(&conf)?;
    // build our ring
    let ring = ConsistentHash::from_conf(&conf)?;
    info!(
        nodes = ring.get_nodes_cnt(),
        vnodes = ring.vnode_count(),
        "built ring"
    );
    // build the keys we are going to place
    let keys = (0..args.keys)
        .map(|i| format!("object-{i}"))
        .collect::<Vec<String>>();
    // place our keys and track where they land
    let mut balance = Balance::new(&args.report)?;
    for key in &keys {
        balance.record(ring.get_node(key));
    }
    balance.finish(args.write)?;
    // check how many keys a new node would take if asked
    if let Some(node) = args.add {
        let mut grown = ring.clone();
        grown.add_nodes(node.as_str())?;
        let moved = ConsistentHash::diff(&ring, &grown, &keys);
        println!(
            "adding {} moves {} of {} keys ({:.2}%)",
            node,
            moved.len(),
            keys.len(),
            moved.len() as f64 * 100.0 / keys.len().max(1) as f64
        );
    }
    Ok(())
}
