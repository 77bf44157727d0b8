use conhash::balance::{Balance, NodeShare};
use conhash::{ConsistentHash, ReportError};
use std::path::PathBuf;

/// Build a unique path for a report in this test
fn report_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("conhash-{name}-{}.rkyv", std::process::id()));
    // clear out anything left from an older run
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn reports_count_hits_in_natural_order() {
    let path = report_path("order");
    let mut balance = Balance::new(&path).unwrap();
    assert!(balance.prior().is_none());
    for node in ["10.0.0.10", "10.0.0.9", "10.0.0.10", "10.0.0.10"] {
        balance.record(Some(node));
    }
    balance.record(None);
    let report = balance.finish(false).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.unplaced, 1);
    assert_eq!(
        report.shares,
        vec![
            NodeShare {
                node: "10.0.0.9".to_owned(),
                hits: 1
            },
            NodeShare {
                node: "10.0.0.10".to_owned(),
                hits: 3
            },
        ]
    );
    assert_eq!(report.share("10.0.0.10"), Some(75.0));
    assert_eq!(report.share("10.0.0.11"), None);
    assert_eq!(report.spread(), 50.0);
    // nothing is written unless asked
    assert!(!path.exists());
}

#[test]
fn written_reports_become_the_next_prior() {
    let path = report_path("prior");
    let ring = ConsistentHash::with_nodes(vec!["a", "b", "c"]).unwrap();
    let mut first = Balance::new(&path).unwrap();
    for i in 0..1000 {
        first.record(ring.get_node(format!("object-{i}")));
    }
    let written = first.finish(true).unwrap();
    assert_eq!(written.total, 1000);
    // a new run loads the report we just wrote
    let mut second = Balance::new(&path).unwrap();
    assert_eq!(second.prior(), Some(&written));
    second.record(ring.get_node("object-0"));
    let report = second.finish(false).unwrap();
    assert_eq!(report.total, 1);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn corrupt_reports_are_an_error() {
    let path = report_path("corrupt");
    std::fs::write(&path, b"not a report").unwrap();
    assert!(matches!(Balance::new(&path), Err(ReportError::Rkyv(_))));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn empty_runs_have_no_shares() {
    let balance = Balance::new(report_path("empty")).unwrap();
    let report = balance.report();
    assert_eq!(report.total, 0);
    assert_eq!(report.share("a"), None);
    assert_eq!(report.spread(), 0.0);
}
