use std::collections::{BTreeMap, HashMap};

use conhash_core::{ConsistentHash, DigestKind, NodeList, NodeSpec, RingError, Xxh3Digest};

const OBJECTS: usize = 10_000;

/// The memcached style nodes used across these tests
fn memcached_nodes() -> BTreeMap<&'static str, u32> {
    BTreeMap::from([
        ("192.168.0.101:11212", 1),
        ("192.168.0.102:11212", 1),
        ("192.168.0.103:11212", 1),
        ("192.168.0.104:11212", 1),
    ])
}

/// Build the keys we place on our rings
fn objects() -> Vec<String> {
    (0..OBJECTS).map(|i| format!("object-{i}")).collect()
}

/// Count the share of keys each node gets as a percent
fn shares(ring: &ConsistentHash, keys: &[String]) -> HashMap<String, f64> {
    let mut hits: HashMap<String, usize> = HashMap::new();
    for key in keys {
        let node = ring.get_node(key).expect("ring should not be empty");
        *hits.entry(node.to_owned()).or_default() += 1;
    }
    hits.into_iter()
        .map(|(node, count)| (node, count as f64 * 100.0 / keys.len() as f64))
        .collect()
}

/// Make sure each node got about the share of keys we expect
fn assert_shares(shares: &HashMap<String, f64>, expected: &[(&str, f64)], tolerance: f64) {
    assert_eq!(shares.len(), expected.len(), "unexpected nodes in {shares:?}");
    for (node, want) in expected {
        let got = shares
            .get(*node)
            .unwrap_or_else(|| panic!("{node} got no keys"));
        assert!(
            (got - want).abs() <= tolerance,
            "{node} got {got:.2}% of keys, expected {want}% +/- {tolerance}"
        );
    }
}

/// Make sure the ring store is sorted and matches its owner map
fn assert_invariants(ring: &ConsistentHash) {
    let (keys, owners) = ring.store().snapshot();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(keys.len(), owners.len());
    assert!(keys.iter().all(|key| owners.contains_key(key)));
    assert!(owners.values().all(|owner| ring.contains(owner)));
}

#[test]
fn equal_weights_split_keys_evenly() {
    let ring = ConsistentHash::options()
        .interleave(1000)
        .build(memcached_nodes())
        .unwrap();
    assert_invariants(&ring);
    assert_eq!(ring.vnode_count(), 16_000);
    assert_shares(
        &shares(&ring, &objects()),
        &[
            ("192.168.0.101:11212", 25.0),
            ("192.168.0.102:11212", 25.0),
            ("192.168.0.103:11212", 25.0),
            ("192.168.0.104:11212", 25.0),
        ],
        4.0,
    );
}

#[test]
fn empty_ring_fills_after_adding_nodes() {
    let mut ring = ConsistentHash::options().interleave(1000).build(()).unwrap();
    let keys = objects();
    assert!(keys.iter().all(|key| ring.get_node(key).is_none()));
    assert_eq!(ring.add_nodes(memcached_nodes()).unwrap(), 4);
    assert_shares(
        &shares(&ring, &keys),
        &[
            ("192.168.0.101:11212", 25.0),
            ("192.168.0.102:11212", 25.0),
            ("192.168.0.103:11212", 25.0),
            ("192.168.0.104:11212", 25.0),
        ],
        4.0,
    );
}

#[test]
fn adding_a_node_takes_an_even_share() {
    let mut ring = ConsistentHash::options()
        .interleave(1000)
        .build(memcached_nodes())
        .unwrap();
    ring.add_nodes(BTreeMap::from([("192.168.0.105:11212", 1)]))
        .unwrap();
    assert_invariants(&ring);
    assert_shares(
        &shares(&ring, &objects()),
        &[
            ("192.168.0.101:11212", 20.0),
            ("192.168.0.102:11212", 20.0),
            ("192.168.0.103:11212", 20.0),
            ("192.168.0.104:11212", 20.0),
            ("192.168.0.105:11212", 20.0),
        ],
        3.0,
    );
}

#[test]
fn deleting_nodes_splits_their_keys() {
    let mut ring = ConsistentHash::options()
        .interleave(1000)
        .build(memcached_nodes())
        .unwrap();
    assert_eq!(
        ring.del_nodes(["192.168.0.102:11212", "192.168.0.104:11212"]),
        2
    );
    assert_invariants(&ring);
    assert_eq!(ring.vnode_count(), 8_000);
    assert_shares(
        &shares(&ring, &objects()),
        &[("192.168.0.101:11212", 50.0), ("192.168.0.103:11212", 50.0)],
        2.0,
    );
}

#[test]
fn weights_control_key_share() {
    let ring = ConsistentHash::options()
        .interleave(1000)
        .build(BTreeMap::from([("alpha", 1), ("beta", 2), ("gamma", 1)]))
        .unwrap();
    assert_shares(
        &shares(&ring, &objects()),
        &[("alpha", 25.0), ("beta", 50.0), ("gamma", 25.0)],
        4.0,
    );
}

#[test]
fn xxh3_rings_balance_too() {
    let ring = ConsistentHash::options()
        .interleave(1000)
        .digest(Xxh3Digest)
        .build(memcached_nodes())
        .unwrap();
    assert_shares(
        &shares(&ring, &objects()),
        &[
            ("192.168.0.101:11212", 25.0),
            ("192.168.0.102:11212", 25.0),
            ("192.168.0.103:11212", 25.0),
            ("192.168.0.104:11212", 25.0),
        ],
        4.0,
    );
}

#[test]
fn adding_a_node_only_moves_keys_to_it() {
    let old = ConsistentHash::with_nodes(memcached_nodes()).unwrap();
    let mut new = old.clone();
    new.add_nodes("192.168.0.105:11212").unwrap();
    let moved = ConsistentHash::diff(&old, &new, objects());
    assert_eq!(moved.len(), 2153);
    assert!(moved
        .iter()
        .all(|migration| migration.to.as_deref() == Some("192.168.0.105:11212")));
}

#[test]
fn removing_a_node_only_moves_its_keys() {
    let old = ConsistentHash::with_nodes(memcached_nodes()).unwrap();
    let mut new = old.clone();
    new.del_nodes(["192.168.0.103:11212"]);
    let moved = ConsistentHash::diff(&old, &new, objects());
    assert!(!moved.is_empty());
    for migration in &moved {
        assert_eq!(migration.from.as_deref(), Some("192.168.0.103:11212"));
        assert_ne!(migration.to.as_deref(), Some("192.168.0.103:11212"));
    }
}

#[test]
fn add_then_delete_restores_every_owner() {
    let keys = objects();
    let mut ring = ConsistentHash::with_nodes(memcached_nodes()).unwrap();
    let before = ring.clone();
    ring.add_nodes("192.168.0.105:11212").unwrap();
    ring.del_nodes(["192.168.0.105:11212"]);
    assert_invariants(&ring);
    assert!(ConsistentHash::diff(&before, &ring, &keys).is_empty());
    assert_eq!(ring.store().snapshot().0, before.store().snapshot().0);
}

#[test]
fn lookups_are_deterministic_across_rings() {
    let first = ConsistentHash::with_nodes(memcached_nodes()).unwrap();
    let second = ConsistentHash::with_nodes(memcached_nodes()).unwrap();
    for key in objects().iter().take(1000) {
        assert_eq!(first.get_node(key), second.get_node(key));
        assert_eq!(first.get_node(key), first.get_node(key));
    }
}

#[test]
fn regression_fixture_is_stable() {
    // changing any of these is a breaking change to placement
    let samples = [
        ("35132097", "E"),
        ("25291004", "D"),
        ("48182416", "F"),
        ("45818378", "H"),
        ("52733021", "A"),
        ("94027025", "B"),
        ("18116713", "F"),
        ("75531098", "J"),
        ("99011825", "F"),
        ("99371754", "A"),
        ("19630740", "D"),
        ("87823770", "G"),
        ("32160063", "A"),
        ("28054420", "E"),
        ("75904283", "H"),
        ("08458048", "E"),
        ("51583844", "I"),
        ("16226754", "B"),
        ("95450503", "J"),
        ("47557476", "C"),
        ("38808589", "A"),
    ];
    let ring =
        ConsistentHash::with_nodes(vec!["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]).unwrap();
    assert_eq!(ring.vnode_count(), 1600);
    assert_eq!(ring.gen_key("35132097"), 2_187_580_785);
    for (input, output) in samples {
        assert_eq!(ring.get_node(input), Some(output), "key {input}");
    }
}

#[test]
fn keys_past_the_last_vnode_wrap_to_the_first() {
    let ring =
        ConsistentHash::with_nodes(vec!["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]).unwrap();
    let (keys, owners) = ring.store().snapshot();
    assert_eq!(keys[0], 267_462);
    assert_eq!(*keys.last().unwrap(), 4_289_633_845);
    assert_eq!(&*owners[&keys[0]], "G");
    for wrapping in ["wrap-815", "wrap-1319", "wrap-2391"] {
        assert!(ring.gen_key(wrapping) > 4_289_633_845);
        assert_eq!(ring.get_node_pos(wrapping), Some(0));
        assert_eq!(ring.get_node(wrapping), Some("G"));
    }
    // keys before the first vnode land on it without wrapping
    assert!(ring.gen_key("edge-26144") < 267_462);
    assert_eq!(ring.get_node("edge-26144"), Some("G"));
}

#[test]
fn nodes_list_in_natural_order() {
    let mut ring = ConsistentHash::with_nodes(vec![
        "192.168.0.104:11212",
        "192.168.0.9:11212",
        "192.168.0.101:11212",
    ])
    .unwrap();
    ring.add_nodes("192.168.0.10:11212").unwrap();
    assert_eq!(ring.get_nodes_cnt(), 4);
    assert_eq!(
        ring.get_all_nodes(),
        vec![
            "192.168.0.9:11212",
            "192.168.0.10:11212",
            "192.168.0.101:11212",
            "192.168.0.104:11212",
        ]
    );
}

#[test]
fn dynamic_specs_are_validated_before_mutation() {
    let mut ring = ConsistentHash::with_nodes("a").unwrap();
    let bad: serde_yaml::Value = serde_yaml::from_str("{b: 1, c: nope}").unwrap();
    let err = NodeSpec::try_from(bad).and_then(|spec| ring.add_nodes(spec));
    assert!(matches!(err, Err(RingError::InvalidArgument(_))));
    assert_eq!(ring.get_all_nodes(), vec!["a"]);

    let good: serde_yaml::Value = serde_yaml::from_str("{b: 2, c: 1}").unwrap();
    assert_eq!(ring.add_nodes(NodeSpec::try_from(good).unwrap()).unwrap(), 2);
    assert_eq!(ring.weight("b"), Some(2));

    let not_a_list: serde_yaml::Value = serde_yaml::from_str("b").unwrap();
    assert!(matches!(
        NodeList::try_from(not_a_list),
        Err(RingError::InvalidArgument(_))
    ));
    let list: serde_yaml::Value = serde_yaml::from_str("[b, z]").unwrap();
    assert_eq!(ring.del_nodes(NodeList::try_from(list).unwrap()), 1);
    assert_eq!(ring.get_all_nodes(), vec!["a", "c"]);
}

#[test]
fn digest_kinds_change_placement() {
    let md5 = ConsistentHash::options()
        .shared_digest(DigestKind::Md5.build())
        .build(vec!["a", "b", "c"])
        .unwrap();
    let xxh3 = ConsistentHash::options()
        .shared_digest(DigestKind::Xxh3.build())
        .build(vec!["a", "b", "c"])
        .unwrap();
    assert_ne!(md5.gen_key("key"), xxh3.gen_key("key"));
    assert_ne!(md5.store().snapshot().0, xxh3.store().snapshot().0);
}
