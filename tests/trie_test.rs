//! Copy-on-write trie scenario tests.

use std::collections::HashMap;

use chalkdb::index::Trie;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The canonical three-version scenario: every snapshot keeps answering
/// with the state it was created from.
#[test]
fn test_three_versions() {
    let t1 = Trie::new().put(b"ab", 1u32);
    let t2 = t1.put(b"abc", 2);
    let t3 = t2.remove(b"ab");

    assert_eq!(t1.get(b"ab"), Some(&1));
    assert_eq!(t1.get(b"abc"), None);

    assert_eq!(t2.get(b"ab"), Some(&1));
    assert_eq!(t2.get(b"abc"), Some(&2));

    assert_eq!(t3.get(b"ab"), None);
    assert_eq!(t3.get(b"abc"), Some(&2));
}

/// A snapshot taken before a burst of mutations is never disturbed.
#[test]
fn test_snapshot_immutability() {
    let mut trie = Trie::new();
    for i in 0u32..50 {
        trie = trie.put(format!("key{i}").as_bytes(), i);
    }
    let snapshot = trie.clone();

    // Mutate heavily on top of the snapshot
    for i in 0u32..50 {
        if i % 2 == 0 {
            trie = trie.remove(format!("key{i}").as_bytes());
        } else {
            trie = trie.put(format!("key{i}").as_bytes(), i + 1000);
        }
    }

    // The snapshot still answers with the original values
    for i in 0u32..50 {
        assert_eq!(snapshot.get(format!("key{i}").as_bytes()), Some(&i));
    }

    // And the new version reflects the mutations
    for i in 0u32..50 {
        let expected = if i % 2 == 0 { None } else { Some(i + 1000) };
        assert_eq!(
            trie.get(format!("key{i}").as_bytes()).copied(),
            expected
        );
    }
}

/// Random put/remove workload checked against a HashMap model.
#[test]
fn test_random_ops_match_model() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut trie: Trie<u32> = Trie::new();
    let mut model: HashMap<Vec<u8>, u32> = HashMap::new();

    for _ in 0..2000 {
        // Short keys over a tiny alphabet force heavy prefix sharing
        let len = rng.gen_range(0..6);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..b'e')).collect();

        if rng.gen_bool(0.6) {
            let value = rng.gen::<u32>();
            trie = trie.put(&key, value);
            model.insert(key, value);
        } else {
            trie = trie.remove(&key);
            model.remove(&key);
        }
    }

    // The set of defined keys equals the set-theoretic result
    for (key, value) in &model {
        assert_eq!(trie.get(key), Some(value));
    }

    // Spot-check absent keys as well
    for _ in 0..500 {
        let len = rng.gen_range(0..6);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..b'e')).collect();
        assert_eq!(trie.get(&key), model.get(&key));
    }

    // Draining the model empties the trie
    for key in model.keys() {
        trie = trie.remove(key);
    }
    assert!(trie.is_empty());
}

/// Mixed value types via distinct tries (each trie is monomorphic).
#[test]
fn test_value_types() {
    let numbers = Trie::new().put(b"answer", 42u64);
    let strings = Trie::new().put(b"answer", String::from("forty-two"));

    assert_eq!(numbers.get(b"answer"), Some(&42));
    assert_eq!(strings.get(b"answer").map(String::as_str), Some("forty-two"));
}

/// Readers on old versions race-free while a writer derives new ones.
#[test]
fn test_concurrent_snapshot_readers() {
    use std::sync::Arc;
    use std::thread;

    let mut trie = Trie::new();
    for i in 0u32..100 {
        trie = trie.put(format!("k{i}").as_bytes(), i);
    }
    let snapshot = Arc::new(trie.clone());

    let mut handles = vec![];
    for _ in 0..4 {
        let snapshot = Arc::clone(&snapshot);
        handles.push(thread::spawn(move || {
            for i in 0u32..100 {
                assert_eq!(snapshot.get(format!("k{i}").as_bytes()), Some(&i));
            }
        }));
    }

    // Writer keeps deriving new versions meanwhile
    for i in 0u32..100 {
        trie = trie.remove(format!("k{i}").as_bytes());
    }
    assert!(trie.is_empty());

    for handle in handles {
        handle.join().unwrap();
    }
}
