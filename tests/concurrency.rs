//! Concurrent access exercises for `Store`: multiple threads inserting,
//! removing, and searching the same trie without tearing its invariants.

use std::sync::Arc;
use std::thread;

use strprox::{MatchingStrategy, Store};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

fn words() -> Vec<&'static str> {
    vec![
        "apple", "application", "apply", "banana", "band", "bandana", "cat", "catalog",
        "category", "dog", "dodge", "dogma",
    ]
}

#[test]
fn concurrent_put_get() {
    common::init();
    let store = Arc::new(Store::new());
    let handles: Vec<_> = words()
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.put(word, i).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for (i, word) in words().into_iter().enumerate() {
        assert_eq!(store.get(word).unwrap(), i);
    }
}

#[test]
fn concurrent_reads_during_writes() {
    common::init();
    let store = Arc::new(Store::new());
    for (i, word) in words().into_iter().enumerate() {
        store.put(word, i).unwrap();
    }

    let writer_store = Arc::clone(&store);
    let writer = thread::spawn(move || {
        for i in 0..20 {
            writer_store.put("zzzfiller", i).unwrap();
            writer_store.remove("zzzfiller").ok();
        }
    });

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        readers.push(thread::spawn(move || {
            for _ in 0..20 {
                let results = store.match_by_prefix("app").unwrap();
                assert!(results.iter().any(|(k, _)| k == "apple"));
                let fuzzy = store
                    .match_by_substring_fuzzy("catgory", 1, MatchingStrategy::Liberal)
                    .unwrap();
                assert!(fuzzy.iter().any(|m| m.sequence == "category"));
            }
        }));
    }

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn concurrent_insert_and_remove_preserves_invariants() {
    common::init();
    let store = Arc::new(Store::new());
    let inserters: Vec<_> = words()
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.put(word, i).unwrap())
        })
        .collect();
    for h in inserters {
        h.join().unwrap();
    }

    let removers: Vec<_> = ["band", "dodge", "catalog"]
        .iter()
        .map(|word| {
            let store = Arc::clone(&store);
            let word = word.to_string();
            thread::spawn(move || store.remove(&word).unwrap())
        })
        .collect();
    for h in removers {
        h.join().unwrap();
    }

    assert!(store.get("band").is_err());
    assert!(store.get("dodge").is_err());
    assert!(store.get("catalog").is_err());
    assert!(store.get("bandana").is_ok());
    assert!(store.get("dogma").is_ok());
    assert!(store.get("category").is_ok());
}
