//! Randomized model test: a sequence of `put`/`remove`/`get` operations is
//! replayed against both a `Store` and a `BTreeMap` reference model, and the
//! two are required to agree after every step. Grounded on the random
//! operation sequences `fjall-rs-lsm-tree`'s `model` binary replays against
//! its own `BTreeMap` reference.

use std::collections::BTreeMap;

use rand::Rng;
use strprox::Store;

const ALPHABET: &[u8] = b"abc";

fn random_key(rng: &mut impl Rng, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[test]
fn random_put_remove_get_matches_a_btreemap_model() {
    let mut rng = rand::thread_rng();
    let store: Store<u32> = Store::new();
    let mut model: BTreeMap<String, u32> = BTreeMap::new();

    for step in 0..2000u32 {
        let key = random_key(&mut rng, 4);
        match rng.gen_range(0..3) {
            0 => {
                let got = store.put(&key, step).unwrap();
                let expected = model.insert(key.clone(), step);
                assert_eq!(got, expected, "put({key:?}) diverged at step {step}");
            }
            1 => {
                let got = store.remove(&key);
                let expected = model.remove(&key);
                match expected {
                    Some(v) => assert_eq!(got.unwrap(), v, "remove({key:?}) diverged at step {step}"),
                    None => assert!(got.is_err(), "remove({key:?}) should have failed at step {step}"),
                }
            }
            _ => {
                let got = store.get(&key);
                match model.get(&key) {
                    Some(v) => assert_eq!(got.unwrap(), *v, "get({key:?}) diverged at step {step}"),
                    None => assert!(got.is_err(), "get({key:?}) should have failed at step {step}"),
                }
            }
        }
    }

    // Full agreement sweep at the end: every key the model still holds
    // must resolve in the store to the same value, and nothing else.
    for (key, value) in &model {
        assert_eq!(store.get(key).unwrap(), *value);
    }
    for key in all_keys(ALPHABET, 4) {
        if !model.contains_key(&key) {
            assert!(store.get(&key).is_err(), "{key:?} should not resolve: not in the model");
        }
    }
}

fn all_keys(alphabet: &[u8], max_len: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for &b in alphabet {
                let mut k = prefix.clone();
                k.push(b as char);
                out.push(k.clone());
                next.push(k);
            }
        }
        frontier = next;
    }
    out
}
