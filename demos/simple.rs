//! Walkthrough of the skip-hash API: point operations, ordered
//! queries, and range scans under concurrent mutation.

use std::sync::Arc;
use std::thread;

use skiphash::SkipHash;

fn main() {
    let map = SkipHash::new();

    for k in [5, 1, 3, 2, 4, 8, 6] {
        map.insert(k, k * 10);
    }
    map.remove(&3);

    println!("len            = {}", map.len());
    println!("get(4)         = {:?}", map.get(&4));
    println!("ceil(3)        = {:?}", map.ceil(&3).map(|e| e.key));
    println!("floor(3)       = {:?}", map.floor(&3).map(|e| e.key));
    println!("succ(5)        = {:?}", map.succ(&5).map(|e| e.key));
    println!("pred(5)        = {:?}", map.pred(&5).map(|e| e.key));

    let keys: Vec<_> = map.range(&2, &6).into_iter().map(|e| e.key).collect();
    println!("range(2, 6)    = {keys:?}");
    println!("count(1, 8)    = {}", map.range_count(&1, &8));

    // Scans stay consistent while other threads mutate.
    let shared = Arc::new(map);
    let mut handles = Vec::new();
    for t in 0..4 {
        let m = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            for i in 100..200 {
                let k = t * 1000 + i;
                m.store(k, k);
                if i % 3 == 0 {
                    m.remove(&k);
                }
            }
        }));
    }
    {
        let m = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                let seen = m.range(&0, &5000);
                assert!(seen.windows(2).all(|p| p[0].key < p[1].key));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    println!("after churn    = {} live keys", shared.len());
}
