use rand::rngs::SmallRng;
use rand::SeedableRng;
use skiphash::SkipHash;

fn seeded(seed: u64) -> SkipHash<i32, i32> {
    SkipHash::<i32, i32>::builder()
        .rand_source(SmallRng::seed_from_u64(seed))
        .build()
}

#[test]
fn test_insert_get_remove() {
    let sh: SkipHash<i32, &str> = SkipHash::<i32, &str>::builder()
        .rand_source(SmallRng::seed_from_u64(1))
        .build();

    assert!(sh.insert(10, "a"), "expected first insert to succeed");
    assert!(!sh.insert(10, "b"), "expected duplicate insert to fail");

    assert_eq!(sh.get(&10), Some("a"));

    assert!(sh.remove(&10), "expected remove to succeed");
    assert!(!sh.remove(&10), "expected second remove to fail");
    assert_eq!(sh.get(&10), None);
    assert_eq!(sh.len(), 0);
    assert!(sh.is_empty());
}

#[test]
fn test_duplicate_insert_leaves_value_unchanged() {
    let sh = seeded(5);
    assert!(sh.insert(1, 100));
    assert!(!sh.insert(1, 200));
    assert_eq!(sh.get(&1), Some(100));
    assert_eq!(sh.len(), 1);
}

#[test]
fn test_store_insert_and_overwrite() {
    let sh = seeded(6);
    assert!(sh.store(1, 10), "store of a new key reports insertion");
    assert!(!sh.store(1, 11), "store of an existing key reports overwrite");
    assert_eq!(sh.get(&1), Some(11));
    assert_eq!(sh.len(), 1);
}

#[test]
fn test_reinsert_after_logical_delete() {
    let sh: SkipHash<i32, &str> = SkipHash::<i32, &str>::builder()
        .rand_source(SmallRng::seed_from_u64(2))
        .build();

    assert!(sh.insert(7, "old"));
    assert!(sh.remove(&7));
    assert!(sh.insert(7, "new"));

    assert_eq!(sh.get(&7), Some("new"));

    let entries = sh.range(&7, &7);
    assert_eq!(entries.len(), 1, "expected single live entry in range");
    assert_eq!(entries[0].value, "new");
}

#[test]
fn test_range_and_point_queries() {
    let sh = seeded(3);
    for k in [5, 1, 3, 2, 4, 8, 6] {
        assert!(sh.insert(k, k * 10), "insert failed for key={k}");
    }
    assert!(sh.remove(&3));

    let keys: Vec<_> = sh.range(&2, &6).into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec![2, 4, 5, 6]);

    assert_eq!(sh.ceil(&3).expect("ceil(3)").key, 4);
    assert_eq!(sh.succ(&5).expect("succ(5)").key, 6);
    assert_eq!(sh.floor(&3).expect("floor(3)").key, 2);
    assert_eq!(sh.pred(&5).expect("pred(5)").key, 4);
}

#[test]
fn test_range_skips_removed_prefix() {
    let sh = seeded(4);
    for k in 1..=10 {
        assert!(sh.insert(k, k));
    }
    for k in 2..=4 {
        assert!(sh.remove(&k));
    }

    let keys: Vec<_> = sh.range(&1, &6).into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec![1, 5, 6]);
}

#[test]
fn test_range_count() {
    let sh = seeded(7);
    for i in 0..100 {
        sh.store(i, i);
    }
    for i in 10..20 {
        sh.remove(&i);
    }

    assert_eq!(sh.range_count(&0, &99), 90);
    assert_eq!(sh.len(), 90);
}

#[test]
fn test_inverted_range_is_empty() {
    let sh = seeded(8);
    sh.insert(1, 1);
    sh.insert(2, 2);
    assert!(sh.range(&5, &1).is_empty());
    assert_eq!(sh.range_count(&5, &1), 0);
}

#[test]
fn test_empty_container_queries() {
    let sh = seeded(9);
    assert_eq!(sh.get(&1), None);
    assert!(!sh.contains(&1));
    assert_eq!(sh.ceil(&1), None);
    assert_eq!(sh.floor(&1), None);
    assert_eq!(sh.succ(&1), None);
    assert_eq!(sh.pred(&1), None);
    assert!(sh.range(&0, &100).is_empty());
    assert_eq!(sh.range_count(&0, &100), 0);
    assert!(sh.range_all().is_empty());
}

#[test]
fn test_boundary_queries() {
    let sh = seeded(10);
    for k in [10, 20, 30] {
        sh.insert(k, k);
    }

    assert_eq!(sh.succ(&30), None, "succ past the maximum key");
    assert_eq!(sh.pred(&10), None, "pred before the minimum key");
    assert_eq!(sh.ceil(&31), None);
    assert_eq!(sh.floor(&9), None);

    assert_eq!(sh.ceil(&10).expect("ceil(10)").key, 10);
    assert_eq!(sh.floor(&30).expect("floor(30)").key, 30);
    assert_eq!(sh.succ(&15).expect("succ(15)").key, 20);
    assert_eq!(sh.pred(&25).expect("pred(25)").key, 20);
}

#[test]
fn test_range_all_matches_full_range() {
    let sh = seeded(11);
    for k in 0..50 {
        sh.insert(k, k * 2);
    }
    for k in (0..50).step_by(3) {
        sh.remove(&k);
    }

    let all = sh.range_all();
    let full = sh.range(&0, &49);
    assert_eq!(all, full);
    assert_eq!(all.len(), sh.len());
}

#[test]
fn test_forced_slow_path_range() {
    // With zero fast-path tries every scan goes through the
    // coordinator; semantics must not change.
    let sh: SkipHash<i32, i32> = SkipHash::<i32, i32>::builder()
        .fast_path_tries(0)
        .rand_source(SmallRng::seed_from_u64(12))
        .build();
    for k in 1..=10 {
        sh.insert(k, k);
    }
    for k in 2..=4 {
        sh.remove(&k);
    }

    let keys: Vec<_> = sh.range(&1, &6).into_iter().map(|e| e.key).collect();
    assert_eq!(keys, vec![1, 5, 6]);

    // Repeated scans retire cleanly and keep returning the same view.
    for _ in 0..100 {
        assert_eq!(sh.range(&1, &6).len(), 3);
    }
}
