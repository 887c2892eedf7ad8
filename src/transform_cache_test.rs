#![allow(clippy::float_cmp)]

use super::*;

fn viewport(width: f64) -> Viewport {
    Viewport::new(width, 1.0, 600.0).unwrap()
}

fn engine() -> TransformEngine {
    TransformEngine::default()
}

// =============================================================
// Keys
// =============================================================

#[test]
fn cache_key_format() {
    assert_eq!(cache_key("img_1", 326.0, 150.0), "img_1_326_150");
    assert_eq!(cache_key("img_2", 406.39, 116.49), "img_2_406.39_116.49");
}

// =============================================================
// Hits and misses
// =============================================================

#[test]
fn new_cache_is_empty() {
    let cache = TransformCache::new(1000);
    assert!(cache.is_empty());
    assert_eq!(cache.computations(), 0);
    assert_eq!(cache.capacity(), 1000);
}

#[test]
fn get_on_empty_is_miss() {
    let cache = TransformCache::new(10);
    assert!(cache.get("a", &viewport(400.0)).is_none());
}

#[test]
fn second_lookup_is_bit_identical_and_not_recomputed() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(1000);
    let first = cache.get_or_compute("img_326_150", 326.0, 150.0, &vp, &engine(), 0.0);
    assert_eq!(cache.computations(), 1);
    let second = cache.get_or_compute("img_326_150", 326.0, 150.0, &vp, &engine(), 1.0);
    assert_eq!(cache.computations(), 1);
    assert_eq!(first.x.to_bits(), second.x.to_bits());
    assert_eq!(first.y.to_bits(), second.y.to_bits());
    assert_eq!(first, second);
}

#[test]
fn computed_result_is_sub_pixel() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(10);
    let r = cache.get_or_compute("k", 326.0, 150.0, &vp, &engine(), 0.0);
    assert_eq!(r, engine().device_coordinates(326.0, 150.0, &vp, Rounding::SubPixel));
}

#[test]
fn get_returns_stored_result() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(10);
    let r = cache.get_or_compute("k", 1.0, 2.0, &vp, &engine(), 0.0);
    assert_eq!(cache.get("k", &vp), Some(r));
}

// =============================================================
// Scale validity
// =============================================================

#[test]
fn scale_change_makes_entry_a_miss() {
    let mut vp = viewport(400.0);
    let mut cache = TransformCache::new(10);
    cache.get_or_compute("k", 326.0, 150.0, &vp, &engine(), 0.0);
    assert!(vp.resize(500.0).unwrap());
    assert!(cache.get("k", &vp).is_none());
    let r = cache.get_or_compute("k", 326.0, 150.0, &vp, &engine(), 0.0);
    assert_eq!(cache.computations(), 2);
    assert_eq!(r.scale.x, vp.scale_x);
}

#[test]
fn stale_replacement_does_not_grow_cache() {
    let mut vp = viewport(400.0);
    let mut cache = TransformCache::new(10);
    cache.get_or_compute("k", 1.0, 1.0, &vp, &engine(), 0.0);
    vp.resize(450.0).unwrap();
    cache.get_or_compute("k", 1.0, 1.0, &vp, &engine(), 0.0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidate_all_clears_everything() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(10);
    for i in 0..5 {
        cache.get_or_compute(&format!("k{i}"), f64::from(i), 0.0, &vp, &engine(), 0.0);
    }
    cache.invalidate_all();
    assert!(cache.is_empty());
    cache.get_or_compute("k0", 0.0, 0.0, &vp, &engine(), 0.0);
    assert_eq!(cache.computations(), 6);
}

// =============================================================
// Eviction
// =============================================================

#[test]
fn inserting_1500_keys_keeps_last_1000() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(1000);
    for i in 0..1500 {
        cache.get_or_compute(&format!("k{i}"), f64::from(i), 0.0, &vp, &engine(), 0.0);
    }
    assert_eq!(cache.len(), 1000);
    for i in 0..500 {
        assert!(!cache.contains_key(&format!("k{i}")), "k{i} should be evicted");
    }
    for i in 500..1500 {
        assert!(cache.contains_key(&format!("k{i}")), "k{i} should remain");
    }
}

#[test]
fn eviction_is_fifo_not_lru() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(3);
    for key in ["a", "b", "c"] {
        cache.get_or_compute(key, 0.0, 0.0, &vp, &engine(), 0.0);
    }
    // Touch "a" so an LRU would keep it.
    assert!(cache.get("a", &vp).is_some());
    cache.get_or_compute("a", 0.0, 0.0, &vp, &engine(), 0.0);
    cache.get_or_compute("d", 0.0, 0.0, &vp, &engine(), 0.0);
    assert!(!cache.contains_key("a"));
    assert!(cache.contains_key("b"));
    assert!(cache.contains_key("d"));
}

#[test]
fn replaced_key_keeps_original_slot() {
    let mut vp = viewport(400.0);
    let mut cache = TransformCache::new(2);
    cache.get_or_compute("a", 0.0, 0.0, &vp, &engine(), 0.0);
    cache.get_or_compute("b", 0.0, 0.0, &vp, &engine(), 0.0);
    vp.resize(450.0).unwrap();
    cache.get_or_compute("a", 0.0, 0.0, &vp, &engine(), 0.0);
    cache.get_or_compute("c", 0.0, 0.0, &vp, &engine(), 0.0);
    assert!(!cache.contains_key("a"));
    assert!(cache.contains_key("b"));
    assert!(cache.contains_key("c"));
}

#[test]
fn zero_capacity_treated_as_one() {
    let vp = viewport(400.0);
    let mut cache = TransformCache::new(0);
    cache.get_or_compute("a", 0.0, 0.0, &vp, &engine(), 0.0);
    cache.get_or_compute("b", 0.0, 0.0, &vp, &engine(), 0.0);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains_key("b"));
}
