use ct_bloom::{base_hashes, constant_time_contains, BloomFilter};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Instant;

fn random_keys(rng: &mut StdRng, count: usize, len: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let mut key = vec![0u8; len];
            rng.fill_bytes(&mut key);
            key
        })
        .collect()
}

#[test]
fn test_basic_scenario() {
    let mut filter = BloomFilter::new(1000, 4);
    filter.add(b"Bess");
    let emma_first = filter.constant_time_test(b"Emma");
    filter.add(b"Emma");

    assert!(!emma_first, "Emma should not be in the first time we look");
    assert!(filter.constant_time_test(b"Bess"));
    assert!(!filter.constant_time_test(b"Jane"));
    assert!(filter.constant_time_test(b"Emma"));
}

#[test]
fn test_no_false_negatives() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut filter = BloomFilter::with_estimates(500, 0.01).unwrap();
    let keys = random_keys(&mut rng, 500, 24);

    for key in &keys {
        filter.add(key);
    }

    for key in &keys {
        assert!(filter.constant_time_test(key));
    }
}

#[test]
fn test_agrees_with_reference_under_load() {
    let mut rng = StdRng::seed_from_u64(11);
    // Deliberately overloaded so both outcomes show up often
    let mut filter = BloomFilter::new(512, 3);

    for key in random_keys(&mut rng, 120, 16) {
        filter.add(&key);
    }

    let mut present = 0;
    for _ in 0..2000 {
        let len = rng.gen_range(0..40);
        let mut probe = vec![0u8; len];
        rng.fill_bytes(&mut probe);

        let expected = filter.test(&probe);
        assert_eq!(filter.constant_time_test(&probe), expected, "probe {:?}", probe);
        present += expected as usize;
    }

    assert!(present > 0 && present < 2000);
}

#[test]
fn test_every_word_read_once_in_order() {
    let mut filter = BloomFilter::new(1000, 4);
    filter.add(b"Bess");
    let words = filter.bit_array().words();

    for probe in [&b"Bess"[..], &b"Jane"[..], &b""[..]] {
        let hashes = base_hashes(probe);
        let mut visited = Vec::new();

        let found = constant_time_contains(
            words.iter().enumerate().map(|(index, word)| {
                visited.push(index);
                word
            }),
            &hashes,
            filter.k(),
            filter.cap(),
        );

        assert_eq!(found, filter.test(probe));
        assert_eq!(visited, (0..words.len()).collect::<Vec<_>>());
    }
}

#[test]
fn test_concurrent_readers() {
    let mut filter = BloomFilter::new(4096, 5);
    let keys: Vec<Vec<u8>> = (0..64u32).map(|i| i.to_be_bytes().to_vec()).collect();
    for key in &keys {
        filter.add(key);
    }

    std::thread::scope(|scope| {
        for chunk in keys.chunks(16) {
            let filter = &filter;
            scope.spawn(move || {
                for key in chunk {
                    assert!(filter.constant_time_test(key));
                }
            });
        }
    });
}

proptest! {
    #[test]
    fn prop_matches_reference(
        inserted in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..40),
        probe in prop::collection::vec(any::<u8>(), 0..32),
        m in 1u64..2048,
        k in 1u32..8,
    ) {
        let mut filter = BloomFilter::new(m, k);
        for key in &inserted {
            filter.add(key);
        }

        prop_assert_eq!(filter.constant_time_test(&probe), filter.test(&probe));
        for key in &inserted {
            prop_assert!(filter.constant_time_test(key));
        }
    }
}

fn median_nanos(filter: &BloomFilter, probes: &[Vec<u8>], rounds: usize) -> u128 {
    let mut samples = Vec::with_capacity(rounds * probes.len());
    for _ in 0..rounds {
        for probe in probes {
            let start = Instant::now();
            std::hint::black_box(filter.constant_time_test(std::hint::black_box(probe)));
            samples.push(start.elapsed().as_nanos());
        }
    }
    samples.sort_unstable();
    samples[samples.len() / 2]
}

fn time_once(filter: &BloomFilter, probe: &[u8]) -> u128 {
    let start = Instant::now();
    std::hint::black_box(filter.constant_time_test(std::hint::black_box(probe)));
    start.elapsed().as_nanos()
}

fn median(mut samples: Vec<u128>) -> f64 {
    samples.sort_unstable();
    samples[samples.len() / 2] as f64
}

/// Hits and misses are timed alternately so drift affects both groups alike.
#[test]
fn test_interleaved_timing_within_tolerance() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut filter = BloomFilter::with_estimates(200, 0.001).unwrap();

    let present = random_keys(&mut rng, 32, 32);
    for key in &present {
        filter.add(key);
    }
    let absent: Vec<Vec<u8>> = random_keys(&mut rng, 64, 32)
        .into_iter()
        .filter(|key| !filter.test(key))
        .take(present.len())
        .collect();
    assert_eq!(absent.len(), present.len());

    for (hit, miss) in present.iter().zip(&absent) {
        time_once(&filter, hit);
        time_once(&filter, miss);
    }

    let mut hits = Vec::new();
    let mut misses = Vec::new();
    for _ in 0..40 {
        for (hit, miss) in present.iter().zip(&absent) {
            hits.push(time_once(&filter, hit));
            misses.push(time_once(&filter, miss));
        }
    }

    let (hit, miss) = (median(hits), median(misses));
    let ratio = hit / miss.max(1.0);
    assert!(
        ratio > 0.5 && ratio < 2.0,
        "hit {}ns vs miss {}ns",
        hit,
        miss
    );
}

/// Tight version of the check above. Sensitive to machine noise, so it only
/// runs on request with `cargo test -- --ignored`.
#[test]
#[ignore]
fn test_timing_independent_of_outcome() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut filter = BloomFilter::with_estimates(1000, 0.0001).unwrap();

    let present = random_keys(&mut rng, 64, 32);
    for key in &present {
        filter.add(key);
    }
    let absent: Vec<Vec<u8>> = random_keys(&mut rng, 64, 32)
        .into_iter()
        .filter(|key| !filter.test(key))
        .collect();

    // Warm up caches and frequency scaling
    median_nanos(&filter, &present, 20);

    let hit = median_nanos(&filter, &present, 200) as f64;
    let miss = median_nanos(&filter, &absent, 200) as f64;
    let ratio = hit / miss;

    assert!(
        ratio > 0.9 && ratio < 1.1,
        "hit {}ns vs miss {}ns",
        hit,
        miss
    );
}
