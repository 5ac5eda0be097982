#![no_main]

use distinct_counter::DistinctCounter;
use libfuzzer_sys::fuzz_target;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // derive threshold and seed from the input so every run is reproducible
    let threshold = 2 + usize::from(data[0]);
    let seed = wyhash(data, 0);

    let mut counter = DistinctCounter::<&[u8]>::new(threshold, StdRng::seed_from_u64(seed)).unwrap();
    for chunk in data[1..].chunks(2) {
        if counter.insert(chunk).is_err() {
            assert!(counter.is_failed());
            assert!(counter.insert(chunk).is_err());
            return;
        }
        assert!(counter.len() < threshold);
        if counter.generation() == 0 {
            assert_eq!(counter.estimate(), counter.len() as u64);
        }
    }
});
