#![no_main]

use distinct_counter::DistinctCounter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut counter) = serde_json::from_slice::<DistinctCounter<u64>>(data) {
        assert!(counter.len() < counter.threshold());
        assert!(counter.generation() < 64);
        if counter.insert(1).is_ok() {
            assert!(counter.len() < counter.threshold());
        }
    }
});
