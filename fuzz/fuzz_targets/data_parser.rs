#![no_main]

use libfuzzer_sys::fuzz_target;
use verdandi::data::{parse_series_json, parse_values};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither parser may panic, whatever the input
        let _ = parse_values(input);
        let _ = parse_series_json(input);
    }
});
