//! Fuzz target for result array validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelstate::model::AcceptAll;
use labelstate::serialize::parse_result_slice;
use labelstate::validation::{validate_results, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(entries) = parse_result_slice(data) {
        let _ = validate_results(&entries, &AcceptAll, &ValidateOptions::default());
    }
});
