//! Fuzz target for result array parsing and import.
//!
//! This fuzzer feeds arbitrary byte sequences through parse, import and
//! export, checking that whatever loads once also loads after export.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelstate::serialize::fuzz_result_pipeline;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_result_pipeline(data);
});
