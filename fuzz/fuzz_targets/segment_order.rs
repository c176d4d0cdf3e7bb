#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = sweepclip::arbitrary::check_segment_order(&mut Unstructured::new(data));
});
