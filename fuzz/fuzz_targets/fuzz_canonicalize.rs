#![no_main]

use imath_text::{aliases_for, canonicalize, preprocess};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = canonicalize(&text);
    let _ = aliases_for(&text);
    let _ = preprocess(&text);
});
