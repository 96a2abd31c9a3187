#![no_main]

use imath_text::{DelimiterScanner, Delimiters};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for delimiters in [Delimiters::Dollar, Delimiters::Bracket] {
        let Ok(scanner) = DelimiterScanner::new(&delimiters) else {
            return;
        };
        let mut last_end = 0;
        for span in scanner.scan(&text) {
            assert!(span.range.start >= last_end);
            assert!(span.range.end <= text.len());
            assert!(!span.latex.is_empty());
            last_end = span.range.end;
        }
    }
});
