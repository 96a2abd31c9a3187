#![no_main]

use imath_eval::Formula;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(formula) = Formula::compile(source) {
        let _ = formula.symbols();
        let _ = formula.evaluate(&[("x", 2.0), ("y", -0.5)]);
    }
});
