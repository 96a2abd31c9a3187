//! Property-based invariant tests for the formula engine.
//!
//! 1. Arithmetic without symbols matches direct computation.
//! 2. Implicit and explicit multiplication agree.
//! 3. `\frac` agrees with `/`.
//! 4. `symbols()` lists each symbol once.
//! 5. No panics on arbitrary input, however long.

use imath_eval::parser::MAX_TOKENS;
use imath_eval::{EvalError, Formula, evaluate};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// `(source, value)` pairs for integer arithmetic with `+ - *` and groups.
fn arithmetic() -> impl Strategy<Value = (String, f64)> {
    let leaf = (0i32..50).prop_map(|n| (n.to_string(), f64::from(n)));
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({a}) + ({b})"), x + y)),
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!("({a}) - ({b})"), x - y)),
            (inner.clone(), inner.clone())
                .prop_map(|((a, x), (b, y))| (format!(r"\left({a}\right) \cdot \left({b}\right)"), x * y)),
            inner.prop_map(|(a, x)| (format!("-{{{a}}}"), -x)),
        ]
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Numeric agreement
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arithmetic_matches_direct_computation((source, expected) in arithmetic()) {
        let got = evaluate(&source, &()).unwrap();
        prop_assert!(close(got, expected), "{source}: {got} != {expected}");
    }

    #[test]
    fn implicit_multiplication_is_multiplication(a in 0u32..1000, x in -100.0f64..100.0) {
        let implicit = evaluate(&format!("{a}x"), &[("x", x)]).unwrap();
        let explicit = evaluate(&format!("{a} * x"), &[("x", x)]).unwrap();
        prop_assert_eq!(implicit, explicit);
    }

    #[test]
    fn frac_is_division(a in -1000i32..1000, b in 1i32..1000) {
        let frac = evaluate(&format!(r"\frac{{{a}}}{{{b}}}"), &()).unwrap();
        let slash = evaluate(&format!("({a}) / ({b})"), &()).unwrap();
        prop_assert_eq!(frac, slash);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Symbols
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn symbols_are_unique(names in prop::collection::vec("[a-z]{1,3}", 1..6)) {
        let source = names.join(" + ");
        let formula = Formula::compile(&source).unwrap();
        let symbols = formula.symbols();
        let mut deduped = symbols.clone();
        deduped.sort_unstable();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), symbols.len());
        for name in &names {
            prop_assert!(symbols.contains(&name.as_str()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Robustness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn no_panic_on_token_soup(source in r"[0-9a-zA-Z+\-*/^!|(){}\[\]_,. ]{0,48}") {
        if let Ok(formula) = Formula::compile(&source) {
            let _ = formula.evaluate(&());
        }
    }

    #[test]
    fn no_panic_on_commands(
        parts in prop::collection::vec(
            prop_oneof![
                Just(r"\frac".to_string()),
                Just(r"\sqrt".to_string()),
                Just(r"\log_".to_string()),
                Just(r"\sin".to_string()),
                Just(r"\max".to_string()),
                Just(r"\left(".to_string()),
                Just(r"\right)".to_string()),
                "[0-9a-z{}|^!(),]".prop_map(String::from),
            ],
            0..16,
        )
    ) {
        let source = parts.concat();
        if let Ok(formula) = Formula::compile(&source) {
            let _ = formula.evaluate(&[("x", 1.0)]);
        }
    }

    #[test]
    fn no_panic_on_unicode(source in "\\PC{0,32}") {
        let _ = evaluate(&source, &());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn long_chains_fail_cleanly(
        link in prop_oneof![
            Just("+1"),
            Just("-x"),
            Just(r"\cdot 2"),
            Just(" y"),
            Just("!"),
            Just("/(1)"),
        ],
        n in 10_000usize..20_000,
    ) {
        let source = "1".to_string() + &link.repeat(n);
        let err = evaluate(&source, &[("x", 1.0), ("y", 2.0)]).unwrap_err();
        let is_too_long = matches!(err, EvalError::TooLong { limit: MAX_TOKENS, .. });
        prop_assert!(is_too_long);
    }

    #[test]
    fn long_token_soup_does_not_panic(
        parts in prop::collection::vec(r"[0-9a-z+\-*/^!|(){}]", 10_000..12_000),
    ) {
        let _ = evaluate(&parts.concat(), &());
    }
}
