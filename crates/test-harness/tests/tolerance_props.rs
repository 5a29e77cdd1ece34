//! Property-based tests for the tolerance law and cleanup globs using `proptest`.

use proptest::prelude::*;

use test_harness::oracle::within_tolerance;
use test_harness::workspace::FilePattern;
use transport_types::{Expectation, Measurement};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_value() -> impl Strategy<Value = f64> {
    0.1f64..3.0
}

fn arb_spread() -> impl Strategy<Value = f64> {
    0.0f64..0.5
}

fn arb_stem() -> impl Strategy<Value = String> {
    "[a-z0-9_.]{0,12}"
}

// ---------------------------------------------------------------------------
// 1. Anything inside tolerance + uncertainty is accepted
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn accepts_inside_band(
        value in arb_value(),
        tolerance in arb_spread(),
        std_dev in arb_spread(),
        frac in -1.0f64..1.0,
    ) {
        prop_assume!(tolerance + std_dev > 1e-6);
        // stay a hair inside the band so rounding cannot push it out
        let mean = value + frac * (tolerance + std_dev) * 0.999;
        let ok = within_tolerance(Measurement { mean, std_dev }, Expectation { value, tolerance });
        prop_assert!(ok, "mean={} value={} t={} u={}", mean, value, tolerance, std_dev);
    }
}

// ---------------------------------------------------------------------------
// 2. Anything beyond tolerance + uncertainty is rejected
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rejects_outside_band(
        value in arb_value(),
        tolerance in arb_spread(),
        std_dev in arb_spread(),
        eps in 1e-6f64..1.0,
        above in any::<bool>(),
    ) {
        let offset = tolerance + std_dev + eps;
        let mean = if above { value + offset } else { value - offset };
        let ok = within_tolerance(Measurement { mean, std_dev }, Expectation { value, tolerance });
        prop_assert!(!ok, "mean={} value={} t={} u={}", mean, value, tolerance, std_dev);
    }
}

// ---------------------------------------------------------------------------
// 3. Glob literals and wildcards
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn literal_pattern_matches_only_itself(name in arb_stem(), other in arb_stem()) {
        let p = FilePattern::new(&name);
        prop_assert!(p.matches(&name));
        if other != name {
            prop_assert!(!p.matches(&other));
        }
    }

    #[test]
    fn prefix_star_matches_any_suffix(prefix in arb_stem(), suffix in arb_stem()) {
        let p = FilePattern::new(&format!("{}*", prefix));
        let name = format!("{}{}", prefix, suffix);
        prop_assert!(p.matches(&name));
    }

    #[test]
    fn face_intermediates_match_any_ids(v in 1u32..10_000, f in 1u32..10_000) {
        let p = FilePattern::new("vol*_face*");
        let name = format!("vol{}_face{}.stl", v, f);
        prop_assert!(p.matches(&name));
    }
}
