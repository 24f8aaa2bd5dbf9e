use proptest::prelude::*;
use rust_decimal::Decimal;

use zvote_types::{progress, progress_pct, SyncHeight, VotingPower, WindowPosition, SUBUNIT_SCALE};

proptest! {
    /// Whole subunits survive scaling unchanged: `n / 10^5` scales back to `n`.
    #[test]
    fn exact_subunit_amounts_scale_to_themselves(raw in 0u64..=1_000_000_000_000u64) {
        let amount = Decimal::from_i128_with_scale(i128::from(raw), 5);
        prop_assert_eq!(VotingPower::from_decimal(amount).unwrap().subunits(), raw);
    }

    /// Extra digits below the subunit never round up.
    #[test]
    fn scaling_never_rounds_up(raw in 0u64..1_000_000_000u64, tail in 0u32..10) {
        let amount = Decimal::from_i128_with_scale(i128::from(raw) * 10 + i128::from(tail), 6);
        let power = VotingPower::from_decimal(amount).unwrap();
        prop_assert_eq!(power.subunits(), raw);
    }

    /// The display value times the scale gives back the subunits.
    #[test]
    fn display_value_is_subunits_over_scale(raw in 0u64..u64::MAX / 2) {
        let shown = VotingPower::from_subunits(raw).to_decimal();
        prop_assert_eq!(shown * Decimal::from(SUBUNIT_SCALE), Decimal::from(raw));
    }

    /// Progress is defined exactly when the window is non-empty.
    #[test]
    fn progress_defined_iff_window_non_empty(h in 0u32..5_000_000, s in 0u32..5_000_000, e in 0u32..5_000_000) {
        prop_assert_eq!(progress_pct(SyncHeight::At(h), s, e).is_some(), s != e);
        prop_assert_eq!(progress_pct(SyncHeight::Unknown, s, e), None);
    }

    /// Classification follows the sign and magnitude of the percentage.
    #[test]
    fn window_position_matches_pct(h in 0u32..5_000_000, s in 0u32..2_500_000, len in 1u32..2_500_000) {
        let e = s + len;
        let reading = progress(SyncHeight::At(h), s, e).unwrap();
        let expected = if h < s {
            WindowPosition::BeforeWindow
        } else if h > e {
            WindowPosition::AfterWindow
        } else {
            WindowPosition::InWindow
        };
        prop_assert_eq!(reading.position, expected);
    }
}
