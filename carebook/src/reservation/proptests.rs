//! Property-based tests for money and date ranges.

use super::{DateRange, Money};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

// Days between 2000-01-01 and roughly 2080
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..30_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn range_strategy() -> impl Strategy<Value = DateRange> {
    (date_strategy(), 0i64..400).prop_map(|(start, len)| {
        DateRange::new(start, start + Duration::days(len)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn money_display_parses_back(cents in 0i64..1_000_000_000) {
        let money = Money::from_cents(cents);
        let parsed: Money = money.to_string().parse().unwrap();
        prop_assert_eq!(parsed, money);
    }

    #[test]
    fn money_times_matches_repeated_addition(cents in 0i64..100_000, count in 0u32..500) {
        let expected: i64 = (0..count).map(|_| cents).sum();
        prop_assert_eq!(Money::from_cents(cents).times(count).cents(), expected);
    }

    #[test]
    fn inverted_ranges_rejected(a in date_strategy(), b in date_strategy()) {
        prop_assume!(a != b);
        let (early, late) = if a < b { (a, b) } else { (b, a) };
        prop_assert!(DateRange::new(early, late).is_ok());
        prop_assert!(DateRange::new(late, early).is_err());
    }

    #[test]
    fn days_cover_range_exactly(range in range_strategy()) {
        let days: Vec<_> = range.days().collect();
        prop_assert_eq!(days.len(), range.day_count() as usize);
        prop_assert_eq!(days.first().copied(), Some(range.start()));
        prop_assert_eq!(days.last().copied(), Some(range.end()));
        prop_assert!(days.iter().all(|d| range.contains(*d)));
        prop_assert!(!range.contains(range.end() + Duration::days(1)));
        prop_assert!(!range.contains(range.start() - Duration::days(1)));
    }

    #[test]
    fn stored_instants_rebuild_the_range(range in range_strategy()) {
        prop_assert!(range.starts_at() < range.ends_at());
        let rebuilt = DateRange::from_instants(range.starts_at(), range.ends_at()).unwrap();
        prop_assert_eq!(rebuilt, range);
    }

    #[test]
    fn elapsed_only_after_last_millisecond(range in range_strategy()) {
        prop_assert!(!range.has_elapsed(range.ends_at()));
        prop_assert!(range.has_elapsed(range.ends_at() + Duration::milliseconds(1)));
        prop_assert!(!range.has_elapsed(range.starts_at()));
    }

    #[test]
    fn instants_sort_like_text(a in range_strategy(), b in range_strategy()) {
        let text = |r: &DateRange| r.ends_at().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        prop_assert_eq!(a.ends_at().cmp(&b.ends_at()), text(&a).cmp(&text(&b)));
    }
}
