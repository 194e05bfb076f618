//! Property-based tests for the configuration system.

use super::merger::ConfigMerger;
use super::schema::{CatalogConfig, Config, OutputFormat, SweepConfig};
use super::validator::{ConfigValidator, MAX_DISPLAY_OFFSET_MINUTES, MAX_SWEEP_INTERVAL_HOURS};
use proptest::prelude::*;

fn sweep_strategy() -> impl Strategy<Value = SweepConfig> {
    (
        prop::option::of(1..=MAX_SWEEP_INTERVAL_HOURS),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(interval_hours, enabled)| SweepConfig {
            interval_hours,
            enabled,
        })
}

fn format_strategy() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![
        Just(OutputFormat::Table),
        Just(OutputFormat::Json),
        Just(OutputFormat::Csv),
    ]
}

// Configs whose every value is within range
fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of(sweep_strategy()),
        prop::option::of(1u64..=86_400),
        prop::option::of(1u64..=600),
        prop::option::of(-MAX_DISPLAY_OFFSET_MINUTES..=MAX_DISPLAY_OFFSET_MINUTES),
        prop::option::of(format_strategy()),
    )
        .prop_map(|(sweep, refresh, lock_wait, offset, format)| Config {
            sweep,
            catalog: refresh.map(|seconds| CatalogConfig {
                refresh_seconds: Some(seconds),
            }),
            maximum_lock_wait_seconds: lock_wait,
            display_offset_minutes: offset,
            output_format: format,
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        prop_assert_eq!(
            merged.maximum_lock_wait_seconds,
            high.maximum_lock_wait_seconds.or(low.maximum_lock_wait_seconds)
        );
        prop_assert_eq!(
            merged.display_offset_minutes,
            high.display_offset_minutes.or(low.display_offset_minutes)
        );
        prop_assert_eq!(merged.output_format, high.output_format.or(low.output_format));

        let interval = |c: &Config| c.sweep.as_ref().and_then(|s| s.interval_hours);
        prop_assert_eq!(interval(&merged), interval(&high).or(interval(&low)));
    }

    #[test]
    fn merge_with_default_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    #[test]
    fn merge_is_idempotent(config in config_strategy()) {
        let mut once = Config::default();
        ConfigMerger::merge_into(&mut once, &config);
        let mut twice = once.clone();
        ConfigMerger::merge_into(&mut twice, &config);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn in_range_configs_validate(config in config_strategy()) {
        prop_assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn yaml_round_trip_preserves_config(config in config_strategy()) {
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(parsed, config);
    }
}
