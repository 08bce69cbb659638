//! Property-based tests over random valid builds and seeds.

use arena_core::config::StatConfig;
use arena_core::prelude::*;
use arena_test_utils::determinism::strategies::{
    arb_allocation, arb_animal, arb_build, arb_raw_stats, arb_seed,
};
use arena_test_utils::proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_same_seed_same_outcome(a in arb_build(), b in arb_build(), seed in arb_seed()) {
        let config = ArenaConfig::default();
        let first = simulate(&config, &a, &b, Some(seed)).expect("valid builds");
        let second = simulate(&config, &a, &b, Some(seed)).expect("valid builds");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_matches_terminate(a in arb_build(), b in arb_build(), seed in arb_seed()) {
        let config = ArenaConfig::default();
        let outcome = simulate(&config, &a, &b, Some(seed)).expect("valid builds");
        prop_assert!(outcome.ticks_elapsed >= 1);
        prop_assert!(outcome.ticks_elapsed <= config.max_ticks);
    }

    #[test]
    fn prop_raw_stats_validate_exactly(animal in arb_animal(), stats in arb_raw_stats()) {
        let [hp, atk, spd, wil] = stats;
        let valid = stats.iter().all(|&s| s >= 1) && stats.iter().sum::<i64>() == 20;
        prop_assert_eq!(Build::new(animal, hp, atk, spd, wil).is_ok(), valid);
    }

    #[test]
    fn prop_display_parses_back(build in arb_build()) {
        let parsed: Build = build.to_string().parse().expect("display output parses");
        prop_assert_eq!(parsed, build);
    }

    #[test]
    fn prop_shifting_hp_into_atk(animal in arb_animal(), stats in arb_allocation()) {
        prop_assume!(stats[0] > 1);
        let rules = StatConfig::default();
        let before = Build::with_rules(animal, stats, &rules).expect("valid").derive(&rules);
        let shifted = [stats[0] - 1, stats[1] + 1, stats[2], stats[3]];
        let after = Build::with_rules(animal, shifted, &rules).expect("valid").derive(&rules);
        prop_assert!(after.base_dmg >= before.base_dmg);
        prop_assert_eq!(after.max_hp, before.max_hp - 10);
    }

    #[test]
    fn prop_shifting_atk_into_spd_and_wil(animal in arb_animal(), stats in arb_allocation()) {
        prop_assume!(stats[1] > 2);
        let rules = StatConfig::default();
        let before = Build::with_rules(animal, stats, &rules).expect("valid").derive(&rules);
        let shifted = [stats[0], stats[1] - 2, stats[2] + 1, stats[3] + 1];
        let after = Build::with_rules(animal, shifted, &rules).expect("valid").derive(&rules);
        prop_assert!(after.dodge_bp >= before.dodge_bp);
        prop_assert!(after.resist_bp >= before.resist_bp);
        prop_assert!(after.proc_bonus_bp > before.proc_bonus_bp);
        prop_assert!(after.dodge_bp <= rules.dodge_cap_bp);
        prop_assert!(after.resist_bp <= rules.resist_cap_bp);
    }
}
