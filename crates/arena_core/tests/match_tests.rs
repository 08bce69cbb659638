//! End-to-end match tests.
//!
//! Drive full matches through the public API and check the rules that only
//! show up across many ticks.

use arena_core::config::{config_hash, PUBLISHED_CONFIG};
use arena_core::prelude::*;
use arena_test_utils::balance::MatchupStats;
use arena_test_utils::determinism::{run_parallel_matches_scoped, verify_match_determinism};
use arena_test_utils::fixtures;

// ==========================================================================
// Reproducibility
// ==========================================================================

#[test]
fn test_reference_matchup_is_reproducible() {
    let config = fixtures::published_config();
    let bear = fixtures::bear_glass_cannon();
    let buffalo = fixtures::buffalo_tank();

    let first = simulate_many(&config, &bear, &buffalo, 42, 100).expect("valid matchup");
    let second = simulate_many(&config, &bear, &buffalo, 42, 100).expect("valid matchup");
    assert_eq!(first, second);

    let stats = MatchupStats::from_outcomes(&first, config.max_ticks);
    assert_eq!(stats.wins_a + stats.wins_b + stats.draws, 100);
}

#[test]
fn test_engine_state_is_reproducible_per_tick() {
    verify_match_determinism(
        &ArenaConfig::default(),
        fixtures::snake_dot(),
        fixtures::owl_evasive(),
        2024,
        4,
    )
    .assert_deterministic();
}

#[test]
fn test_threads_do_not_change_outcomes() {
    run_parallel_matches_scoped(
        &ArenaConfig::default(),
        fixtures::build("monkey 5 6 5 4"),
        fixtures::build("tiger 4 8 6 2"),
        555,
        6,
    )
    .assert_deterministic();
}

#[test]
fn test_different_seeds_vary() {
    let config = ArenaConfig::default();
    let outcomes = simulate_many(
        &config,
        &fixtures::balanced("fox"),
        &fixtures::balanced("wolf"),
        0,
        50,
    )
    .expect("valid matchup");
    let first = outcomes[0];
    assert!(outcomes
        .iter()
        .any(|o| (o.winner, o.ticks_elapsed, o.final_hp_a)
            != (first.winner, first.ticks_elapsed, first.final_hp_a)));
}

// ==========================================================================
// Termination and Outcome Rules
// ==========================================================================

#[test]
fn test_every_pairing_terminates_within_limit() {
    let config = ArenaConfig::default();
    for a in Animal::ALL {
        for b in Animal::ALL {
            let outcome = simulate(
                &config,
                &fixtures::balanced(a.name()),
                &fixtures::balanced(b.name()),
                Some(7),
            )
            .expect("valid builds");
            assert!(
                (1..=config.max_ticks).contains(&outcome.ticks_elapsed),
                "{a} vs {b}: {outcome:?}"
            );
        }
    }
}

#[test]
fn test_outcome_agrees_with_final_hp() {
    let config = ArenaConfig::default();
    let outcomes = simulate_many(
        &config,
        &fixtures::build("shark 5 8 4 3"),
        &fixtures::build("crocodile 7 7 3 3"),
        900,
        60,
    )
    .expect("valid matchup");
    for outcome in outcomes {
        match outcome.winner {
            Winner::A => assert!(outcome.final_hp_a > 0, "{outcome:?}"),
            Winner::B => assert!(outcome.final_hp_b > 0, "{outcome:?}"),
            Winner::Draw => {}
        }
        if outcome.ticks_elapsed < config.max_ticks {
            assert!(
                outcome.final_hp_a <= 0 || outcome.final_hp_b <= 0,
                "early finish without a knockout: {outcome:?}"
            );
        }
    }
}

#[test]
fn test_short_match_limit_ends_by_timeout() {
    let config = ArenaConfig {
        max_ticks: 2,
        ..ArenaConfig::default()
    };
    let (outcome, events) = simulate_recorded(
        &config,
        &fixtures::buffalo_tank(),
        &fixtures::build("buffalo 8 6 4 2"),
        Some(3),
    )
    .expect("valid builds");
    assert_eq!(outcome.ticks_elapsed, 2);
    assert!(matches!(
        events.last(),
        Some(MatchEvent::Finished {
            reason: EndReason::Timeout,
            ..
        })
    ));
}

// ==========================================================================
// Validation
// ==========================================================================

#[test]
fn test_invalid_builds_rejected_with_values() {
    let err = Build::new(Animal::Bear, 5, 5, 5, 6).unwrap_err();
    assert_eq!(
        err,
        ValidationError::StatSum {
            expected: 20,
            total: 21,
            hp: 5,
            atk: 5,
            spd: 5,
            wil: 6,
        }
    );
    assert!(err.to_string().contains("21"));

    let err = Build::new(Animal::Bear, 0, 10, 5, 5).unwrap_err();
    assert!(matches!(err, ValidationError::StatBelowMinimum { value: 0, .. }));

    let err = "dragon 5 5 5 5".parse::<Build>().unwrap_err();
    assert!(err.to_string().contains("dragon"));
    assert!(err.to_string().contains("bear"));
}

#[test]
fn test_published_config_is_verified() {
    assert_eq!(config_hash(PUBLISHED_CONFIG.as_bytes()), PUBLISHED_CONFIG_HASH);
    let config = ArenaConfig::published().expect("published config loads");
    assert_eq!(config, ArenaConfig::default());

    let edited = PUBLISHED_CONFIG.replace("standard_bp: 450", "standard_bp: 900");
    assert!(matches!(
        ArenaConfig::from_verified_bytes(edited.as_bytes(), PUBLISHED_CONFIG_HASH),
        Err(ArenaError::ConfigIntegrity(_))
    ));
}

#[test]
fn test_edited_rules_apply_when_hash_matches() {
    let edited = PUBLISHED_CONFIG.replace("max_ticks: 60", "max_ticks: 5");
    let hash = config_hash(edited.as_bytes());
    let config = ArenaConfig::from_verified_bytes(edited.as_bytes(), &hash).expect("loads");
    assert_eq!(config.max_ticks, 5);
    let outcome = simulate(
        &config,
        &fixtures::buffalo_tank(),
        &fixtures::buffalo_tank(),
        Some(1),
    )
    .expect("valid builds");
    assert!(outcome.ticks_elapsed <= 5);
}
