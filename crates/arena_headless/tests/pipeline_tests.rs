//! End-to-end tests of the headless pipeline: rules, batch, records, replay.

use arena_core::replay::MatchReplay;
use arena_headless::batch::{run_batch, BatchConfig, BatchResults, RECORDS_FILE, RESULTS_FILE};
use arena_headless::metrics::{read_records, BatchSummary};
use arena_headless::rules::load_rules;
use arena_headless::runner::run_pairing;
use arena_test_utils::fixtures;

// ==========================================================================
// Batch Persistence
// ==========================================================================

#[test]
fn test_batch_records_rebuild_summary() {
    let rules = load_rules(None, None).expect("published rules");
    let builds = vec![
        fixtures::build("bear 3 14 2 1"),
        fixtures::build("wolf 5 10 3 2"),
        fixtures::build("owl 4 5 8 3"),
    ];
    let results = run_batch(
        BatchConfig::new(builds.clone(), 10).with_seed(42),
        &rules.config,
        rules.short_hash(),
    );

    let dir = tempfile::tempdir().expect("tempdir");
    results.save_to_dir(dir.path()).expect("save");

    let records = read_records(&dir.path().join(RECORDS_FILE)).expect("records");
    assert_eq!(records.len(), 30);
    assert!(records.iter().all(|r| r.config_hash == "88c1a2b2"));
    assert!(records.iter().all(|r| r.ticks >= 1 && r.ticks <= 60));

    let labels: Vec<String> = builds.iter().map(ToString::to_string).collect();
    let rebuilt = BatchSummary::from_records(&labels, &records);
    let saved = BatchResults::load(&dir.path().join(RESULTS_FILE)).expect("load");
    assert_eq!(rebuilt.matchups, saved.summary.matchups);
    assert_eq!(rebuilt.ranking.len(), 3);
}

#[test]
fn test_reference_pairing_is_stable() {
    let rules = load_rules(None, None).expect("published rules");
    let run = |_| {
        run_pairing(
            &rules.config,
            rules.short_hash(),
            &fixtures::bear_glass_cannon(),
            &fixtures::buffalo_tank(),
            100,
            42,
            false,
        )
        .expect("valid builds")
        .records
    };
    assert_eq!(run(0), run(1));
}

// ==========================================================================
// Replays
// ==========================================================================

#[test]
fn test_recorded_replay_verifies_against_loaded_rules() {
    let rules = load_rules(None, None).expect("published rules");
    let replay = MatchReplay::record(
        &rules.config,
        rules.hash.clone(),
        fixtures::build("monkey 5 6 5 4"),
        fixtures::build("scorpion 6 6 4 4"),
        31337,
    )
    .expect("records");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("m.replay");
    replay.save(&path).expect("save");

    let loaded = MatchReplay::load(&path).expect("load");
    assert_eq!(loaded.config_hash, rules.hash);
    assert!(loaded.verify(&rules.config).expect("verify").is_identical());
}
