//! Headless arena runner.
//!
//! Plays matches without any interactive surface. Results are printed to
//! stdout, logs go to stderr, and any failure exits with status 1.
//!
//! # Usage
//!
//! ```bash
//! # N matches between two builds
//! cargo run -p arena_headless -- run --build1 "bear 3 14 2 1" --build2 "buffalo 8 6 4 2" --games 100
//!
//! # Every pair of a pool
//! cargo run -p arena_headless -- round-robin --builds "bear 3 14 2 1" "buffalo 8 6 4 2" "wolf 5 10 3 2"
//!
//! # Best-of-7 series
//! cargo run -p arena_headless -- series --build1 "fox 4 6 6 4" --build2 "owl 4 5 8 3" --series-count 20
//!
//! # Record and verify a replay
//! cargo run -p arena_headless -- record --build1 "snake 4 6 5 5" --build2 "wolf 6 8 3 3" --seed 7 --out m.replay
//! cargo run -p arena_headless -- replay --file m.replay --verify
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::config::{config_hash, short_hash, PUBLISHED_CONFIG, PUBLISHED_CONFIG_HASH};
use arena_core::replay::MatchReplay;
use arena_core::rng::generate_seed;
use arena_core::stats::Build;
use arena_headless::{
    batch::{run_batch, BatchConfig, RECORDS_FILE, RESULTS_FILE},
    rules::{load_rules, LoadedRules},
    runner::{round_robin, run_pairing, verify_determinism},
    series::{run_series, SeriesConfig},
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless Moreau Arena match runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Rules file to use instead of the embedded published configuration
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Expected SHA-256 of the rules file (defaults to the published digest)
    #[arg(long, global = true)]
    rules_hash: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play N matches between two builds
    Run {
        /// First build, e.g. "bear 3 14 2 1"
        #[arg(long, value_parser = parse_build)]
        build1: Build,

        /// Second build
        #[arg(long, value_parser = parse_build)]
        build2: Build,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Seed of the first match (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Play every pair of builds and rank them
    RoundRobin {
        /// Build pool (at least two)
        #[arg(long, num_args = 2.., required = true, value_parser = parse_build)]
        builds: Vec<Build>,

        /// Matches per pair
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Seed of the first pair
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Play best-of-N series between two fixed builds
    Series {
        /// First build
        #[arg(long, value_parser = parse_build)]
        build1: Build,

        /// Second build
        #[arg(long, value_parser = parse_build)]
        build2: Build,

        /// Number of series
        #[arg(long, default_value = "10")]
        series_count: u32,

        /// Maximum games per series
        #[arg(long, default_value = "7")]
        best_of: u32,

        /// Seed of series 0
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Round robin in parallel, with results written to disk
    Batch {
        /// Build pool (at least two)
        #[arg(long, num_args = 2.., required = true, value_parser = parse_build)]
        builds: Vec<Build>,

        /// Matches per pair
        #[arg(short, long, default_value = "100")]
        games: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// First build
        #[arg(long, value_parser = parse_build)]
        build1: Build,

        /// Second build
        #[arg(long, value_parser = parse_build)]
        build2: Build,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play one match and save its replay
    Record {
        /// First build
        #[arg(long, value_parser = parse_build)]
        build1: Build,

        /// Second build
        #[arg(long, value_parser = parse_build)]
        build2: Build,

        /// Match seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Replay output path
        #[arg(long)]
        out: PathBuf,
    },

    /// Show or verify a recorded match
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Re-run the match and compare
        #[arg(long)]
        verify: bool,
    },

    /// Print or check a configuration digest
    Config {
        /// Config file (embedded published config when omitted)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Digest the file must match
        #[arg(long)]
        expected_hash: Option<String>,
    },
}

fn parse_build(s: &str) -> Result<Build, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for results
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    if let Commands::Config {
        path,
        expected_hash,
    } = &cli.command
    {
        cmd_config(path.as_deref(), expected_hash.as_deref());
        return;
    }

    let rules = match load_rules(cli.rules.as_deref(), cli.rules_hash.as_deref()) {
        Ok(r) => r,
        Err(e) => fail(&format!("Failed to load rules: {e}")),
    };

    match cli.command {
        Commands::Run {
            build1,
            build2,
            games,
            seed,
        } => cmd_run(&rules, &build1, &build2, games, seed, cli.verbose),
        Commands::RoundRobin {
            builds,
            games,
            seed,
        } => cmd_round_robin(&rules, &builds, games, seed),
        Commands::Series {
            build1,
            build2,
            series_count,
            best_of,
            seed,
        } => cmd_series(
            &rules,
            &build1,
            &build2,
            &SeriesConfig {
                best_of,
                series_count,
                seed,
            },
        ),
        Commands::Batch {
            builds,
            games,
            parallel,
            output,
            seed,
        } => cmd_batch(&rules, builds, games, parallel, output, seed),
        Commands::Verify {
            build1,
            build2,
            seed,
            runs,
        } => cmd_verify(&rules, &build1, &build2, seed, runs),
        Commands::Record {
            build1,
            build2,
            seed,
            out,
        } => cmd_record(&rules, build1, build2, seed, out),
        Commands::Replay { file, verify } => cmd_replay(&rules, file, verify),
        Commands::Config { .. } => {}
    }
}

/// Print to stderr and exit with status 1.
fn fail(message: &str) -> ! {
    tracing::error!("{message}");
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_header(title: &str, rules: &LoadedRules) {
    println!("Moreau Arena - {title}");
    println!("Config hash: {}", rules.short_hash());
    println!();
}

fn print_build(index: usize, build: &Build, rules: &LoadedRules) {
    let d = build.derive(&rules.config.stats);
    println!(
        "Build {index}: {build} (max_hp={}, base_dmg={}, dodge={:.1}%, resist={:.1}%)",
        d.max_hp,
        d.base_dmg,
        f64::from(d.dodge_bp) / 100.0,
        f64::from(d.resist_bp) / 100.0
    );
}

/// Play N matches between two builds
fn cmd_run(
    rules: &LoadedRules,
    build1: &Build,
    build2: &Build,
    games: u32,
    seed: Option<u64>,
    verbose: bool,
) {
    let seed = seed.unwrap_or_else(generate_seed);
    print_header("Head to Head", rules);
    print_build(1, build1, rules);
    print_build(2, build2, rules);
    println!("\nSimulating {games} games from seed {seed}...\n");

    let run = match run_pairing(
        &rules.config,
        rules.short_hash(),
        build1,
        build2,
        games,
        seed,
        verbose,
    ) {
        Ok(r) => r,
        Err(e) => fail(&format!("Run failed: {e}")),
    };

    if let Some(log) = &run.first_match_log {
        println!("--- Match 0 (seed {seed}) ---");
        for event in log {
            println!("  {event}");
        }
        println!("--- End Match 0 ---\n");
    }

    let s = &run.summary;
    println!("Results:");
    println!("  Build 1 wins: {} ({:.1}%)", s.wins_1, s.win_rate_1() * 100.0);
    println!("  Build 2 wins: {} ({:.1}%)", s.wins_2, s.win_rate_2() * 100.0);
    println!("  Draws: {}", s.draws);
    println!("  Avg game length: {:.1} ticks", s.avg_ticks);
}

/// Play every pair and rank the pool
fn cmd_round_robin(rules: &LoadedRules, builds: &[Build], games: u32, seed: u64) {
    print_header("Round Robin", rules);
    for (i, build) in builds.iter().enumerate() {
        print_build(i + 1, build, rules);
    }
    println!("\nSimulating {games} games per pair...\n");

    let rr = match round_robin(&rules.config, rules.short_hash(), builds, games, seed) {
        Ok(r) => r,
        Err(e) => fail(&format!("Round robin failed: {e}")),
    };

    println!("Pairwise Win Rates:");
    print!("{}", rr.matrix.to_table());
    println!("\nRankings (by average win rate):");
    for (rank, entry) in rr.ranking.iter().enumerate() {
        println!(
            "  {}. {} - {:.1}% avg win rate",
            rank + 1,
            entry.build,
            entry.avg_win_rate * 100.0
        );
    }
}

/// Play best-of-N series
fn cmd_series(rules: &LoadedRules, build1: &Build, build2: &Build, series: &SeriesConfig) {
    print_header(&format!("Series (best-of-{})", series.best_of), rules);
    print_build(1, build1, rules);
    print_build(2, build2, rules);
    println!("\nSimulating {} series...\n", series.series_count);

    let tally = match run_series(&rules.config, build1, build2, series) {
        Ok(t) => t,
        Err(e) => fail(&format!("Series failed: {e}")),
    };

    println!("Series Results:");
    println!(
        "  Build 1 wins: {}/{} series",
        tally.series_wins_1, series.series_count
    );
    println!(
        "  Build 2 wins: {}/{} series",
        tally.series_wins_2, series.series_count
    );
    println!("  Total games played: {}", tally.total_games);
}

/// Parallel round robin with results on disk
fn cmd_batch(
    rules: &LoadedRules,
    builds: Vec<Build>,
    games: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
) {
    let batch_start = Instant::now();
    let num_cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);

    tracing::info!(
        builds = builds.len(),
        games_per_pair = games,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        config_hash = rules.short_hash(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        fail(&format!(
            "Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let config = BatchConfig::new(builds, games)
        .with_output(output.clone())
        .with_seed(seed)
        .with_parallelism(parallel);
    let results = run_batch(config, &rules.config, rules.short_hash());

    if let Err(e) = results.save_to_dir(&output) {
        fail(&format!("Failed to save results: {e}"));
    }

    tracing::info!(
        matches = results.records.len(),
        failed = results.errors.len(),
        total_duration_secs = format!("{:.1}", batch_start.elapsed().as_secs_f64()),
        "Batch execution finished"
    );

    println!("{}", "=".repeat(50));
    println!("BATCH COMPLETE");
    println!("{}", "=".repeat(50));
    println!("Matches played: {}", results.records.len());
    if !results.errors.is_empty() {
        println!("Matches FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            println!(
                "  Match {} (seed {}): {}",
                error.game_index, error.seed, error.message
            );
        }
    }
    println!("Draws: {}", results.summary.draws);
    println!(
        "Avg game length: {:.1} ticks",
        results.summary.avg_duration_ticks
    );
    println!("\nPairwise Win Rates:");
    print!("{}", results.summary.matrix.to_table());
    println!("\nRankings:");
    for (rank, entry) in results.summary.ranking.iter().enumerate() {
        println!(
            "  {}. {} - {:.1}%",
            rank + 1,
            entry.build,
            entry.avg_win_rate * 100.0
        );
    }
    println!(
        "\nResults saved to: {} and {}",
        output.join(RESULTS_FILE).display(),
        output.join(RECORDS_FILE).display()
    );
}

/// Verify determinism
fn cmd_verify(rules: &LoadedRules, build1: &Build, build2: &Build, seed: u64, runs: u32) {
    tracing::info!("Verifying determinism: {build1} vs {build2} with seed {seed} ({runs} runs)");

    match verify_determinism(&rules.config, build1, build2, seed, runs) {
        Ok(true) => println!("PASS: All {runs} runs produced identical results"),
        Ok(false) => fail("FAIL: Non-determinism detected!"),
        Err(e) => fail(&format!("FAIL: {e}")),
    }
}

/// Play one match and save its replay
fn cmd_record(rules: &LoadedRules, build1: Build, build2: Build, seed: Option<u64>, out: PathBuf) {
    let seed = seed.unwrap_or_else(generate_seed);
    let replay = match MatchReplay::record(&rules.config, rules.hash.clone(), build1, build2, seed)
    {
        Ok(r) => r,
        Err(e) => fail(&format!("Failed to record match: {e}")),
    };
    if let Err(e) = replay.save(&out) {
        fail(&format!("Failed to save replay: {e}"));
    }
    println!(
        "Recorded seed {seed}: winner {} after {} ticks ({} events) -> {}",
        replay.outcome.winner,
        replay.duration(),
        replay.events.len(),
        out.display()
    );
}

/// Show or verify a recorded match
fn cmd_replay(rules: &LoadedRules, file: PathBuf, verify: bool) {
    let replay = match MatchReplay::load(&file) {
        Ok(r) => r,
        Err(e) => fail(&format!("Failed to load replay: {e}")),
    };

    println!("Loaded replay:");
    println!("  Builds: {} vs {}", replay.build_a, replay.build_b);
    println!("  Seed: {}", replay.seed);
    println!("  Config: {}", short_hash(&replay.config_hash));
    println!("  Events: {}", replay.events.len());
    println!("  Duration: {} ticks", replay.duration());

    if !verify {
        for event in &replay.events {
            println!("  {event}");
        }
        return;
    }

    if !replay.config_hash.eq_ignore_ascii_case(&rules.hash) {
        tracing::warn!(
            recorded = short_hash(&replay.config_hash),
            current = rules.short_hash(),
            "replay was recorded under different rules"
        );
    }

    match replay.verify(&rules.config) {
        Ok(report) if report.is_identical() => {
            println!("PASS: Replay verification successful");
        }
        Ok(report) => {
            println!("FAIL: Replay diverged");
            println!("  Outcome matches: {}", report.outcome_matches);
            if let Some(index) = report.first_divergence {
                println!("  First differing event: #{index}");
            }
            std::process::exit(1);
        }
        Err(e) => fail(&format!("FAIL: Error during verification: {e}")),
    }
}

/// Print or check a configuration digest
fn cmd_config(path: Option<&Path>, expected_hash: Option<&str>) {
    let (bytes, source) = match path {
        Some(p) => match std::fs::read(p) {
            Ok(b) => (b, p.display().to_string()),
            Err(e) => fail(&format!("Failed to read {}: {e}", p.display())),
        },
        None => (PUBLISHED_CONFIG.as_bytes().to_vec(), "embedded".to_string()),
    };
    let actual = config_hash(&bytes);
    println!("Config: {source}");
    println!("SHA-256: {actual}");
    println!("Short: {}", short_hash(&actual));

    let expected = expected_hash.unwrap_or(PUBLISHED_CONFIG_HASH);
    if actual.eq_ignore_ascii_case(expected) {
        println!("PASS: matches {}", short_hash(expected));
    } else {
        fail(&format!(
            "config hash mismatch: expected {expected}, got {actual}"
        ));
    }
}
