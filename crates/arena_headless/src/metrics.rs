//! Match records and aggregate statistics.
//!
//! Every finished match becomes a [`MatchRecord`], the flat shape offline
//! analysis consumes. Records are persisted as JSON lines and folded into
//! per-pairing summaries, a pairwise win-rate matrix, and a ranking.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use arena_core::events::Winner;
use arena_core::simulation::MatchOutcome;
use arena_core::stats::Build;
use serde::{Deserialize, Serialize};

/// One finished match, as persisted for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Side 1 build, as `"animal hp/atk/spd/wil"`.
    pub build_1: String,
    /// Side 2 build.
    pub build_2: String,
    /// Match seed.
    pub seed: u64,
    /// `1`, `2`, or `draw`.
    pub winner: Winner,
    /// Ticks played.
    pub ticks: u32,
    /// Side 1 HP at the end.
    pub final_hp_1: i32,
    /// Side 2 HP at the end.
    pub final_hp_2: i32,
    /// Short digest of the configuration the match ran under.
    pub config_hash: String,
}

impl MatchRecord {
    /// Flatten an outcome.
    #[must_use]
    pub fn new(build_1: &Build, build_2: &Build, outcome: &MatchOutcome, config_hash: &str) -> Self {
        Self {
            build_1: build_1.to_string(),
            build_2: build_2.to_string(),
            seed: outcome.seed,
            winner: outcome.winner,
            ticks: outcome.ticks_elapsed,
            final_hp_1: outcome.final_hp_a,
            final_hp_2: outcome.final_hp_b,
            config_hash: config_hash.to_string(),
        }
    }
}

/// Write records as JSON lines, one object per line.
pub fn write_records(path: &Path, records: &[MatchRecord]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut out, record).map_err(std::io::Error::other)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Read a JSON-lines record file. Blank lines are skipped.
pub fn read_records(path: &Path) -> std::io::Result<Vec<MatchRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line).map_err(std::io::Error::other)?);
    }
    Ok(records)
}

/// Results for one ordered pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchupSummary {
    /// Side 1 build.
    pub build_1: String,
    /// Side 2 build.
    pub build_2: String,
    /// Matches played.
    pub games: u32,
    /// Side 1 wins.
    pub wins_1: u32,
    /// Side 2 wins.
    pub wins_2: u32,
    /// Draws.
    pub draws: u32,
    /// Average match length in ticks.
    pub avg_ticks: f64,
}

impl MatchupSummary {
    /// Summarize records of a single pairing.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MatchRecord>) -> Self {
        let mut summary = Self::default();
        let mut tick_sum = 0u64;
        for record in records {
            if summary.games == 0 {
                summary.build_1.clone_from(&record.build_1);
                summary.build_2.clone_from(&record.build_2);
            }
            summary.games += 1;
            tick_sum += u64::from(record.ticks);
            match record.winner {
                Winner::A => summary.wins_1 += 1,
                Winner::B => summary.wins_2 += 1,
                Winner::Draw => summary.draws += 1,
            }
        }
        if summary.games > 0 {
            summary.avg_ticks = tick_sum as f64 / f64::from(summary.games);
        }
        summary
    }

    /// Side 1 win rate; draws count as non-wins.
    #[must_use]
    pub fn win_rate_1(&self) -> f64 {
        rate(self.wins_1, self.games)
    }

    /// Side 2 win rate.
    #[must_use]
    pub fn win_rate_2(&self) -> f64 {
        rate(self.wins_2, self.games)
    }
}

fn rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(games)
    }
}

/// Pairwise win rates: `rates[i][j]` is build `i`'s win rate against build `j`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinRateMatrix {
    /// Row/column labels.
    pub builds: Vec<String>,
    /// `None` on the diagonal and for unplayed pairs.
    pub rates: Vec<Vec<Option<f64>>>,
}

impl WinRateMatrix {
    /// Build from pairing summaries over a fixed label order.
    #[must_use]
    pub fn from_matchups(builds: &[String], matchups: &[MatchupSummary]) -> Self {
        let n = builds.len();
        let mut rates = vec![vec![None; n]; n];
        let index = |label: &str| builds.iter().position(|b| b == label);
        for m in matchups {
            if let (Some(i), Some(j)) = (index(&m.build_1), index(&m.build_2)) {
                if i != j {
                    rates[i][j] = Some(m.win_rate_1());
                    rates[j][i] = Some(m.win_rate_2());
                }
            }
        }
        Self {
            builds: builds.to_vec(),
            rates,
        }
    }

    /// Render as a fixed-width table with `B1..Bn` labels.
    #[must_use]
    pub fn to_table(&self) -> String {
        let labels: Vec<String> = (1..=self.builds.len()).map(|i| format!("B{i}")).collect();
        let mut out = format!("{:>8}", "");
        for label in &labels {
            out.push_str(&format!("{label:>8}"));
        }
        out.push('\n');
        for (i, row) in self.rates.iter().enumerate() {
            out.push_str(&format!("{:>8}", labels[i]));
            for (j, cell) in row.iter().enumerate() {
                let text = match cell {
                    _ if i == j => "--".to_string(),
                    Some(r) => format!("{:.1}%", r * 100.0),
                    None => "?".to_string(),
                };
                out.push_str(&format!("{text:>8}"));
            }
            out.push('\n');
        }
        out
    }
}

/// One line of the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Build label.
    pub build: String,
    /// Wins over all matches the build played.
    pub avg_win_rate: f64,
    /// Matches played.
    pub games: u32,
}

/// Rank builds by overall win rate, best first. Ties keep input order.
#[must_use]
pub fn rank_builds(builds: &[String], matchups: &[MatchupSummary]) -> Vec<RankingEntry> {
    let mut wins = vec![0u32; builds.len()];
    let mut games = vec![0u32; builds.len()];
    for m in matchups {
        for (label, won) in [(&m.build_1, m.wins_1), (&m.build_2, m.wins_2)] {
            if let Some(i) = builds.iter().position(|b| b == label) {
                wins[i] += won;
                games[i] += m.games;
            }
        }
    }
    let mut ranking: Vec<RankingEntry> = builds
        .iter()
        .enumerate()
        .map(|(i, build)| RankingEntry {
            build: build.clone(),
            avg_win_rate: rate(wins[i], games[i]),
            games: games[i],
        })
        .collect();
    ranking.sort_by(|a, b| b.avg_win_rate.total_cmp(&a.avg_win_rate));
    ranking
}

/// Summary statistics across a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Draws across all pairings.
    pub draws: u32,
    /// Average match length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u32,
    /// Longest match.
    pub max_duration_ticks: u32,
    /// Per-pairing results, in first-seen order.
    pub matchups: Vec<MatchupSummary>,
    /// Pairwise win-rate matrix.
    pub matrix: WinRateMatrix,
    /// Builds by overall win rate.
    pub ranking: Vec<RankingEntry>,
}

impl BatchSummary {
    /// Calculate summary from match records.
    #[must_use]
    pub fn from_records(builds: &[String], records: &[MatchRecord]) -> Self {
        if records.is_empty() {
            return Self {
                matrix: WinRateMatrix::from_matchups(builds, &[]),
                ranking: rank_builds(builds, &[]),
                ..Self::default()
            };
        }

        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for r in records {
            let key = (r.build_1.as_str(), r.build_2.as_str());
            if !pairs.contains(&key) {
                pairs.push(key);
            }
        }
        let matchups: Vec<MatchupSummary> = pairs
            .into_iter()
            .map(|(one, two)| {
                MatchupSummary::from_records(
                    records
                        .iter()
                        .filter(|r| r.build_1 == one && r.build_2 == two),
                )
            })
            .collect();

        let tick_sum: u64 = records.iter().map(|r| u64::from(r.ticks)).sum();
        let total_games = u32::try_from(records.len()).unwrap_or(u32::MAX);
        Self {
            total_games,
            draws: matchups.iter().map(|m| m.draws).sum(),
            avg_duration_ticks: tick_sum as f64 / f64::from(total_games),
            min_duration_ticks: records.iter().map(|r| r.ticks).min().unwrap_or(0),
            max_duration_ticks: records.iter().map(|r| r.ticks).max().unwrap_or(0),
            matrix: WinRateMatrix::from_matchups(builds, &matchups),
            ranking: rank_builds(builds, &matchups),
            matchups,
        }
    }

    /// Whether every pairwise rate lies within `threshold` of 0.5.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.matrix
            .rates
            .iter()
            .flatten()
            .flatten()
            .all(|r| (r - 0.5).abs() <= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(b1: &str, b2: &str, winner: Winner, ticks: u32) -> MatchRecord {
        MatchRecord {
            build_1: b1.to_string(),
            build_2: b2.to_string(),
            seed: 0,
            winner,
            ticks,
            final_hp_1: 10,
            final_hp_2: 10,
            config_hash: "88c1a2b2".to_string(),
        }
    }

    #[test]
    fn test_matchup_summary() {
        let records = vec![
            record("x", "y", Winner::A, 10),
            record("x", "y", Winner::A, 20),
            record("x", "y", Winner::B, 30),
            record("x", "y", Winner::Draw, 60),
        ];
        let summary = MatchupSummary::from_records(&records);
        assert_eq!(summary.games, 4);
        assert_eq!((summary.wins_1, summary.wins_2, summary.draws), (2, 1, 1));
        assert!((summary.avg_ticks - 30.0).abs() < 1e-9);
        assert!((summary.win_rate_1() - 0.5).abs() < 1e-9);
        assert!((summary.win_rate_2() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_matrix_and_ranking() {
        let builds = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let records = vec![
            record("x", "y", Winner::A, 10),
            record("x", "y", Winner::A, 10),
            record("x", "z", Winner::B, 10),
            record("x", "z", Winner::A, 10),
            record("y", "z", Winner::Draw, 60),
            record("y", "z", Winner::B, 10),
        ];
        let summary = BatchSummary::from_records(&builds, &records);
        assert_eq!(summary.total_games, 6);
        assert_eq!(summary.matchups.len(), 3);
        assert_eq!(summary.matrix.rates[0][1], Some(1.0));
        assert_eq!(summary.matrix.rates[1][0], Some(0.0));
        assert_eq!(summary.matrix.rates[0][0], None);
        assert_eq!(summary.ranking[0].build, "x");
        assert!((summary.ranking[0].avg_win_rate - 0.75).abs() < 1e-9);
        assert_eq!(summary.max_duration_ticks, 60);
        assert!(summary.matrix.to_table().contains("100.0%"));
    }

    #[test]
    fn test_records_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("records.jsonl");
        let records = vec![
            record("bear 3/14/2/1", "buffalo 8/6/4/2", Winner::Draw, 60),
            record("bear 3/14/2/1", "buffalo 8/6/4/2", Winner::B, 12),
        ];
        write_records(&path, &records).expect("write");

        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(r#""winner":"draw""#));
        assert!(text.contains(r#""winner":"2""#));

        assert_eq!(read_records(&path).expect("read back"), records);
    }
}
