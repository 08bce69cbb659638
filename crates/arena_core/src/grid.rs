//! Bounded board geometry: spawning, greedy approach, and the ring.

use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, RingConfig};
use crate::math::{chebyshev, manhattan};
use crate::rng::MatchRng;

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Row, 0 at the top.
    pub row: i32,
    /// Column, 0 at the left.
    pub col: i32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    const fn pair(self) -> (i32, i32) {
        (self.row, self.col)
    }

    /// King-move distance.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        chebyshev(self.pair(), other.pair())
    }

    /// Manhattan distance.
    #[must_use]
    pub fn manhattan(self, other: Self) -> i32 {
        manhattan(self.pair(), other.pair())
    }

    /// Within striking range (the eight surrounding cells).
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) == 1
    }
}

/// Inclusive safe rectangle while the ring is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SafeRegion {
    /// First safe row.
    pub min_row: i32,
    /// Last safe row.
    pub max_row: i32,
    /// First safe column.
    pub min_col: i32,
    /// Last safe column.
    pub max_col: i32,
}

impl SafeRegion {
    /// Whether a cell is inside.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        (self.min_row..=self.max_row).contains(&pos.row)
            && (self.min_col..=self.max_col).contains(&pos.col)
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    width: i32,
    height: i32,
}

impl Grid {
    /// Build from configuration.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        Self {
            width: i32::try_from(config.width).unwrap_or(i32::MAX),
            height: i32::try_from(config.height).unwrap_or(i32::MAX),
        }
    }

    /// Whether a cell lies on the board.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        (0..self.height).contains(&pos.row) && (0..self.width).contains(&pos.col)
    }

    /// Opening positions: side A on the first row, side B on the last, in one
    /// shared column chosen with a single draw.
    pub fn spawn(&self, rng: &mut MatchRng) -> (Position, Position) {
        let width = usize::try_from(self.width).unwrap_or(1);
        let col = i32::try_from(rng.pick(width)).unwrap_or(0);
        (Position::new(0, col), Position::new(self.height - 1, col))
    }

    /// One greedy step from `from` toward `target`.
    ///
    /// Candidates are in-bounds neighbours other than `target`'s cell that
    /// minimise Chebyshev then Manhattan distance. A draw breaks remaining
    /// ties. Returns `None` if no neighbour gets strictly closer.
    pub fn step_toward(
        &self,
        from: Position,
        target: Position,
        rng: &mut MatchRng,
    ) -> Option<Position> {
        let key = |p: Position| (p.chebyshev(target), p.manhattan(target));
        let current = key(from);

        let mut best: Vec<Position> = Vec::with_capacity(8);
        let mut best_key = current;
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let next = Position::new(from.row + dr, from.col + dc);
                if !self.contains(next) || next == target {
                    continue;
                }
                let k = key(next);
                if k < best_key {
                    best_key = k;
                    best.clear();
                    best.push(next);
                } else if k == best_key && k < current {
                    best.push(next);
                }
            }
        }

        match best.len() {
            0 => None,
            1 => Some(best[0]),
            n => Some(best[rng.pick(n)]),
        }
    }

    /// Safe rectangle at `tick`, or `None` before the ring activates.
    ///
    /// The margin starts at one cell and grows by one every
    /// `shrink_interval` ticks, stopping once the safe side would drop below
    /// `min_safe_size`.
    #[must_use]
    pub fn safe_region(&self, tick: u32, ring: &RingConfig) -> Option<SafeRegion> {
        if tick < ring.activation_tick {
            return None;
        }
        let steps = (tick - ring.activation_tick) / ring.shrink_interval.max(1);
        let margin = i32::try_from(steps.saturating_add(1)).unwrap_or(i32::MAX);
        let min_size = i32::try_from(ring.min_safe_size).unwrap_or(i32::MAX);
        let clamp_margin = |dim: i32| margin.min(((dim - min_size) / 2).max(0));

        let row_margin = clamp_margin(self.height);
        let col_margin = clamp_margin(self.width);
        Some(SafeRegion {
            min_row: row_margin,
            max_row: self.height - 1 - row_margin,
            min_col: col_margin,
            max_col: self.width - 1 - col_margin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(&GridConfig::default())
    }

    #[test]
    fn test_spawn_same_column_opposite_rows() {
        let mut rng = MatchRng::from_seed(9);
        let (a, b) = grid().spawn(&mut rng);
        assert_eq!(a.row, 0);
        assert_eq!(b.row, 7);
        assert_eq!(a.col, b.col);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_straight_line_needs_no_draw() {
        let mut rng = MatchRng::from_seed(1);
        let next = grid()
            .step_toward(Position::new(0, 3), Position::new(7, 3), &mut rng)
            .expect("can step");
        assert_eq!(next, Position::new(1, 3));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_diagonal_preferred_over_straight() {
        let mut rng = MatchRng::from_seed(1);
        let next = grid()
            .step_toward(Position::new(0, 0), Position::new(4, 3), &mut rng)
            .expect("can step");
        assert_eq!(next, Position::new(1, 1));
    }

    #[test]
    fn test_adjacent_does_not_step() {
        let mut rng = MatchRng::from_seed(1);
        assert_eq!(
            grid().step_toward(Position::new(3, 3), Position::new(4, 4), &mut rng),
            None
        );
    }

    #[test]
    fn test_ring_schedule() {
        let ring = RingConfig::default();
        let g = grid();
        assert_eq!(g.safe_region(29, &ring), None);

        let r30 = g.safe_region(30, &ring).expect("active");
        assert_eq!((r30.min_row, r30.max_row), (1, 6));
        let r34 = g.safe_region(34, &ring).expect("active");
        assert_eq!((r34.min_col, r34.max_col), (1, 6));
        let r35 = g.safe_region(35, &ring).expect("active");
        assert_eq!((r35.min_row, r35.max_row), (2, 5));
        let r60 = g.safe_region(60, &ring).expect("active");
        assert_eq!((r60.min_row, r60.max_row), (2, 5));

        assert!(!r30.contains(Position::new(0, 3)));
        assert!(r30.contains(Position::new(1, 6)));
        assert!(!r35.contains(Position::new(1, 3)));
    }
}
